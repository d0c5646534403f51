//! Current user service
//!
//! Get the current user from the request based on the session cookie

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::extract::OptionalFromRequestParts;
use axum::http::request::Parts;
use axum::Extension;
use axum::RequestPartsExt;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::api::Error;
use crate::session::SessionStore;
use crate::session::SESSION_COOKIE;
use crate::storage::Storage;
use crate::users::User;

/// Current user service
///
/// Resolves the session cookie through the session store to a user row and
/// checks the row's session token still matches; a login elsewhere rotates
/// the row token and invalidates this session
pub struct CurrentUser<S: Storage> {
    /// The actual user
    user: Arc<User>,

    /// The storage the user was loaded from
    storage: PhantomData<S>,
}

impl<S: Storage> CurrentUser<S> {
    /// Create the current user from a user
    fn new(user: User) -> Self {
        Self {
            user: Arc::new(user),
            storage: PhantomData,
        }
    }
}

impl<S: Storage> Deref for CurrentUser<S> {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<B, S> FromRequestParts<B> for CurrentUser<S>
where
    B: Send + Sync,
    S: Storage,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &B) -> Result<Self, Self::Rejection> {
        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| Error::internal_server_error("Could not read cookies"))?;

        let cookie = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| Error::unauthorized("Missing session cookie"))?;

        let session_id = Uuid::parse_str(cookie.value())
            .map_err(|_| Error::unauthorized("Invalid session cookie"))?;

        let Extension(sessions) = parts
            .extract::<Extension<SessionStore>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get the session store"))?;

        let session = sessions
            .get(&session_id)
            .await
            .ok_or_else(|| Error::unauthorized("No active session"))?;

        let Extension(storage) = parts
            .extract::<Extension<S>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get the storage"))?;

        let user = storage
            .find_single_user_by_id(session.user_id)
            .await
            .map_err(|_| Error::unauthorized("Could not find user"))?
            .ok_or_else(|| Error::unauthorized("Could not find user"))?;

        // mechanism to invalidate sessions of previous logins
        if user.session_token != Some(session.token) {
            return Err(Error::unauthorized("Session expired"));
        }

        Ok(CurrentUser::new(user))
    }
}

impl<B, S> OptionalFromRequestParts<B> for CurrentUser<S>
where
    B: Send + Sync,
    S: Storage,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &B,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(<Self as FromRequestParts<B>>::from_request_parts(parts, state)
            .await
            .ok())
    }
}
