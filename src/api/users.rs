//! User API management

use std::ops::Deref;

use axum::extract::Query;
use axum::Extension;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::lookup::Lookup;
use crate::lookup::Page;
use crate::lookup::UserField;
use crate::password::hash;
use crate::password::verify;
use crate::session::SessionStore;
use crate::session::SESSION_COOKIE;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::storage::UpdateUserValues;
use crate::users::User;

use super::request::validate_bio;
use super::request::validate_email;
use super::request::validate_password;
use super::request::validate_username;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside
/// world -- the password hash and session token never leave the server
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user ID
    pub id: i64,

    /// The username
    pub username: String,

    /// The email address
    pub email: String,

    /// Creation date of the account
    pub created_at: NaiveDateTime,

    /// Last login activity
    pub last_active_at: NaiveDateTime,

    /// Optional date of birth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// Optional bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_active_at: user.last_active_at,
            date_of_birth: user.date_of_birth,
            bio: user.bio,
        }
    }

    /// Create a user response from multiple [`User`](User)s
    fn from_user_multiple(mut users: Vec<User>) -> Vec<Self> {
        users.drain(..).map(Self::from_user).collect::<Vec<Self>>()
    }
}

/// Build the session cookie handed to the client
fn session_cookie(session_id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build()
}

/// Cookie used to clear the session on the client
fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Registration form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// Username of the new account, must be unique
    username: String,
    /// Email address of the new account, must be unique
    email: String,
    /// Password, stored as an Argon2 hash
    password: String,
    /// Optional date of birth
    date_of_birth: Option<String>,
    /// Optional bio
    bio: Option<String>,
}

/// Register a new account
///
/// A session is established right away, no separate login needed
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "alice", "email": "a@x.com", "password": "verysecret" }' \
///     http://localhost:6000/api/users/register
/// ```
///
/// Response
/// ```json
/// { "data": { "id": 1, "username": "alice", ... } }
/// ```
pub async fn register<S: Storage>(
    Extension(storage): Extension<S>,
    Extension(sessions): Extension<SessionStore>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, Success<UserResponse>), Error> {
    validate_username(&form.username)?;
    validate_email(&form.email)?;
    validate_password(&form.password)?;

    if let Some(bio) = &form.bio {
        validate_bio(bio)?;
    }

    // the pre-check gives the caller the distinguishing message; the insert
    // below can still collide with a concurrent registration, which surfaces
    // as the same conflict through the storage error
    let existing_user = storage
        .find_conflicting_user(&form.username, &form.email)
        .await
        .map_err(Error::internal_server_error)?;

    if let Some(existing_user) = existing_user {
        if existing_user.username == form.username {
            return Err(Error::conflict(
                "User already exists. Please try with different username or email.",
            ));
        }

        return Err(Error::conflict(
            "User already exists. Please try with different email.",
        ));
    }

    let hashed_password = hash(&form.password);
    let session_token = Uuid::new_v4();

    let values = CreateUserValues {
        username: &form.username,
        email: &form.email,
        hashed_password: &hashed_password,
        session_token: &session_token,
        date_of_birth: form.date_of_birth.as_deref(),
        bio: form.bio.as_deref(),
    };

    let user = storage
        .create_user(&values)
        .await
        .map_err(Error::from_storage)?;

    let session_id = sessions.establish(user.id, session_token).await;
    let jar = jar.add(session_cookie(session_id));

    Ok((jar, Success::created(UserResponse::from_user(user))))
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username or email address of the user
    username: String,
    /// Password of the user
    password: String,
}

/// Login with a username (or email address) and password
///
/// Establishes a fresh session; sessions of previous logins are invalidated
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "alice", "password": "verysecret" }' \
///     http://localhost:6000/api/users/login
/// ```
pub async fn login<S: Storage>(
    Extension(storage): Extension<S>,
    Extension(sessions): Extension<SessionStore>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Success<UserResponse>), Error> {
    let user = storage
        .find_single_user_by_login(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    let Some(user) = user else {
        return Err(Error::unauthorized("Invalid username or password"));
    };

    if !verify(&user.hashed_password, &form.password) {
        return Err(Error::unauthorized("Invalid username or password"));
    }

    let session_token = Uuid::new_v4();

    let user = storage
        .set_session_token(&user, Some(&session_token))
        .await
        .map_err(Error::internal_server_error)?;

    let session_id = sessions.establish(user.id, session_token).await;
    let jar = jar.add(session_cookie(session_id));

    Ok((jar, Success::ok(UserResponse::from_user(user))))
}

/// Logout the current user
///
/// Clears the server-side session and the session token on the user row
pub async fn logout<S: Storage>(
    Extension(storage): Extension<S>,
    Extension(sessions): Extension<SessionStore>,
    current_user: CurrentUser<S>,
    jar: CookieJar,
) -> Result<(CookieJar, Success<&'static str>), Error> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session_id) = Uuid::parse_str(cookie.value()) {
            sessions.revoke(&session_id).await;
        }
    }

    storage
        .set_session_token(&current_user, None)
        .await
        .map_err(Error::internal_server_error)?;

    let jar = jar.remove(removal_cookie());

    Ok((jar, Success::<&'static str>::no_content()))
}

/// Query parameters of the user lookup endpoint
#[derive(Debug, Deserialize)]
pub struct UserLookupParams {
    user_id: Option<i64>,
    name: Option<String>,
    skip: Option<i64>,
    limit: Option<i64>,
}

/// Lookup users by field
///
/// The `field` path segment selects the strategy:
/// - `me`: the user bound to the caller's session
/// - `id`: lookup by `user_id`
/// - `name`: case-insensitive substring search on usernames
/// - `list`: paginated listing
///
/// A single match is returned as one object, multiple matches as an array in
/// ascending id order
///
/// Request:
/// ```sh
/// curl -v 'http://localhost:6000/api/users/name?name=ali&skip=0&limit=10'
/// ```
pub async fn lookup<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: Option<CurrentUser<S>>,
    PathParameters(field): PathParameters<String>,
    Query(params): Query<UserLookupParams>,
) -> Result<Success<Lookup<UserResponse>>, Error> {
    let field = field.parse::<UserField>().map_err(Error::bad_request)?;
    let page = Page::new(params.skip, params.limit);

    match field {
        UserField::Me => {
            let current_user =
                current_user.ok_or_else(|| Error::unauthorized("No active session"))?;

            Ok(Success::ok(Lookup::Single(UserResponse::from_user(
                current_user.deref().clone(),
            ))))
        }
        UserField::Id => {
            let user_id = params
                .user_id
                .ok_or_else(|| Error::bad_request("Missing user_id for field: id."))?;

            let user = storage
                .find_single_user_by_id(user_id)
                .await
                .map_err(Error::internal_server_error)?
                .ok_or_else(|| Error::not_found(format!("User with id {user_id} not found")))?;

            Ok(Success::ok(Lookup::Single(UserResponse::from_user(user))))
        }
        UserField::Name => {
            let name = params
                .name
                .filter(|name| !name.is_empty())
                .ok_or_else(|| Error::bad_request("Invalid query for field: name."))?;

            let users = storage
                .search_users_by_username(&name, &page)
                .await
                .map_err(Error::internal_server_error)?;

            Lookup::from_rows(UserResponse::from_user_multiple(users))
                .map(Success::ok)
                .ok_or_else(|| Error::not_found(format!("User with name {name} not found")))
        }
        UserField::List => {
            let users = storage
                .find_all_users(&page)
                .await
                .map_err(Error::internal_server_error)?;

            Lookup::from_rows(UserResponse::from_user_multiple(users))
                .map(Success::ok)
                .ok_or_else(|| Error::not_found("No users found"))
        }
    }
}

/// Account update form
///
/// All fields are optional; only the ones that are present overwrite
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserForm {
    /// New (optional) username
    username: Option<String>,
    /// New (optional) email address
    email: Option<String>,
    /// New (optional) password
    password: Option<String>,
    /// New (optional) date of birth
    date_of_birth: Option<String>,
    /// New (optional) bio
    bio: Option<String>,
}

/// Partially update the current user's account
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     --cookie 'jotter_session=...' \
///     -d '{ "bio": "hello" }' \
///     http://localhost:6000/api/users/1/update
/// ```
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(user_id): PathParameters<i64>,
    Form(form): Form<UpdateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    if current_user.id != user_id {
        return Err(Error::forbidden("Not allowed to update another account"));
    }

    if let Some(username) = &form.username {
        validate_username(username)?;
    }

    if let Some(email) = &form.email {
        validate_email(email)?;
    }

    if let Some(password) = &form.password {
        validate_password(password)?;
    }

    if let Some(bio) = &form.bio {
        validate_bio(bio)?;
    }

    let hashed_password = form.password.as_deref().map(hash);

    let values = UpdateUserValues {
        username: form.username.as_deref(),
        email: form.email.as_deref(),
        hashed_password: hashed_password.as_deref(),
        date_of_birth: form.date_of_birth.as_deref(),
        bio: form.bio.as_deref(),
    };

    let user = storage
        .update_user(&current_user, &values)
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::ok(UserResponse::from_user(user)))
}

/// Delete the current user's account
///
/// Hard-deletes the row, the user's notes, and every session of the user
///
/// Request:
/// ```sh
/// curl -v -XDELETE --cookie 'jotter_session=...' \
///     http://localhost:6000/api/users/1/delete
/// ```
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    Extension(sessions): Extension<SessionStore>,
    current_user: CurrentUser<S>,
    PathParameters(user_id): PathParameters<i64>,
    jar: CookieJar,
) -> Result<(CookieJar, Success<&'static str>), Error> {
    if current_user.id != user_id {
        return Err(Error::forbidden("Not allowed to delete another account"));
    }

    storage
        .delete_user(&current_user)
        .await
        .map_err(Error::internal_server_error)?;

    sessions.revoke_user(user_id).await;

    let jar = jar.remove(removal_cookie());

    Ok((jar, Success::<&'static str>::no_content()))
}
