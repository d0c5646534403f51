//! Server-side sessions
//!
//! Sessions are kept in a store that is injected into every request as an
//! extension. The client only ever holds an opaque session id in a cookie;
//! the user it belongs to and the token proving the login is current live
//! here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "jotter_session";

/// A single established session
#[derive(Clone, Copy, Debug)]
pub struct Session {
    /// The user the session belongs to
    pub user_id: i64,

    /// Token matching the user row's `session_token`
    ///
    /// A login elsewhere rotates the row token and strands this one
    pub token: Uuid,
}

/// In-memory session store
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    /// All sessions, keyed by the cookie-carried session id
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    /// Create a new empty session store
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Establish a session for a user, returning the id to hand the client
    pub async fn establish(&self, user_id: i64, token: Uuid) -> Uuid {
        let session_id = Uuid::new_v4();

        self.sessions
            .lock()
            .await
            .insert(session_id, Session { user_id, token });

        session_id
    }

    /// Resolve a session id back to its session
    pub async fn get(&self, session_id: &Uuid) -> Option<Session> {
        self.sessions.lock().await.get(session_id).copied()
    }

    /// Drop a single session
    pub async fn revoke(&self, session_id: &Uuid) {
        self.sessions.lock().await.remove(session_id);
    }

    /// Drop every session of a user
    ///
    /// Used on account deletion
    pub async fn revoke_user(&self, user_id: i64) {
        self.sessions
            .lock()
            .await
            .retain(|_, session| session.user_id != user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_establish_and_revoke() {
        let store = SessionStore::new();
        let token = Uuid::new_v4();

        let session_id = store.establish(7, token).await;

        let session = store.get(&session_id).await.unwrap();
        assert_eq!(7, session.user_id);
        assert_eq!(token, session.token);

        store.revoke(&session_id).await;
        assert!(store.get(&session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_revoke_user_drops_all_sessions() {
        let store = SessionStore::new();

        let first = store.establish(7, Uuid::new_v4()).await;
        let second = store.establish(7, Uuid::new_v4()).await;
        let other = store.establish(8, Uuid::new_v4()).await;

        store.revoke_user(7).await;

        assert!(store.get(&first).await.is_none());
        assert!(store.get(&second).await.is_none());
        assert!(store.get(&other).await.is_some());
    }
}
