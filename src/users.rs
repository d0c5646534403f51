use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// Upper bound on the free-form bio field
pub const MAX_BIO_LENGTH: usize = 500;

#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub session_token: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub last_active_at: NaiveDateTime,
    pub date_of_birth: Option<String>,
    pub bio: Option<String>,
}
