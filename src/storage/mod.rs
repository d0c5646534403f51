//! All things related to the storage of users and notes

use core::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::lookup::NoteSearchColumn;
use crate::lookup::Page;
use crate::notes::Note;
use crate::users::User;

#[cfg(not(feature = "postgres"))]
use memory::Memory;
#[cfg(feature = "postgres")]
use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> Postgres {
    Postgres::new().await
}

/// The columns with a uniqueness guarantee on the users table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueColumn {
    Username,
    Email,
}

impl fmt::Display for UniqueColumn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UniqueColumn::Username => write!(f, "username"),
            UniqueColumn::Email => write!(f, "email"),
        }
    }
}

/// Storage errors
#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// A write collided with a unique column
    #[error("Duplicate {0}")]
    UniqueViolation(UniqueColumn),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The username
    pub username: &'a str,

    /// The email address
    pub email: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,

    /// The initial session token
    pub session_token: &'a Uuid,

    /// Optional date of birth
    pub date_of_birth: Option<&'a str>,

    /// Optional bio
    pub bio: Option<&'a str>,
}

/// Values to update a User
///
/// Only fields that are set overwrite; a `None` leaves the column alone
pub struct UpdateUserValues<'a> {
    /// New (optional) username
    pub username: Option<&'a str>,

    /// New (optional) email address
    pub email: Option<&'a str>,

    /// New (optional) hashed password
    pub hashed_password: Option<&'a str>,

    /// New (optional) date of birth
    pub date_of_birth: Option<&'a str>,

    /// New (optional) bio
    pub bio: Option<&'a str>,
}

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// The owning user
    pub user: &'a User,

    /// Optional title of the note
    pub title: Option<&'a str>,

    /// Content of the note
    ///
    /// Can be anything
    pub content: &'a str,
}

/// Values to update a Note
///
/// Only fields that are set overwrite; setting none leaves the note (and its
/// edit timestamp) untouched
pub struct UpdateNoteValues<'a> {
    /// New (optional) title of the note
    pub title: Option<&'a String>,

    /// New (optional) content of the note
    pub content: Option<&'a String>,
}

/// Storage with all supported operations
///
/// Listings and searches return rows in ascending id order
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find a single user by its ID
    async fn find_single_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Find a single user by username or email
    async fn find_single_user_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Find a user holding either the given username or the given email
    ///
    /// Used as the pre-insert existence probe during registration
    async fn find_conflicting_user(&self, username: &str, email: &str) -> Result<Option<User>>;

    /// Find all users within the page
    async fn find_all_users(&self, page: &Page) -> Result<Vec<User>>;

    /// Case-insensitive substring search on usernames
    async fn search_users_by_username(&self, query: &str, page: &Page) -> Result<Vec<User>>;

    /// Create a single user
    ///
    /// Fails with [`Error::UniqueViolation`] on a duplicate username or email
    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User>;

    /// Apply a partial update to a user
    ///
    /// Fails with [`Error::UniqueViolation`] when a new username or email is
    /// already taken
    async fn update_user(&self, user: &User, values: &UpdateUserValues<'_>) -> Result<User>;

    /// Replace the session token of a user, bumping its last-active time
    ///
    /// `None` clears the token (logout)
    async fn set_session_token(&self, user: &User, session_token: Option<&Uuid>) -> Result<User>;

    /// Hard-delete a user and every note it owns
    async fn delete_user(&self, user: &User) -> Result<()>;

    /// Find a single note by its ID
    async fn find_single_note_by_id(&self, id: i64) -> Result<Option<Note>>;

    /// Find all notes within the page
    async fn find_all_notes(&self, page: &Page) -> Result<Vec<Note>>;

    /// Case-insensitive substring search on a note column
    async fn search_notes(
        &self,
        column: NoteSearchColumn,
        query: &str,
        page: &Page,
    ) -> Result<Vec<Note>>;

    /// Create a note
    async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note>;

    /// Apply a partial update to a note
    async fn update_note(&self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note>;

    /// Hard-delete a note
    async fn delete_note(&self, note: &Note) -> Result<()>;
}
