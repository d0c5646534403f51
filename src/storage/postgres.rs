//! Postgres storage

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::lookup::NoteSearchColumn;
use crate::lookup::Page;
use crate::notes::Note;
use crate::users::User;

use super::CreateNoteValues;
use super::CreateUserValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UniqueColumn;
use super::UpdateNoteValues;
use super::UpdateUserValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// Postgres version of user
#[derive(sqlx::FromRow)]
struct SqlxUser {
    id: i64,
    username: String,
    email: String,
    hashed_password: String,
    session_token: Option<Uuid>,
    created_at: NaiveDateTime,
    last_active_at: NaiveDateTime,
    date_of_birth: Option<String>,
    bio: Option<String>,
}

impl User {
    /// Create user from postgres version
    fn from_sqlx_user(user: SqlxUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            session_token: user.session_token,
            created_at: user.created_at,
            last_active_at: user.last_active_at,
            date_of_birth: user.date_of_birth,
            bio: user.bio,
        }
    }

    /// Maybe create user from postgres version
    fn from_sqlx_user_optional(user: Option<SqlxUser>) -> Option<Self> {
        user.map(Self::from_sqlx_user)
    }

    /// Create multiple users from postgres version
    fn from_sqlx_user_multiple(mut users: Vec<SqlxUser>) -> Vec<Self> {
        users.drain(..).map(Self::from_sqlx_user).collect()
    }
}

/// Postgres version of note
#[derive(sqlx::FromRow)]
struct SqlxNote {
    id: i64,
    user_id: i64,
    title: Option<String>,
    content: String,
    created_at: NaiveDateTime,
    edited_at: NaiveDateTime,
}

impl Note {
    /// Create note from postgres version
    fn from_sqlx_note(note: SqlxNote) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            edited_at: note.edited_at,
        }
    }

    /// Maybe create note from postgres version
    fn from_sqlx_note_optional(note: Option<SqlxNote>) -> Option<Self> {
        note.map(Self::from_sqlx_note)
    }

    /// Create multiple notes from postgres version
    fn from_sqlx_note_multiple(mut notes: Vec<SqlxNote>) -> Vec<Self> {
        notes.drain(..).map(Self::from_sqlx_note).collect()
    }
}

/// Map any sqlx error to a connection error
fn connection_error(err: sqlx::Error) -> Error {
    Error::Connection(err.to_string())
}

/// Map a sqlx write error, surfacing unique violations as conflicts
fn write_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let column = if db_err.constraint() == Some("users_email_key") {
                UniqueColumn::Email
            } else {
                UniqueColumn::Username
            };

            return Error::UniqueViolation(column);
        }
    }

    Error::Connection(err.to_string())
}

/// Turn a raw query into a `LIKE`/`ILIKE` substring pattern
///
/// The wildcard characters of the raw query are escaped, the caller's text is
/// always matched literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

#[async_trait]
impl Storage for Postgres {
    async fn find_single_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE username = $1
                OR email = $1
            LIMIT 1
            ",
        )
        .bind(login)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_conflicting_user(&self, username: &str, email: &str) -> Result<Option<User>> {
        // username conflicts take precedence over email conflicts
        let user = self
            .find_single_user_by_login(username)
            .await?
            .filter(|user| user.username == username);

        if user.is_some() {
            return Ok(user);
        }

        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE email = $1
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_all_users(&self, page: &Page) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            ORDER BY id ASC
            LIMIT $2 OFFSET $1
            ",
        )
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_multiple)
        .map_err(connection_error)?;

        Ok(users)
    }

    async fn search_users_by_username(&self, query: &str, page: &Page) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE username ILIKE $1 ESCAPE '\'
            ORDER BY id ASC
            LIMIT $3 OFFSET $2
            ",
        )
        .bind(like_pattern(query))
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_multiple)
        .map_err(connection_error)?;

        Ok(users)
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            INSERT INTO users (username, email, hashed_password, session_token, date_of_birth, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(values.username)
        .bind(values.email)
        .bind(values.hashed_password)
        .bind(values.session_token)
        .bind(values.date_of_birth)
        .bind(values.bio)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(write_error)?;

        Ok(user)
    }

    async fn update_user(&self, user: &User, values: &UpdateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                hashed_password = COALESCE($4, hashed_password),
                date_of_birth = COALESCE($5, date_of_birth),
                bio = COALESCE($6, bio)
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(user.id)
        .bind(values.username)
        .bind(values.email)
        .bind(values.hashed_password)
        .bind(values.date_of_birth)
        .bind(values.bio)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(write_error)?;

        Ok(user)
    }

    async fn set_session_token(&self, user: &User, session_token: Option<&Uuid>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            UPDATE users
            SET session_token = $2, last_active_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(user.id)
        .bind(session_token.copied())
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn delete_user(&self, user: &User) -> Result<()> {
        // owned notes go with the row, ON DELETE CASCADE
        sqlx::query(
            r"
            DELETE FROM users
            WHERE id = $1
            ",
        )
        .bind(user.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn find_single_note_by_id(&self, id: i64) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, SqlxNote>(
            r"
            SELECT *
            FROM notes
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Note::from_sqlx_note_optional)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn find_all_notes(&self, page: &Page) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, SqlxNote>(
            r"
            SELECT *
            FROM notes
            ORDER BY id ASC
            LIMIT $2 OFFSET $1
            ",
        )
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.connection_pool)
        .await
        .map(Note::from_sqlx_note_multiple)
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn search_notes(
        &self,
        column: NoteSearchColumn,
        query: &str,
        page: &Page,
    ) -> Result<Vec<Note>> {
        let statement = match column {
            NoteSearchColumn::Title => {
                r"
                SELECT *
                FROM notes
                WHERE title ILIKE $1 ESCAPE '\'
                ORDER BY id ASC
                LIMIT $3 OFFSET $2
                "
            }
            NoteSearchColumn::Content => {
                r"
                SELECT *
                FROM notes
                WHERE content ILIKE $1 ESCAPE '\'
                ORDER BY id ASC
                LIMIT $3 OFFSET $2
                "
            }
        };

        let notes = sqlx::query_as::<_, SqlxNote>(statement)
            .bind(like_pattern(query))
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&self.connection_pool)
            .await
            .map(Note::from_sqlx_note_multiple)
            .map_err(connection_error)?;

        Ok(notes)
    }

    async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note> {
        let note = sqlx::query_as::<_, SqlxNote>(
            r"
            INSERT INTO notes (user_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(values.user.id)
        .bind(values.title)
        .bind(values.content)
        .fetch_one(&self.connection_pool)
        .await
        .map(Note::from_sqlx_note)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn update_note(&self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note> {
        // an empty update leaves the note, including its edit timestamp,
        // untouched
        if values.title.is_none() && values.content.is_none() {
            return Ok(note.clone());
        }

        let note = sqlx::query_as::<_, SqlxNote>(
            r"
            UPDATE notes
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                edited_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(note.id)
        .bind(values.title.map(String::as_str))
        .bind(values.content.map(String::as_str))
        .fetch_one(&self.connection_pool)
        .await
        .map(Note::from_sqlx_note)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn delete_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            r"
            DELETE FROM notes
            WHERE id = $1
            ",
        )
        .bind(note.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}
