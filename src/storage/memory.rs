//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
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

/// A single in-memory table
///
/// Rows are keyed by id in a `BTreeMap`, so iteration is always in ascending
/// id order
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn assign_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<Table<User>>>,

    /// All notes in storage
    notes: Arc<Mutex<Table<Note>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(Table::new())),
            notes: Arc::new(Mutex::new(Table::new())),
        }
    }
}

/// Case-insensitive substring match
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Storage for Memory {
    async fn find_single_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().await.rows.get(&id).cloned())
    }

    async fn find_single_user_by_login(&self, login: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .rows
            .values()
            .find(|user| user.username == login || user.email == login)
            .cloned())
    }

    async fn find_conflicting_user(&self, username: &str, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;

        // username conflicts take precedence over email conflicts
        let conflict = users
            .rows
            .values()
            .find(|user| user.username == username)
            .or_else(|| users.rows.values().find(|user| user.email == email));

        Ok(conflict.cloned())
    }

    async fn find_all_users(&self, page: &Page) -> Result<Vec<User>> {
        let users = self
            .users
            .lock()
            .await
            .rows
            .values()
            .cloned()
            .collect::<Vec<User>>();

        Ok(page.slice(users))
    }

    async fn search_users_by_username(&self, query: &str, page: &Page) -> Result<Vec<User>> {
        let users = self
            .users
            .lock()
            .await
            .rows
            .values()
            .filter(|user| contains_ignore_case(&user.username, query))
            .cloned()
            .collect::<Vec<User>>();

        Ok(page.slice(users))
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        // check and insert under one lock, concurrent registrations can not
        // both pass the check
        let mut users = self.users.lock().await;

        if users.rows.values().any(|user| user.username == values.username) {
            return Err(Error::UniqueViolation(UniqueColumn::Username));
        }

        if users.rows.values().any(|user| user.email == values.email) {
            return Err(Error::UniqueViolation(UniqueColumn::Email));
        }

        let user = User {
            id: users.assign_id(),
            username: values.username.to_string(),
            email: values.email.to_string(),
            hashed_password: values.hashed_password.to_string(),
            session_token: Some(*values.session_token),
            created_at: Utc::now().naive_utc(),
            last_active_at: Utc::now().naive_utc(),
            date_of_birth: values.date_of_birth.map(ToString::to_string),
            bio: values.bio.map(ToString::to_string),
        };

        users.rows.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_user(&self, user: &User, values: &UpdateUserValues<'_>) -> Result<User> {
        let mut users = self.users.lock().await;

        if let Some(username) = values.username {
            let taken = users
                .rows
                .values()
                .any(|other| other.id != user.id && other.username == username);

            if taken {
                return Err(Error::UniqueViolation(UniqueColumn::Username));
            }
        }

        if let Some(email) = values.email {
            let taken = users
                .rows
                .values()
                .any(|other| other.id != user.id && other.email == email);

            if taken {
                return Err(Error::UniqueViolation(UniqueColumn::Email));
            }
        }

        Ok(users
            .rows
            .get_mut(&user.id)
            .map(|user| {
                if let Some(username) = values.username {
                    user.username = username.to_string();
                }

                if let Some(email) = values.email {
                    user.email = email.to_string();
                }

                if let Some(hashed_password) = values.hashed_password {
                    user.hashed_password = hashed_password.to_string();
                }

                if let Some(date_of_birth) = values.date_of_birth {
                    user.date_of_birth = Some(date_of_birth.to_string());
                }

                if let Some(bio) = values.bio {
                    user.bio = Some(bio.to_string());
                }

                user.clone()
            })
            .expect("Table is the source of the user"))
    }

    async fn set_session_token(&self, user: &User, session_token: Option<&Uuid>) -> Result<User> {
        Ok(self
            .users
            .lock()
            .await
            .rows
            .get_mut(&user.id)
            .map(|user| {
                user.session_token = session_token.copied();
                user.last_active_at = Utc::now().naive_utc();

                user.clone()
            })
            .expect("Table is the source of the user"))
    }

    async fn delete_user(&self, user: &User) -> Result<()> {
        // users before notes, the only place both locks are held
        let mut users = self.users.lock().await;
        let mut notes = self.notes.lock().await;

        users.rows.remove(&user.id);
        notes.rows.retain(|_, note| note.user_id != user.id);

        Ok(())
    }

    async fn find_single_note_by_id(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.rows.get(&id).cloned())
    }

    async fn find_all_notes(&self, page: &Page) -> Result<Vec<Note>> {
        let notes = self
            .notes
            .lock()
            .await
            .rows
            .values()
            .cloned()
            .collect::<Vec<Note>>();

        Ok(page.slice(notes))
    }

    async fn search_notes(
        &self,
        column: NoteSearchColumn,
        query: &str,
        page: &Page,
    ) -> Result<Vec<Note>> {
        let notes = self
            .notes
            .lock()
            .await
            .rows
            .values()
            .filter(|note| match column {
                NoteSearchColumn::Title => note
                    .title
                    .as_deref()
                    .is_some_and(|title| contains_ignore_case(title, query)),
                NoteSearchColumn::Content => contains_ignore_case(&note.content, query),
            })
            .cloned()
            .collect::<Vec<Note>>();

        Ok(page.slice(notes))
    }

    async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note> {
        let mut notes = self.notes.lock().await;

        let note = Note {
            id: notes.assign_id(),
            user_id: values.user.id,
            title: values.title.map(ToString::to_string),
            content: values.content.to_string(),
            created_at: Utc::now().naive_utc(),
            edited_at: Utc::now().naive_utc(),
        };

        notes.rows.insert(note.id, note.clone());

        Ok(note)
    }

    async fn update_note(&self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note> {
        Ok(self
            .notes
            .lock()
            .await
            .rows
            .get_mut(&note.id)
            .map(|note| {
                // an empty update leaves the note, including its edit
                // timestamp, untouched
                if values.title.is_none() && values.content.is_none() {
                    return note.clone();
                }

                if let Some(title) = values.title {
                    note.title = Some(title.to_string());
                }

                if let Some(content) = values.content {
                    note.content = content.to_string();
                }

                note.edited_at = Utc::now().naive_utc();

                note.clone()
            })
            .expect("Table is the source of the note"))
    }

    async fn delete_note(&self, note: &Note) -> Result<()> {
        self.notes.lock().await.rows.remove(&note.id);

        Ok(())
    }
}
