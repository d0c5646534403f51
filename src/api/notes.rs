//! Note API management

use std::ops::Deref;

use axum::extract::Query;
use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::lookup::Lookup;
use crate::lookup::NoteField;
use crate::lookup::NoteSearchColumn;
use crate::lookup::Page;
use crate::notes::Note;
use crate::storage::CreateNoteValues;
use crate::storage::Storage;
use crate::storage::UpdateNoteValues;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// The note response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// The note ID
    pub id: i64,

    /// The owning user
    pub user_id: i64,

    /// Optional title
    pub title: Option<String>,

    /// The content
    pub content: String,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Date of the last edit
    pub edited_at: NaiveDateTime,
}

impl NoteResponse {
    fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            edited_at: note.edited_at,
        }
    }

    fn from_note_multiple(mut notes: Vec<Note>) -> Vec<Self> {
        notes.drain(..).map(Self::from_note).collect::<Vec<Self>>()
    }
}

/// Query parameters of the note lookup endpoint
#[derive(Debug, Deserialize)]
pub struct NoteLookupParams {
    query: Option<String>,
    note_id: Option<i64>,
    skip: Option<i64>,
    limit: Option<i64>,
}

/// Lookup notes by field
///
/// The `field` path segment selects the strategy:
/// - `id`: lookup by `note_id`
/// - `list`: paginated listing
/// - `title` / `content`: case-insensitive substring search on that column
///
/// A single match is returned as one object, multiple matches as an array in
/// ascending id order
///
/// Request:
/// ```sh
/// curl -v 'http://localhost:6000/api/notes/title?query=hello'
/// ```
pub async fn lookup<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(field): PathParameters<String>,
    Query(params): Query<NoteLookupParams>,
) -> Result<Success<Lookup<NoteResponse>>, Error> {
    let field = field.parse::<NoteField>().map_err(Error::bad_request)?;
    let page = Page::new(params.skip, params.limit);

    match field {
        NoteField::Id => {
            let note_id = params
                .note_id
                .ok_or_else(|| Error::bad_request("Missing note_id for field: id."))?;

            let note = storage
                .find_single_note_by_id(note_id)
                .await
                .map_err(Error::internal_server_error)?
                .ok_or_else(|| Error::not_found(format!("Note with id {note_id} not found")))?;

            Ok(Success::ok(Lookup::Single(NoteResponse::from_note(note))))
        }
        NoteField::List => {
            let notes = storage
                .find_all_notes(&page)
                .await
                .map_err(Error::internal_server_error)?;

            Lookup::from_rows(NoteResponse::from_note_multiple(notes))
                .map(Success::ok)
                .ok_or_else(|| Error::not_found("No notes found"))
        }
        NoteField::Title | NoteField::Content => {
            let column = match field {
                NoteField::Title => NoteSearchColumn::Title,
                _ => NoteSearchColumn::Content,
            };

            let query = params.query.filter(|query| !query.is_empty()).ok_or_else(|| {
                let name = match column {
                    NoteSearchColumn::Title => "title",
                    NoteSearchColumn::Content => "content",
                };

                Error::bad_request(format!("Invalid query for field: {name}."))
            })?;

            let notes = storage
                .search_notes(column, &query, &page)
                .await
                .map_err(Error::internal_server_error)?;

            Lookup::from_rows(NoteResponse::from_note_multiple(notes))
                .map(Success::ok)
                .ok_or_else(|| {
                    Error::not_found(format!("No notes found '{query}' for the search query."))
                })
        }
    }
}

/// Note creation form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    /// Explicit owner of the note
    ///
    /// Falls back to the caller's session user when missing (or zero)
    user_id: Option<i64>,
    /// Optional title
    title: Option<String>,
    /// The content
    content: String,
}

/// Create a note
///
/// The owner is the given `userId`, or the caller's session user when none is
/// given
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     --cookie 'jotter_session=...' \
///     -d '{ "title": "Groceries", "content": "Eggs and flour" }' \
///     http://localhost:6000/api/notes/create
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: Option<CurrentUser<S>>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    if form.content.is_empty() {
        return Err(Error::bad_request("Content can not be empty"));
    }

    // zero counts as "not given", matching clients that default the field
    let owner = match form.user_id.filter(|user_id| *user_id != 0) {
        Some(user_id) => storage
            .find_single_user_by_id(user_id)
            .await
            .map_err(Error::internal_server_error)?
            .ok_or_else(|| Error::not_found(format!("User with id {user_id} not found")))?,
        None => {
            let current_user =
                current_user.ok_or_else(|| Error::unauthorized("No active session"))?;

            current_user.deref().clone()
        }
    };

    let values = CreateNoteValues {
        user: &owner,
        title: form.title.as_deref(),
        content: &form.content,
    };

    let note = storage
        .create_note(&values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Note update form
///
/// Only fields that are present overwrite; an empty form leaves the note
/// untouched
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteForm {
    /// New (optional) title
    title: Option<String>,
    /// New (optional) content
    content: Option<String>,
}

/// Partially update one of the current user's notes
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     --cookie 'jotter_session=...' \
///     -d '{ "content": "Eggs, flour and milk" }' \
///     http://localhost:6000/api/notes/1/update
/// ```
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
    Form(form): Form<UpdateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let note = fetch_note(&storage, note_id).await?;

    if note.user_id != current_user.id {
        return Err(Error::forbidden("Not allowed to update another user's note"));
    }

    let values = UpdateNoteValues {
        title: form.title.as_ref(),
        content: form.content.as_ref(),
    };

    let note = storage
        .update_note(&note, &values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Permanently delete one of the current user's notes
///
/// Request:
/// ```sh
/// curl -v -XDELETE --cookie 'jotter_session=...' \
///     http://localhost:6000/api/notes/1/delete
/// ```
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<&'static str>, Error> {
    let note = fetch_note(&storage, note_id).await?;

    if note.user_id != current_user.id {
        return Err(Error::forbidden("Not allowed to delete another user's note"));
    }

    storage
        .delete_note(&note)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::<&'static str>::no_content())
}

/// Fetch a note from storage
async fn fetch_note<S: Storage>(storage: &S, note_id: i64) -> Result<Note, Error> {
    storage
        .find_single_note_by_id(note_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(
            || Err(Error::not_found(format!("Note with id {note_id} not found"))),
            Ok,
        )
}
