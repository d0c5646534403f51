//! Field-dispatch lookups
//!
//! The `{field}` path segment of the user and note read endpoints selects a
//! lookup strategy. The selectors are closed enums so every strategy is
//! matched exhaustively; an unknown segment never falls through silently.

use std::str::FromStr;

use serde::Serialize;

/// Default page size when a caller skips without bounding the result
pub const DEFAULT_LIMIT: i64 = 10;

/// Lookup strategies for the user read endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserField {
    /// The user bound to the caller's session
    Me,
    /// Lookup by `user_id`
    Id,
    /// Case-insensitive substring search on the username
    Name,
    /// Paginated listing
    List,
}

impl FromStr for UserField {
    type Err = String;

    fn from_str(field: &str) -> Result<Self, Self::Err> {
        match field {
            "me" => Ok(Self::Me),
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "list" => Ok(Self::List),
            other => Err(format!(
                "Invalid field: {other}. Must be 'me', 'id', 'name' or 'list'."
            )),
        }
    }
}

/// Lookup strategies for the note read endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteField {
    /// Lookup by `note_id`
    Id,
    /// Paginated listing
    List,
    /// Case-insensitive substring search on the title
    Title,
    /// Case-insensitive substring search on the content
    Content,
}

impl FromStr for NoteField {
    type Err = String;

    fn from_str(field: &str) -> Result<Self, Self::Err> {
        match field {
            "id" => Ok(Self::Id),
            "list" => Ok(Self::List),
            "title" => Ok(Self::Title),
            "content" => Ok(Self::Content),
            other => Err(format!(
                "Invalid field: {other}. Must be 'title', 'content', 'list' or 'id'."
            )),
        }
    }
}

/// The searchable note columns
#[derive(Clone, Copy, Debug)]
pub enum NoteSearchColumn {
    Title,
    Content,
}

/// Pagination window for listings and searches
///
/// One rule for every call site: nothing given means the full result set,
/// `skip` without `limit` applies [`DEFAULT_LIMIT`], `limit` without `skip`
/// starts at the beginning. Negative values clamp to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: Option<i64>,
}

impl Page {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        let resolved_limit = match (skip, limit) {
            (Some(_), None) => Some(DEFAULT_LIMIT),
            (_, limit) => limit.map(|limit| limit.max(0)),
        };

        Self {
            skip: skip.unwrap_or(0).max(0),
            limit: resolved_limit,
        }
    }

    /// The full result set, unsliced
    pub fn all() -> Self {
        Self {
            skip: 0,
            limit: None,
        }
    }

    /// Apply the window to an already-ordered sequence
    pub fn slice<T>(&self, rows: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.skip).unwrap_or(0);
        let rows = rows.into_iter().skip(skip);

        match self.limit {
            Some(limit) => rows.take(usize::try_from(limit).unwrap_or(0)).collect(),
            None => rows.collect(),
        }
    }
}

/// Normalized shape of a lookup result
///
/// A single match serializes as one object, multiple matches as an array in
/// the order the storage returned them (ascending id). Zero matches never
/// reach this type; callers turn the empty case into a not-found message.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    Single(T),
    Many(Vec<T>),
}

impl<T> Lookup<T> {
    /// Normalize a result set, `None` when it is empty
    pub fn from_rows(mut rows: Vec<T>) -> Option<Self> {
        match rows.len() {
            0 => None,
            1 => rows.pop().map(Self::Single),
            _ => Some(Self::Many(rows)),
        }
    }
}
