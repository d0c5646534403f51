use chrono::naive::NaiveDateTime;

#[derive(Clone, Debug)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub edited_at: NaiveDateTime,
}
