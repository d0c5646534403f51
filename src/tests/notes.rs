use axum::http::StatusCode;
use serde_json::Map;
use serde_json::Value;

use crate::tests::helper;

#[tokio::test]
async fn test_note_lifecycle() {
    let mut app = helper::setup_test_app().await;

    let (user, session) =
        helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;

    // create, the owner comes from the session
    let mut payload = Map::new();
    payload.insert("title".to_string(), Value::String("Groceries".to_string()));
    payload.insert(
        "content".to_string(),
        Value::String("Eggs and flour".to_string()),
    );

    let (status_code, body) = helper::create_note(&mut app, Some(&session), &payload).await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!(user.id, body["data"]["userId"].as_i64().unwrap());
    assert_eq!("Groceries", body["data"]["title"].as_str().unwrap());

    let note_id = body["data"]["id"].as_i64().unwrap();

    // fetch it back
    let (status_code, body) =
        helper::get(&mut app, &format!("/api/notes/id?note_id={note_id}")).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("Eggs and flour", body["data"]["content"].as_str().unwrap());

    // update the content
    let mut payload = Map::new();
    payload.insert(
        "content".to_string(),
        Value::String("Eggs, flour and milk".to_string()),
    );

    let (status_code, body) =
        helper::update_note(&mut app, Some(&session), note_id, &payload).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(
        "Eggs, flour and milk",
        body["data"]["content"].as_str().unwrap()
    );

    // delete it
    let (status_code, _) = helper::delete_note(&mut app, Some(&session), note_id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, body) =
        helper::get(&mut app, &format!("/api/notes/id?note_id={note_id}")).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(
        format!("Note with id {note_id} not found"),
        helper::get_error_message(&body)
    );
}

#[tokio::test]
async fn test_create_with_explicit_owner() {
    let mut app = helper::setup_test_app().await;

    let (user, _) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;

    // no session needed when the owner is given explicitly
    let mut payload = Map::new();
    payload.insert("userId".to_string(), Value::from(user.id));
    payload.insert("content".to_string(), Value::String("by id".to_string()));

    let (status_code, body) = helper::create_note(&mut app, None, &payload).await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!(user.id, body["data"]["userId"].as_i64().unwrap());

    // an unknown owner is rejected
    let mut payload = Map::new();
    payload.insert("userId".to_string(), Value::from(999));
    payload.insert("content".to_string(), Value::String("orphan".to_string()));

    let (status_code, body) = helper::create_note(&mut app, None, &payload).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(
        "User with id 999 not found".to_string(),
        helper::get_error_message(&body)
    );

    // a zero owner counts as "not given" and needs a session
    let mut payload = Map::new();
    payload.insert("userId".to_string(), Value::from(0));
    payload.insert("content".to_string(), Value::String("zero".to_string()));

    let (status_code, body) = helper::create_note(&mut app, None, &payload).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status_code);
    assert_eq!(
        "No active session".to_string(),
        helper::get_error_message(&body)
    );
}

#[tokio::test]
async fn test_create_requires_content() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;

    let mut payload = Map::new();
    payload.insert("content".to_string(), Value::String(String::new()));

    let (status_code, body) = helper::create_note(&mut app, Some(&session), &payload).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Content can not be empty".to_string(),
        helper::get_error_message(&body)
    );
}

#[tokio::test]
async fn test_partial_update() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;

    let mut payload = Map::new();
    payload.insert("title".to_string(), Value::String("old title".to_string()));
    payload.insert("content".to_string(), Value::String("original".to_string()));

    let (status_code, body) = helper::create_note(&mut app, Some(&session), &payload).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let note_id = body["data"]["id"].as_i64().unwrap();

    // only the title changes, the content stays
    let mut payload = Map::new();
    payload.insert("title".to_string(), Value::String("new title".to_string()));

    let (status_code, body) =
        helper::update_note(&mut app, Some(&session), note_id, &payload).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("new title", body["data"]["title"].as_str().unwrap());
    assert_eq!("original", body["data"]["content"].as_str().unwrap());

    let edited_at = body["data"]["editedAt"].as_str().unwrap().to_string();

    // an empty update leaves the note, including its edit timestamp, alone
    let (status_code, body) =
        helper::update_note(&mut app, Some(&session), note_id, &Map::new()).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("new title", body["data"]["title"].as_str().unwrap());
    assert_eq!("original", body["data"]["content"].as_str().unwrap());
    assert_eq!(edited_at, body["data"]["editedAt"].as_str().unwrap());
}

#[tokio::test]
async fn test_notes_are_owned() {
    let mut app = helper::setup_test_app().await;

    let (_, alice_session) =
        helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;
    let (_, bob_session) = helper::register(&mut app, "bob", "bob@example.com", "verysecret").await;

    let note_id = helper::create_simple_note(&mut app, &alice_session, "mine").await;

    let mut payload = Map::new();
    payload.insert("content".to_string(), Value::String("taken".to_string()));

    let (status_code, body) =
        helper::update_note(&mut app, Some(&bob_session), note_id, &payload).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert_eq!(
        "Not allowed to update another user's note".to_string(),
        helper::get_error_message(&body)
    );

    let (status_code, _) = helper::delete_note(&mut app, Some(&bob_session), note_id).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    // still intact for its owner
    let (status_code, body) =
        helper::get(&mut app, &format!("/api/notes/id?note_id={note_id}")).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("mine", body["data"]["content"].as_str().unwrap());
}

#[tokio::test]
async fn test_invalid_field() {
    let mut app = helper::setup_test_app().await;

    let (status_code, body) = helper::get(&mut app, "/api/notes/body").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Invalid field: body. Must be 'title', 'content', 'list' or 'id'.".to_string(),
        helper::get_error_message(&body)
    );

    let (status_code, body) = helper::get(&mut app, "/api/notes/id").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Missing note_id for field: id.".to_string(),
        helper::get_error_message(&body)
    );

    let (status_code, body) = helper::get(&mut app, "/api/notes/title").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Invalid query for field: title.".to_string(),
        helper::get_error_message(&body)
    );
}
