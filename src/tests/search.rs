use axum::http::StatusCode;
use serde_json::Map;
use serde_json::Value;

use crate::tests::helper;

async fn create_titled_note(
    app: &mut axum::Router,
    session: &str,
    title: &str,
    content: &str,
) -> i64 {
    let mut payload = Map::new();
    payload.insert("title".to_string(), Value::String(title.to_string()));
    payload.insert("content".to_string(), Value::String(content.to_string()));

    let (status_code, body) = helper::create_note(app, Some(session), &payload).await;
    assert_eq!(StatusCode::CREATED, status_code);

    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_title_search_is_case_insensitive() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;
    create_titled_note(&mut app, &session, "Hello World", "greetings").await;

    let (status_code, body) = helper::get(&mut app, "/api/notes/title?query=hello").await;
    assert_eq!(StatusCode::OK, status_code);
    assert!(body["data"].is_object());
    assert_eq!("Hello World", body["data"]["title"].as_str().unwrap());
}

#[tokio::test]
async fn test_content_search() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;

    let first = helper::create_simple_note(&mut app, &session, "Rust is fun").await;
    let second = helper::create_simple_note(&mut app, &session, "more rust, more fun").await;
    helper::create_simple_note(&mut app, &session, "python for a change").await;

    let (status_code, body) = helper::get(&mut app, "/api/notes/content?query=RUST").await;
    assert_eq!(StatusCode::OK, status_code);

    let notes = body["data"].as_array().unwrap();
    assert_eq!(2, notes.len());
    assert_eq!(first, notes[0]["id"].as_i64().unwrap());
    assert_eq!(second, notes[1]["id"].as_i64().unwrap());
}

#[tokio::test]
async fn test_search_without_match() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;
    helper::create_simple_note(&mut app, &session, "something").await;

    let (status_code, body) = helper::get(&mut app, "/api/notes/content?query=zzz").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(
        "No notes found 'zzz' for the search query.".to_string(),
        helper::get_error_message(&body)
    );
}

#[tokio::test]
async fn test_search_window() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;

    for number in 1..=5 {
        helper::create_simple_note(&mut app, &session, &format!("match {number}")).await;
    }

    let (status_code, body) =
        helper::get(&mut app, "/api/notes/content?query=match&skip=1&limit=2").await;
    assert_eq!(StatusCode::OK, status_code);

    let notes = body["data"].as_array().unwrap();
    assert_eq!(2, notes.len());
    assert_eq!("match 2", notes[0]["content"].as_str().unwrap());
    assert_eq!("match 3", notes[1]["content"].as_str().unwrap());
}

#[tokio::test]
async fn test_titleless_notes_do_not_match_title_search() {
    let mut app = helper::setup_test_app().await;

    let (_, session) = helper::register(&mut app, "alice", "alice@example.com", "verysecret").await;
    helper::create_simple_note(&mut app, &session, "hello in the content only").await;

    let (status_code, _) = helper::get(&mut app, "/api/notes/title?query=hello").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}
