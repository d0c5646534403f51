use axum::body::Body;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::COOKIE;
use axum::http::header::SET_COOKIE;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use tower::Service;

use crate::setup_app;

/// Test helper version of User struct
#[derive(Debug)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Setup the Jotter app
///
/// Runs against the in-memory storage, every test gets a fresh one
pub async fn setup_test_app() -> Router {
    setup_app().await.unwrap()
}

/// Send a request, returning the status, the session cookie pair (if one was
/// set) and the parsed JSON body
async fn send(app: &mut Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.call(request).await.unwrap();

    let status_code = response.status();

    let session = response
        .headers()
        .get(SET_COOKIE)
        .map(|header| header.to_str().unwrap())
        .and_then(|header| header.split(';').next())
        .map(ToString::to_string);

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, session, parse_body(&body))
}

fn parse_body(body: &Bytes) -> Value {
    if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&body[..]).unwrap()
    }
}

fn json_request(
    method: Method,
    uri: String,
    session: Option<&str>,
    payload: &Map<String, Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());

    if let Some(session) = session {
        builder = builder.header(COOKIE, session);
    }

    builder
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

fn bare_request(method: Method, uri: String, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(session) = session {
        builder = builder.header(COOKIE, session);
    }

    builder.body(Body::empty()).unwrap()
}

/// A GET anywhere, optionally with a session
pub async fn get_with_session(
    app: &mut Router,
    uri: &str,
    session: Option<&str>,
) -> (StatusCode, Value) {
    let (status_code, _, body) =
        send(app, bare_request(Method::GET, uri.to_string(), session)).await;

    (status_code, body)
}

/// A GET anywhere, without a session
pub async fn get(app: &mut Router, uri: &str) -> (StatusCode, Value) {
    get_with_session(app, uri, None).await
}

pub async fn maybe_register(
    app: &mut Router,
    username: &str,
    email: &str,
    password: &str,
) -> (StatusCode, Option<String>, Value) {
    let mut payload = Map::new();
    payload.insert("username".to_string(), Value::String(username.to_string()));
    payload.insert("email".to_string(), Value::String(email.to_string()));
    payload.insert("password".to_string(), Value::String(password.to_string()));

    send(
        app,
        json_request(
            Method::POST,
            "/api/users/register".to_string(),
            None,
            &payload,
        ),
    )
    .await
}

/// Register an account, asserting success
pub async fn register(
    app: &mut Router,
    username: &str,
    email: &str,
    password: &str,
) -> (User, String) {
    let (status_code, session, body) = maybe_register(app, username, email, password).await;

    assert_eq!(StatusCode::CREATED, status_code);

    (get_user(&body), session.unwrap())
}

pub async fn maybe_login(
    app: &mut Router,
    username: &str,
    password: &str,
) -> (StatusCode, Option<String>, Value) {
    let mut payload = Map::new();
    payload.insert("username".to_string(), Value::String(username.to_string()));
    payload.insert("password".to_string(), Value::String(password.to_string()));

    send(
        app,
        json_request(Method::POST, "/api/users/login".to_string(), None, &payload),
    )
    .await
}

/// Login, asserting success
pub async fn login(app: &mut Router, username: &str, password: &str) -> (User, String) {
    let (status_code, session, body) = maybe_login(app, username, password).await;

    assert_eq!(StatusCode::OK, status_code);

    (get_user(&body), session.unwrap())
}

pub async fn logout(app: &mut Router, session: &str) -> StatusCode {
    let (status_code, _, _) = send(
        app,
        bare_request(
            Method::DELETE,
            "/api/users/logout".to_string(),
            Some(session),
        ),
    )
    .await;

    status_code
}

pub async fn update_user(
    app: &mut Router,
    session: Option<&str>,
    user_id: i64,
    payload: &Map<String, Value>,
) -> (StatusCode, Value) {
    let (status_code, _, body) = send(
        app,
        json_request(
            Method::PUT,
            format!("/api/users/{user_id}/update"),
            session,
            payload,
        ),
    )
    .await;

    (status_code, body)
}

pub async fn delete_user(
    app: &mut Router,
    session: Option<&str>,
    user_id: i64,
) -> (StatusCode, Value) {
    let (status_code, _, body) = send(
        app,
        bare_request(Method::DELETE, format!("/api/users/{user_id}/delete"), session),
    )
    .await;

    (status_code, body)
}

pub async fn create_note(
    app: &mut Router,
    session: Option<&str>,
    payload: &Map<String, Value>,
) -> (StatusCode, Value) {
    let (status_code, _, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/notes/create".to_string(),
            session,
            payload,
        ),
    )
    .await;

    (status_code, body)
}

/// Create a note with just a content, asserting success
pub async fn create_simple_note(app: &mut Router, session: &str, content: &str) -> i64 {
    let mut payload = Map::new();
    payload.insert("content".to_string(), Value::String(content.to_string()));

    let (status_code, body) = create_note(app, Some(session), &payload).await;

    assert_eq!(StatusCode::CREATED, status_code);

    body["data"]["id"].as_i64().unwrap()
}

pub async fn update_note(
    app: &mut Router,
    session: Option<&str>,
    note_id: i64,
    payload: &Map<String, Value>,
) -> (StatusCode, Value) {
    let (status_code, _, body) = send(
        app,
        json_request(
            Method::PUT,
            format!("/api/notes/{note_id}/update"),
            session,
            payload,
        ),
    )
    .await;

    (status_code, body)
}

pub async fn delete_note(
    app: &mut Router,
    session: Option<&str>,
    note_id: i64,
) -> (StatusCode, Value) {
    let (status_code, _, body) = send(
        app,
        bare_request(Method::DELETE, format!("/api/notes/{note_id}/delete"), session),
    )
    .await;

    (status_code, body)
}

/// Pull the test helper user out of a `{ "data": ... }` envelope
pub fn get_user(body: &Value) -> User {
    let user = body["data"].as_object().unwrap();

    User {
        id: user["id"].as_i64().unwrap(),
        username: user["username"].as_str().map(ToString::to_string).unwrap(),
        email: user["email"].as_str().map(ToString::to_string).unwrap(),
    }
}

/// Pull the error message out of a `{ "error": ... }` envelope
pub fn get_error_message(body: &Value) -> String {
    body["error"].as_str().map(ToString::to_string).unwrap()
}
