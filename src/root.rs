//! Liveness greetings
//!
//! The two unauthenticated routes outside the API prefix

use axum::Json;
use serde_json::json;
use serde_json::Value;

/// Root greeting
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

/// Home greeting
pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome in Home" }))
}
