//! All API endpoint setup

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;

use crate::storage::Storage;

pub use current_user::CurrentUser;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

mod current_user;
mod notes;
mod request;
mod response;
mod users;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    // the one path parameter doubles as the lookup field selector and as the
    // id of the write routes; one name per position, the router requires it
    let users = Router::new()
        .route("/register", post(users::register::<S>))
        .route("/login", post(users::login::<S>))
        .route("/logout", delete(users::logout::<S>))
        .route("/{field}", get(users::lookup::<S>))
        .route("/{field}/update", put(users::update::<S>))
        .route("/{field}/delete", delete(users::delete::<S>));

    let notes = Router::new()
        .route("/create", post(notes::create::<S>))
        .route("/{field}", get(notes::lookup::<S>))
        .route("/{field}/update", put(notes::update::<S>))
        .route("/{field}/delete", delete(notes::delete::<S>));

    Router::new().nest("/users", users).nest("/notes", notes)
}
