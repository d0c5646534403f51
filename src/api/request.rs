//! API request helpers

use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Request;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::users::MAX_BIO_LENGTH;

use super::Error;

/// Validate a username
///
/// Only checks presence, any non-empty name goes
pub fn validate_username(username: &str) -> Result<(), Error> {
    if username.trim().is_empty() {
        return Err(Error::bad_request("Username can not be empty"));
    }

    Ok(())
}

/// Validate an email address
///
/// Deliberately shallow, the single `@` is the only structure relied on
pub fn validate_email(email: &str) -> Result<(), Error> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(Error::bad_request("Invalid email address"));
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.is_empty() {
        return Err(Error::bad_request("Password can not be empty"));
    }

    Ok(())
}

/// Validate a bio against its length bound
pub fn validate_bio(bio: &str) -> Result<(), Error> {
    if bio.len() > MAX_BIO_LENGTH {
        return Err(Error::bad_request(format!(
            "Bio can not exceed {MAX_BIO_LENGTH} characters"
        )));
    }

    Ok(())
}

fn parse_json<J>(json: Result<Json<J>, JsonRejection>) -> Result<J, Error> {
    match json {
        Ok(Json(json)) => Ok(json),
        Err(err) => match err {
            JsonRejection::JsonDataError(err) => {
                Err(Error::bad_request("Data error").with_description(err))
            }
            JsonRejection::JsonSyntaxError(err) => Err(Error::bad_request("JSON syntax error")
                .with_description(std::error::Error::source(&err).expect("A valid source"))),
            JsonRejection::MissingJsonContentType(_err) => Err(Error::bad_request(
                "Missing `application/json` content type",
            )),
            JsonRejection::BytesRejection(err) => {
                Err(Error::bad_request("Invalid characters in JSON").with_description(err))
            }
            err => Err(Error::bad_request("Unknown JSON error").with_description(err)),
        },
    }
}

/// Wrapper for the JSON extractor
pub struct Form<F>(pub F);

impl<B, F> FromRequest<B> for Form<F>
where
    B: Send + Sync,
    F: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &B) -> Result<Self, Self::Rejection> {
        let json = Json::<F>::from_request(req, state).await;

        parse_json(json).map(Form)
    }
}

fn parse_path<P>(path: Result<Path<P>, PathRejection>) -> Result<P, Error> {
    match path {
        Ok(Path(path)) => Ok(path),
        Err(err) => match err {
            PathRejection::FailedToDeserializePathParams(err) => {
                Err(Error::bad_request("Invalid path parameter").with_description(err))
            }
            PathRejection::MissingPathParams(err) => {
                Err(Error::bad_request("Missing path parameter").with_description(err))
            }
            err => Err(Error::bad_request("Unknown path error").with_description(err)),
        },
    }
}

/// Wrapper for the path extractor
pub struct PathParameters<P>(pub P);

impl<B, P> FromRequestParts<B> for PathParameters<P>
where
    B: Send + Sync,
    P: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        let path = Path::<P>::from_request_parts(parts, state).await;

        parse_path(path).map(PathParameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("somebody").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("somebody@example.com").is_ok());
        assert!(validate_email("somebody").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_bio() {
        assert!(validate_bio("short and sweet").is_ok());
        assert!(validate_bio(&"a".repeat(MAX_BIO_LENGTH)).is_ok());
        assert!(validate_bio(&"a".repeat(MAX_BIO_LENGTH + 1)).is_err());
    }
}
