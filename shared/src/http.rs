//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::Error;

/// Error body returned for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::from(serde_json::to_string(data)?))?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ErrorBody { error: message.into() })
}

/// Create an error response whose status follows the error kind.
pub fn error_from(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    error_response(err.status_code(), err.to_string())
}

/// Parse and validate a JSON request body, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on success, `Ok(Err(Response))` on a bad body (400),
/// or `Err(lambda_http::Error)` when the error response cannot be built.
pub fn parse_json_body<T: DeserializeOwned + Validate>(
    body: &Body,
) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    match decode_body(body) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => Ok(Err(error_from(&e)?)),
    }
}

fn decode_body<T: DeserializeOwned + Validate>(body: &Body) -> crate::Result<T> {
    let parsed: T = serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?;
    parsed
        .validate()
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?;
    Ok(parsed)
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: QueryRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match shared::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}
