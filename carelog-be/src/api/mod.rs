//! HTTP handler layer
//!
//! One module per endpoint group. Handlers translate between the wire
//! shapes and the DAO layer; all record logic lives under `crate::db`.
//!
//! Authentication comes first everywhere: the [`Operator`] extractor runs
//! before body or query extraction in every protected handler, so a
//! missing session is always a 401, never a 400.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use carelog_common::{Error, SemesterFilter};

use crate::db::accounts;
use crate::AppState;

pub mod account;
pub mod activities;
pub mod appreciations;
pub mod home;
pub mod records;
pub mod semester;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "carelog_session";

/// Error wrapper translating the common taxonomy to HTTP responses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized access".to_string()),
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::MalformedDate(s) => (StatusCode::BAD_REQUEST, format!("Malformed date: {}", s)),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::EmptyRange(msg) => (StatusCode::CONFLICT, msg.clone()),
            other => {
                tracing::error!("request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Simple `{"message": ...}` success payload
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(text: &str) -> Json<Self> {
        Json(Self {
            message: text.to_string(),
        })
    }
}

/// The authenticated operator, resolved from the session cookie
///
/// Carries the session's semester selection so handlers can pass it to
/// the DAO layer explicitly.
#[derive(Debug, Clone)]
pub struct Operator {
    pub account_id: i64,
    pub token: String,
    pub semester: SemesterFilter,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Operator {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| Error::Unauthorized("no session cookie".to_string()))?;

        let session = accounts::resolve_session(&state.db, &token, state.config.session_minutes)
            .await?
            .ok_or_else(|| Error::Unauthorized("invalid or expired session".to_string()))?;

        Ok(Self {
            account_id: session.account_id,
            token,
            semester: SemesterFilter(session.semester),
        })
    }
}

/// Pull the session token out of the Cookie header
fn session_token(parts: &Parts) -> Option<String> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(SESSION_COOKIE) {
            if let Some(token) = value.strip_prefix('=') {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Deserialize a JSON body into a typed payload, surfacing missing or
/// malformed fields as a 400 rather than a deserializer-shaped rejection
pub fn parse_payload<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError(Error::InvalidInput(format!("{}", e))))
}
