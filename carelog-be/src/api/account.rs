//! Login, logout and liveness

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use carelog_common::Error;

use crate::db::accounts;
use crate::AppState;

use super::{parse_payload, ApiError, Message, Operator, SESSION_COOKIE};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    name: String,
    surname: String,
    password: String,
}

/// POST /login
///
/// The one unauthenticated endpoint. On success the session token is set
/// as an HttpOnly cookie and the operator's identity echoed back.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request: LoginRequest = parse_payload(body)?;
    if request.name.is_empty() || request.surname.is_empty() || request.password.is_empty() {
        return Err(Error::InvalidInput("Missing required fields".to_string()).into());
    }

    let digest = accounts::password_digest(&request.password);
    let account_id = accounts::login(&state.db, &request.name, &request.surname, &digest)
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid credentials".to_string()))?;

    let token =
        accounts::create_session(&state.db, account_id, state.config.session_minutes).await?;
    info!("Operator {} logged in", account_id);

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Login successful",
            "session": {
                "user_id": account_id,
                "name": request.name,
                "surname": request.surname,
            }
        })),
    ))
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<impl IntoResponse, ApiError> {
    accounts::delete_session(&state.db, &operator.token).await?;

    let cookie = format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE);
    Ok(([(header::SET_COOKIE, cookie)], Message::new("Logged out")))
}

/// GET /ping - liveness check returning the store's clock
pub async fn ping(
    State(state): State<AppState>,
    _operator: Operator,
) -> Result<Json<serde_json::Value>, ApiError> {
    let db_time: String = sqlx::query_scalar("SELECT datetime('now')")
        .fetch_one(&state.db)
        .await
        .map_err(Error::from)?;

    Ok(Json(json!({
        "status": "ok",
        "database_time": db_time,
        "session": true,
    })))
}
