//! Home dashboard and guest administration

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::{guests, home};
use crate::AppState;

use super::{parse_payload, ApiError, Message, Operator};

/// GET /home - guests and their missing activity days from the last week
pub async fn home(
    State(state): State<AppState>,
    _operator: Operator,
) -> Result<Json<Vec<home::GuestDashboard>>, ApiError> {
    let today = chrono::Local::now().date_naive();
    Ok(Json(home::missing_activities(&state.db, today).await?))
}

#[derive(Debug, Deserialize)]
struct NewGuestRequest {
    name: String,
    surname: String,
}

/// POST /new_guest
pub async fn new_guest(
    State(state): State<AppState>,
    _operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let request: NewGuestRequest = parse_payload(body)?;
    guests::create_guest(&state.db, &request.name, &request.surname).await?;
    Ok((StatusCode::CREATED, Message::new("Guest created successfully")))
}

#[derive(Debug, Deserialize)]
pub struct GuestIdParam {
    guest_id: i64,
}

/// GET /delete_guest?guest_id= - soft delete
pub async fn delete_guest(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<GuestIdParam>,
) -> Result<Json<Message>, ApiError> {
    guests::delete_guest(&state.db, params.guest_id).await?;
    Ok(Message::new("Guest deleted successfully"))
}
