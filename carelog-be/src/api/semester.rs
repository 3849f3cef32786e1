//! Semester views and lifecycle

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use carelog_common::Error;

use crate::db::{accounts, semesters};
use crate::AppState;

use super::{parse_payload, ApiError, Message, Operator};

/// GET /semesters_list
pub async fn semesters_list(
    State(state): State<AppState>,
    _operator: Operator,
) -> Result<Json<Vec<semesters::Semester>>, ApiError> {
    Ok(Json(semesters::list_semesters(&state.db).await?))
}

#[derive(Debug, Deserialize)]
struct SetSemesterRequest {
    semester_id: i64,
}

/// POST /set_semester - scope this session's views to one semester
pub async fn set_semester(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Message>, ApiError> {
    let request: SetSemesterRequest = parse_payload(body)
        .map_err(|_| ApiError(Error::InvalidInput("Semester ID is required".to_string())))?;

    accounts::set_session_semester(&state.db, &operator.token, Some(request.semester_id)).await?;
    Ok(Message::new("Semester set successfully"))
}

/// POST /reset_semester - back to the legacy (pre-semester) view
pub async fn reset_semester(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<Message>, ApiError> {
    accounts::set_session_semester(&state.db, &operator.token, None).await?;
    Ok(Message::new("Semester reset successfully"))
}

/// GET /new_semester - close out the current period
pub async fn new_semester(
    State(state): State<AppState>,
    _operator: Operator,
) -> Result<Json<semesters::Semester>, ApiError> {
    Ok(Json(semesters::create_semester(&state.db).await?))
}
