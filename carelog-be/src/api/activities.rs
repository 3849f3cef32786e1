//! Activity participation endpoints

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::db::activities::{self, NewActivityEntry};
use crate::graph::{self, Series};
use crate::AppState;

use super::{parse_payload, ApiError, Message, Operator};

#[derive(Debug, Deserialize)]
pub struct ActivitiesQuery {
    person_id: i64,
    month: Option<i64>,
}

/// GET /activities?person_id&month? - one guest's visits plus their
/// adherence/participation history chart
pub async fn get_activities(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entries =
        activities::list_activities(&state.db, params.person_id, operator.semester, params.month)
            .await?;

    // scored visits only; absences carry no scores
    let mut dates = Vec::new();
    let mut adesioni = Vec::new();
    let mut partecipazioni = Vec::new();
    for entry in &entries {
        if let (Some(adesion), Some(participation)) = (entry.adesion, entry.participation) {
            dates.push(entry.date.clone());
            adesioni.push(adesion as f64);
            partecipazioni.push(participation as f64);
        }
    }
    let plot_image = graph::history_lines(
        "Adesion and Participation Over Time",
        &dates,
        &[
            Series {
                name: "Adesion".to_string(),
                values: adesioni,
            },
            Series {
                name: "Participation".to_string(),
                values: partecipazioni,
            },
        ],
    );

    Ok(Json(json!({
        "activities": entries,
        "plot_image": plot_image,
    })))
}

/// POST /new_activity_entry
pub async fn create_activity_entry(
    State(state): State<AppState>,
    _operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewActivityEntry = parse_payload(body)?;
    activities::create_activity_entry(&state.db, &entry).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Activity entry created successfully"),
    ))
}

#[derive(Debug, Deserialize)]
pub struct IdParam {
    id: i64,
}

/// GET /delete_activity?id=
pub async fn delete_activity(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    activities::delete_activity(&state.db, params.id).await?;
    Ok(Message::new("Activity deleted successfully"))
}

#[derive(Debug, Deserialize)]
struct AbsenceRequest {
    person_id: i64,
    date: String,
}

/// POST /declare_absence - record the morning and afternoon absence pair
pub async fn declare_absence(
    State(state): State<AppState>,
    _operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let request: AbsenceRequest = parse_payload(body)?;
    activities::declare_absence(&state.db, request.person_id, &request.date).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Absence declared successfully"),
    ))
}
