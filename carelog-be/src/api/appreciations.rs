//! Appreciation views and the polled chart queue
//!
//! The list view returns immediately with the tabular data plus a job id;
//! the client then polls `next-graph` to render one guest's chart per
//! round trip, `graph` to fetch a specific chart, and `graphs` to see how
//! far rendering has come.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::db::activities;
use crate::db::graph_jobs::{self, Advance, QueuedGuest};
use crate::graph::{self, Series};
use crate::AppState;

use super::{ApiError, Operator};

#[derive(Debug, Deserialize)]
pub struct AppreciationsQuery {
    month: Option<i64>,
}

/// GET /appreciations?month? - tabular appreciation data plus a fresh
/// rendering job id
pub async fn get_appreciations(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<AppreciationsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let output = activities::get_appreciations(
        &state.db,
        operator.semester,
        params.month,
        state.config.rotate_activity_list,
    )
    .await?;

    let queue: Vec<QueuedGuest> = output
        .appreciations
        .iter()
        .map(|guest| QueuedGuest {
            person_id: guest.id_persona,
            nome: guest.nome.clone(),
            cognome: guest.cognome.clone(),
            labels: guest
                .activities
                .iter()
                .map(|a| a.abbreviazione.clone())
                .collect(),
            adesione: guest.activities.iter().map(|a| a.media_adesione).collect(),
            partecipazione: guest
                .activities
                .iter()
                .map(|a| a.media_partecipazione)
                .collect(),
        })
        .collect();

    let session_id = graph_jobs::start(
        &state.db,
        &queue,
        state.config.graph_job_retention_minutes,
    )
    .await?;

    Ok(Json(json!({
        "appreciations": output.appreciations,
        "activities": output.activities,
        "session_id": session_id,
    })))
}

/// Render one queued guest's appreciation chart
fn render_chart(guest: &QueuedGuest) -> String {
    graph::percentage_bars(
        &format!("Gradimenti attività per {} {}", guest.nome, guest.cognome),
        &guest.labels,
        &[
            Series {
                name: "Adesione".to_string(),
                values: guest.adesione.iter().map(|v| *v as f64).collect(),
            },
            Series {
                name: "Partecipazione".to_string(),
                values: guest.partecipazione.iter().map(|v| *v as f64).collect(),
            },
        ],
    )
}

/// GET /appreciations/next-graph/:session_id - render the next chart
pub async fn next_graph(
    State(state): State<AppState>,
    _operator: Operator,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match graph_jobs::advance(&state.db, &session_id, render_chart).await? {
        Advance::Rendered {
            person_id,
            chart,
            completed,
        } => Ok(Json(json!({
            "completed": completed,
            "person_id": person_id,
            "graph": chart,
        }))),
        Advance::AlreadyComplete => Ok(Json(json!({ "completed": true }))),
    }
}

/// GET /appreciations/graph/:session_id/:person_id - fetch one chart if
/// it is ready
pub async fn get_graph(
    State(state): State<AppState>,
    _operator: Operator,
    Path((session_id, person_id)): Path<(String, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match graph_jobs::peek(&state.db, &session_id, person_id).await? {
        Some(chart) => Ok(Json(json!({ "ready": true, "graph": chart }))),
        None => Ok(Json(json!({ "ready": false }))),
    }
}

/// GET /appreciations/graphs/:session_id - guest ids rendered so far
pub async fn rendered_graphs(
    State(state): State<AppState>,
    _operator: Operator,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rendered = graph_jobs::status(&state.db, &session_id).await?;
    Ok(Json(json!({ "rendered": rendered })))
}
