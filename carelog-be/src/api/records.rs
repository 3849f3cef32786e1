//! Uniform dated-record endpoint triples
//!
//! Every simple entity gets the same three routes: a per-guest listing,
//! a create, and a delete-by-id. The weight and vitals listings also
//! return their history chart alongside the rows.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::db::behaviors::{self, NewBehaviorEntry};
use crate::db::entries::{
    self, CareTaskEntry, NewCareTaskEntry, NewLogbookEntry, NewSeizureEntry, NewTargetEntry,
    NewToiletEntry, NewVitalEntry, NewWeightEntry,
};
use crate::graph::{self, Series};
use crate::AppState;

use super::{parse_payload, ApiError, Message, Operator};

#[derive(Debug, Deserialize)]
pub struct PersonParam {
    person_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct IdParam {
    id: i64,
}

#[derive(Debug, Deserialize)]
pub struct EntryIdParam {
    entry_id: i64,
}

// ========================================
// Toilet
// ========================================

/// GET /toilet?person_id=
pub async fn get_toilet_entries(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<Vec<entries::ToiletEntry>>, ApiError> {
    Ok(Json(
        entries::list_toilet(&state.db, params.person_id, operator.semester).await?,
    ))
}

/// POST /new_toilet_entry
pub async fn create_toilet_entry(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewToiletEntry = parse_payload(body)?;
    entries::create_toilet(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Toilet entry created successfully"),
    ))
}

/// GET /delete_toilet_entry?entry_id=
pub async fn delete_toilet_entry(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<EntryIdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_toilet(&state.db, params.entry_id).await?;
    Ok(Message::new("Toilet entry deleted successfully"))
}

// ========================================
// Hydration
// ========================================

/// GET /hydration?person_id=
pub async fn get_hydration_entries(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<Vec<CareTaskEntry>>, ApiError> {
    Ok(Json(
        entries::list_hydration(&state.db, params.person_id, operator.semester).await?,
    ))
}

/// POST /new_hydration_entry
pub async fn create_hydration_entry(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewCareTaskEntry = parse_payload(body)?;
    entries::create_hydration(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Hydration entry created successfully"),
    ))
}

/// GET /delete_hydration_entry?entry_id=
pub async fn delete_hydration_entry(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<EntryIdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_hydration(&state.db, params.entry_id).await?;
    Ok(Message::new("Hydration entry deleted successfully"))
}

// ========================================
// Shower
// ========================================

/// GET /shower?person_id=
pub async fn get_shower_entries(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<Vec<CareTaskEntry>>, ApiError> {
    Ok(Json(
        entries::list_shower(&state.db, params.person_id, operator.semester).await?,
    ))
}

/// POST /new_shower_entry
pub async fn create_shower_entry(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewCareTaskEntry = parse_payload(body)?;
    entries::create_shower(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Shower entry created successfully"),
    ))
}

/// GET /delete_shower_entry?entry_id=
pub async fn delete_shower_entry(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<EntryIdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_shower(&state.db, params.entry_id).await?;
    Ok(Message::new("Shower entry deleted successfully"))
}

// ========================================
// Weight
// ========================================

/// GET /weights?person_id= - rows plus the weight history chart
pub async fn get_weights(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let weights = entries::list_weights(&state.db, params.person_id, operator.semester).await?;

    let dates: Vec<String> = weights.iter().map(|w| w.date.clone()).collect();
    let values: Vec<f64> = weights.iter().map(|w| w.weight).collect();
    let plot_image = graph::history_lines(
        "Peso",
        &dates,
        &[Series {
            name: "Peso".to_string(),
            values,
        }],
    );

    Ok(Json(json!({
        "weights": weights,
        "plot_image": plot_image,
    })))
}

/// POST /new_weight
pub async fn create_weight_entry(
    State(state): State<AppState>,
    _operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewWeightEntry = parse_payload(body)?;
    entries::create_weight(&state.db, &entry).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Weight entry created successfully"),
    ))
}

/// GET /delete_weight?id=
pub async fn delete_weight(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_weight(&state.db, params.id).await?;
    Ok(Message::new("Weight deleted successfully"))
}

// ========================================
// Vital parameters
// ========================================

/// GET /vitals?person_id= - rows plus the blood pressure history chart
pub async fn get_vitals(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let vitals = entries::list_vitals(&state.db, params.person_id, operator.semester).await?;

    let dates: Vec<String> = vitals.iter().map(|v| v.date.clone()).collect();
    let plot_image = graph::history_lines(
        "Pressione",
        &dates,
        &[
            Series {
                name: "Massima".to_string(),
                values: vitals.iter().map(|v| v.max_pressure as f64).collect(),
            },
            Series {
                name: "Minima".to_string(),
                values: vitals.iter().map(|v| v.min_pressure as f64).collect(),
            },
        ],
    );

    Ok(Json(json!({
        "vitals": vitals,
        "plot_image": plot_image,
    })))
}

/// POST /new_vital
pub async fn create_vital_entry(
    State(state): State<AppState>,
    _operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewVitalEntry = parse_payload(body)?;
    entries::create_vital(&state.db, &entry).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Vital entry created successfully"),
    ))
}

/// GET /delete_vital?id=
pub async fn delete_vital(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_vital(&state.db, params.id).await?;
    Ok(Message::new("Vital deleted successfully"))
}

// ========================================
// Seizures
// ========================================

/// GET /seizures?person_id=
pub async fn get_seizures(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<Vec<entries::SeizureEntry>>, ApiError> {
    Ok(Json(
        entries::list_seizures(&state.db, params.person_id, operator.semester).await?,
    ))
}

/// POST /new_seizure
pub async fn create_seizure(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewSeizureEntry = parse_payload(body)?;
    entries::create_seizure(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Seizure entry created successfully"),
    ))
}

/// GET /delete_seizure?id=
pub async fn delete_seizure(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_seizure(&state.db, params.id).await?;
    Ok(Message::new("Seizure entry deleted successfully"))
}

// ========================================
// Logbook
// ========================================

/// GET /logbook?person_id= - always the full history, regardless of the
/// semester selection
pub async fn get_logbook_entries(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<Vec<entries::LogbookEntry>>, ApiError> {
    Ok(Json(entries::list_logbook(&state.db, params.person_id).await?))
}

/// POST /new_logbook_entry
pub async fn create_logbook_entry(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewLogbookEntry = parse_payload(body)?;
    entries::create_logbook(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Logbook entry created successfully"),
    ))
}

/// GET /delete_logbook?id=
pub async fn delete_logbook(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_logbook(&state.db, params.id).await?;
    Ok(Message::new("Logbook entry deleted successfully"))
}

// ========================================
// Targeted interventions
// ========================================

/// GET /target?person_id=
pub async fn get_target_entries(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<Vec<entries::TargetEntry>>, ApiError> {
    Ok(Json(
        entries::list_targets(&state.db, params.person_id, operator.semester).await?,
    ))
}

/// POST /new_target_entry
pub async fn create_target_entry(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewTargetEntry = parse_payload(body)?;
    entries::create_target(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Target entry created successfully"),
    ))
}

/// GET /delete_target?id=
pub async fn delete_target(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    entries::delete_target(&state.db, params.id).await?;
    Ok(Message::new("Target entries deleted successfully"))
}

// ========================================
// Problem behaviors
// ========================================

/// GET /problem_behavior?person_id=
pub async fn get_problem_behaviors(
    State(state): State<AppState>,
    operator: Operator,
    Query(params): Query<PersonParam>,
) -> Result<Json<behaviors::BehaviorsOutput>, ApiError> {
    Ok(Json(
        behaviors::list_behaviors(&state.db, params.person_id, operator.semester).await?,
    ))
}

/// POST /new_problem_behavior_entry
pub async fn create_problem_behavior(
    State(state): State<AppState>,
    operator: Operator,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let entry: NewBehaviorEntry = parse_payload(body)?;
    behaviors::create_behavior(&state.db, &entry, operator.account_id).await?;
    Ok((
        StatusCode::CREATED,
        Message::new("Problem behavior created successfully"),
    ))
}

/// GET /delete_problem_behavior?id=
pub async fn delete_problem_behavior(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<IdParam>,
) -> Result<Json<Message>, ApiError> {
    behaviors::delete_behavior(&state.db, params.id).await?;
    Ok(Message::new("Problem behavior deleted successfully"))
}
