//! carelog backend service
//!
//! Session-authenticated HTTP API for daily care records: operators log
//! in, record and delete dated entries per guest, and review historical
//! views scoped by an optionally selected semester.

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, CorsLayer};

use carelog_common::Config;

pub mod api;
pub mod db;
pub mod graph;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service configuration
    pub config: Config,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self { db, config }
    }
}

/// Build application router
///
/// Every route except `/login` resolves the operator session first; a
/// missing or expired session is a 401 before any other validation runs.
pub fn build_router(state: AppState) -> Router {
    // The frontend is served from another origin and sends the session
    // cookie, so origins are mirrored rather than wildcarded.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        // Accounts and sessions
        .route("/login", post(api::account::login))
        .route("/logout", get(api::account::logout))
        .route("/ping", get(api::account::ping))
        // Home dashboard and guest administration
        .route("/home", get(api::home::home))
        .route("/new_guest", post(api::home::new_guest))
        .route("/delete_guest", get(api::home::delete_guest))
        // Semesters
        .route("/semesters_list", get(api::semester::semesters_list))
        .route("/set_semester", post(api::semester::set_semester))
        .route("/reset_semester", post(api::semester::reset_semester))
        .route("/new_semester", get(api::semester::new_semester))
        // Activity participation
        .route("/activities", get(api::activities::get_activities))
        .route("/new_activity_entry", post(api::activities::create_activity_entry))
        .route("/delete_activity", get(api::activities::delete_activity))
        .route("/declare_absence", post(api::activities::declare_absence))
        // Appreciations and the polled chart queue
        .route("/appreciations", get(api::appreciations::get_appreciations))
        .route(
            "/appreciations/next-graph/:session_id",
            get(api::appreciations::next_graph),
        )
        .route(
            "/appreciations/graph/:session_id/:person_id",
            get(api::appreciations::get_graph),
        )
        .route(
            "/appreciations/graphs/:session_id",
            get(api::appreciations::rendered_graphs),
        )
        // Simple dated-record entities
        .route("/toilet", get(api::records::get_toilet_entries))
        .route("/new_toilet_entry", post(api::records::create_toilet_entry))
        .route("/delete_toilet_entry", get(api::records::delete_toilet_entry))
        .route("/hydration", get(api::records::get_hydration_entries))
        .route("/new_hydration_entry", post(api::records::create_hydration_entry))
        .route("/delete_hydration_entry", get(api::records::delete_hydration_entry))
        .route("/shower", get(api::records::get_shower_entries))
        .route("/new_shower_entry", post(api::records::create_shower_entry))
        .route("/delete_shower_entry", get(api::records::delete_shower_entry))
        .route("/weights", get(api::records::get_weights))
        .route("/new_weight", post(api::records::create_weight_entry))
        .route("/delete_weight", get(api::records::delete_weight))
        .route("/vitals", get(api::records::get_vitals))
        .route("/new_vital", post(api::records::create_vital_entry))
        .route("/delete_vital", get(api::records::delete_vital))
        .route("/seizures", get(api::records::get_seizures))
        .route("/new_seizure", post(api::records::create_seizure))
        .route("/delete_seizure", get(api::records::delete_seizure))
        .route("/logbook", get(api::records::get_logbook_entries))
        .route("/new_logbook_entry", post(api::records::create_logbook_entry))
        .route("/delete_logbook", get(api::records::delete_logbook))
        .route("/target", get(api::records::get_target_entries))
        .route("/new_target_entry", post(api::records::create_target_entry))
        .route("/delete_target", get(api::records::delete_target))
        .route("/problem_behavior", get(api::records::get_problem_behaviors))
        .route(
            "/new_problem_behavior_entry",
            post(api::records::create_problem_behavior),
        )
        .route("/delete_problem_behavior", get(api::records::delete_problem_behavior))
        .layer(cors)
        .with_state(state)
}
