//! Integration tests for the carelog HTTP surface
//!
//! Runs the real router against an in-memory database via oneshot
//! requests: login and session flow, auth-before-validation ordering,
//! record round trips, and the polled graph protocol.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

use carelog_be::{build_router, AppState};
use carelog_common::db::create_schema;
use carelog_common::Config;

async fn setup_pool() -> SqlitePool {
    // a single connection keeps the in-memory database shared
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();

    sqlx::query("INSERT INTO account (nome, cognome, password) VALUES ('Mario', 'Rossi', ?)")
        .bind(carelog_be::db::accounts::password_digest("segreto"))
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO persona (nome, cognome) VALUES ('Anna', 'Bianchi')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO attivita (nome_attivita, abbreviazione) VALUES ('Piscina', 'PIS')")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn setup_app(pool: SqlitePool) -> axum::Router {
    build_router(AppState::new(pool, Config::default()))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in and return the session cookie
async fn login(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(post(
            "/login",
            None,
            json!({"name": "Mario", "surname": "Rossi", "password": "segreto"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = setup_app(setup_pool().await);

    let response = app
        .oneshot(post(
            "/login",
            None,
            json!({"name": "Mario", "surname": "Rossi", "password": "sbagliato"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_are_401_without_a_session() {
    let app = setup_app(setup_pool().await);

    for uri in ["/home", "/toilet?person_id=1", "/appreciations", "/semesters_list"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn auth_is_checked_before_body_validation() {
    let app = setup_app(setup_pool().await);

    // invalid body AND no session: the session failure wins
    let response = app
        .oneshot(post("/new_toilet_entry", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn toilet_round_trip() {
    let app = setup_app(setup_pool().await);
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(post(
            "/new_toilet_entry",
            Some(&cookie),
            json!({
                "person_id": 1,
                "date": "2024-04-03",
                "morning": "yes",
                "urine": "yes",
                "feces": "no",
                "diaper": "2",
                "redness": "on"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/toilet?person_id=1", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["date"], "2024-04-03");
    assert_eq!(rows[0]["morning"], 1);
    assert_eq!(rows[0]["signature"], "Mario Rossi");

    // delete and verify the listing is empty again
    let id = rows[0]["id"].as_i64().unwrap();
    let response = app
        .clone()
        .oneshot(get(
            &format!("/delete_toilet_entry?entry_id={}", id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/toilet?person_id=1", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_required_field_is_400() {
    let app = setup_app(setup_pool().await);
    let cookie = login(&app).await;

    let response = app
        .oneshot(post(
            "/new_weight",
            Some(&cookie),
            json!({"person_id": 1, "date": "2024-04-03"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn semester_selection_scopes_listings() {
    let app = setup_app(setup_pool().await);
    let cookie = login(&app).await;

    // a legacy weight entry, then a semester created over an activity span
    let response = app
        .clone()
        .oneshot(post(
            "/new_weight",
            Some(&cookie),
            json!({"person_id": 1, "date": "2024-02-07", "value": 68.5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(post(
            "/new_activity_entry",
            Some(&cookie),
            json!({
                "person_id": 1, "date": "2024-01-05", "morning": "yes",
                "activity": 1, "adesion": 3, "participation": 4,
                "mood": 3, "communication": 3
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/new_semester", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let semester = body_json(response).await;
    let semester_id = semester["id"].as_i64().unwrap();

    // with no selection the backfilled rows are out of view
    let response = app
        .clone()
        .oneshot(get("/weights?person_id=1", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["weights"].as_array().unwrap().is_empty());

    // selecting the semester brings them back
    let response = app
        .clone()
        .oneshot(post(
            "/set_semester",
            Some(&cookie),
            json!({"semester_id": semester_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/weights?person_id=1", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["weights"].as_array().unwrap().len(), 1);

    // and resetting restores the legacy view
    let response = app
        .clone()
        .oneshot(post("/reset_semester", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/weights?person_id=1", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["weights"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn appreciation_polling_protocol() {
    let app = setup_app(setup_pool().await);
    let cookie = login(&app).await;

    // one scored visit so the guest has an appreciation row
    app.clone()
        .oneshot(post(
            "/new_activity_entry",
            Some(&cookie),
            json!({
                "person_id": 1, "date": "2024-01-05", "morning": "yes",
                "activity": 1, "adesion": 3, "participation": 4,
                "mood": 3, "communication": 3
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/appreciations", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(body["appreciations"].as_array().unwrap().len(), 1);

    // nothing rendered yet
    let response = app
        .clone()
        .oneshot(get(
            &format!("/appreciations/graph/{}/1", session_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["ready"], false);

    // one advance renders the only guest and completes the job
    let response = app
        .clone()
        .oneshot(get(
            &format!("/appreciations/next-graph/{}", session_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["completed"], true);
    assert_eq!(body["person_id"], 1);
    assert!(body["graph"].as_str().is_some());

    let response = app
        .clone()
        .oneshot(get(
            &format!("/appreciations/graph/{}/1", session_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["ready"], true);

    // a further advance reports completion and discards the job
    let response = app
        .clone()
        .oneshot(get(
            &format!("/appreciations/next-graph/{}", session_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["completed"], true);
    assert!(body.get("person_id").is_none());

    let response = app
        .oneshot(get(
            &format!("/appreciations/graphs/{}", session_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_graph_job_is_404() {
    let app = setup_app(setup_pool().await);
    let cookie = login(&app).await;

    let response = app
        .oneshot(get("/appreciations/graphs/no-such-job", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = setup_app(setup_pool().await);
    let cookie = login(&app).await;

    let response = app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/home", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
