//! Polled chart-rendering jobs
//!
//! Rendering one chart per guest inside a single request is too heavy, so
//! the appreciation view hands the client a job id and the client polls:
//! each poll renders exactly one guest's chart server-side and returns
//! it. Job state lives in the `graph_jobs` table — never in process
//! memory — so any worker can serve any poll.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use carelog_common::{Error, Result};

/// One guest queued for rendering, with the series the chart needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedGuest {
    pub person_id: i64,
    pub nome: String,
    pub cognome: String,
    pub labels: Vec<String>,
    pub adesione: Vec<i64>,
    pub partecipazione: Vec<i64>,
}

/// Outcome of an advance poll
#[derive(Debug)]
pub enum Advance {
    /// One more chart was rendered; `completed` is set when it was the
    /// last one in the queue
    Rendered {
        person_id: i64,
        chart: String,
        completed: bool,
    },
    /// The cursor was already past the end; the job has been discarded
    AlreadyComplete,
}

#[derive(Debug)]
struct JobRow {
    queue: String,
    cursor: i64,
    charts: String,
}

/// Create a job for a queue of guests, returning its id.
///
/// Stale jobs are swept opportunistically here, so an abandoned polling
/// loop costs at most one retention window of storage.
pub async fn start(
    pool: &SqlitePool,
    queue: &[QueuedGuest],
    retention_minutes: i64,
) -> Result<String> {
    sweep(pool, retention_minutes).await?;

    let session_id = Uuid::new_v4().to_string();
    let queue_json = serde_json::to_string(queue)
        .map_err(|e| Error::Internal(format!("failed to serialize guest queue: {}", e)))?;

    sqlx::query(
        "INSERT INTO graph_jobs (session_id, queue, cursor, charts, touched_at)
         VALUES (?, ?, 0, '{}', ?)",
    )
    .bind(&session_id)
    .bind(queue_json)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(session_id)
}

/// Render the next guest's chart and advance the cursor.
///
/// `render` is the chart collaborator: a pure function from the queued
/// series to the encoded image.
pub async fn advance<F>(pool: &SqlitePool, session_id: &str, render: F) -> Result<Advance>
where
    F: Fn(&QueuedGuest) -> String,
{
    let job = load(pool, session_id).await?;
    let queue: Vec<QueuedGuest> = serde_json::from_str(&job.queue)
        .map_err(|e| Error::Internal(format!("corrupt guest queue: {}", e)))?;

    let cursor = job.cursor as usize;
    if cursor >= queue.len() {
        sqlx::query("DELETE FROM graph_jobs WHERE session_id = ?")
            .bind(session_id)
            .execute(pool)
            .await?;
        return Ok(Advance::AlreadyComplete);
    }

    let guest = &queue[cursor];
    let chart = render(guest);

    let mut charts: HashMap<String, String> = serde_json::from_str(&job.charts)
        .map_err(|e| Error::Internal(format!("corrupt chart map: {}", e)))?;
    charts.insert(guest.person_id.to_string(), chart.clone());
    let charts_json = serde_json::to_string(&charts)
        .map_err(|e| Error::Internal(format!("failed to serialize chart map: {}", e)))?;

    sqlx::query(
        "UPDATE graph_jobs SET cursor = ?, charts = ?, touched_at = ? WHERE session_id = ?",
    )
    .bind((cursor + 1) as i64)
    .bind(charts_json)
    .bind(Utc::now().to_rfc3339())
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(Advance::Rendered {
        person_id: guest.person_id,
        chart,
        completed: cursor + 1 == queue.len(),
    })
}

/// Fetch one guest's chart if it is rendered already. Does not advance
/// the cursor.
pub async fn peek(pool: &SqlitePool, session_id: &str, person_id: i64) -> Result<Option<String>> {
    let job = load(pool, session_id).await?;
    touch(pool, session_id).await?;

    let charts: HashMap<String, String> = serde_json::from_str(&job.charts)
        .map_err(|e| Error::Internal(format!("corrupt chart map: {}", e)))?;
    Ok(charts.get(&person_id.to_string()).cloned())
}

/// Guest ids whose charts are rendered so far
pub async fn status(pool: &SqlitePool, session_id: &str) -> Result<Vec<i64>> {
    let job = load(pool, session_id).await?;
    touch(pool, session_id).await?;

    let charts: HashMap<String, String> = serde_json::from_str(&job.charts)
        .map_err(|e| Error::Internal(format!("corrupt chart map: {}", e)))?;
    let mut ids: Vec<i64> = charts.keys().filter_map(|k| k.parse().ok()).collect();
    ids.sort_unstable();
    Ok(ids)
}

/// Discard jobs untouched for longer than the retention window
pub async fn sweep(pool: &SqlitePool, retention_minutes: i64) -> Result<()> {
    let cutoff = (Utc::now() - Duration::minutes(retention_minutes)).to_rfc3339();
    let result = sqlx::query("DELETE FROM graph_jobs WHERE touched_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        info!("Swept {} stale graph jobs", result.rows_affected());
    }
    Ok(())
}

async fn load(pool: &SqlitePool, session_id: &str) -> Result<JobRow> {
    let row: Option<(String, i64, String)> = sqlx::query_as(
        "SELECT queue, cursor, charts FROM graph_jobs WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    row.map(|(queue, cursor, charts)| JobRow {
        queue,
        cursor,
        charts,
    })
    .ok_or_else(|| Error::NotFound(format!("unknown graph job: {}", session_id)))
}

async fn touch(pool: &SqlitePool, session_id: &str) -> Result<()> {
    sqlx::query("UPDATE graph_jobs SET touched_at = ? WHERE session_id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}
