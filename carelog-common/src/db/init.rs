//! Database initialization
//!
//! Creates the connection pool and the full schema on first run. Every
//! `CREATE TABLE IF NOT EXISTS` is idempotent, so calling this on an
//! existing database is safe.
//!
//! Dated tables all share the same backbone: a guest reference
//! (`id_persona`), the denormalized date triple (`giorno`, `mese_int`,
//! `anno`), a nullable `id_semestre`, and type-specific payload columns.
//! Listings rely on the triple for ordering, never on insertion order.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table if missing. Also used directly by tests running
/// against in-memory pools.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_account_table(pool).await?;
    create_persona_table(pool).await?;
    create_semestre_table(pool).await?;
    create_sessioni_table(pool).await?;
    create_attivita_table(pool).await?;
    create_partecipazione_attivita_table(pool).await?;
    create_grad_table(pool).await?;

    // Simple dated-record tables
    create_bagno_table(pool).await?;
    create_idratazione_table(pool).await?;
    create_doccia_table(pool).await?;
    create_peso_table(pool).await?;
    create_pressione_table(pool).await?;
    create_crisi_epilettica_table(pool).await?;
    create_diario_table(pool).await?;
    create_attivita_mirata_table(pool).await?;

    // Problem behaviors and their catalog
    create_problema_table(pool).await?;
    create_comportamento_problema_table(pool).await?;
    create_evento_comportamento_table(pool).await?;

    // Polled chart-rendering jobs
    create_graph_jobs_table(pool).await?;

    Ok(())
}

async fn create_account_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome TEXT NOT NULL,
            cognome TEXT NOT NULL,
            password TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Server-side operator sessions
///
/// The session row carries the semester selection so every worker process
/// sees the same view; the cookie holds only the token.
async fn create_sessioni_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessioni (
            token TEXT PRIMARY KEY,
            id_account INTEGER NOT NULL REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id),
            scadenza TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_persona_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persona (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome TEXT NOT NULL,
            cognome TEXT NOT NULL,
            visibile INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_semestre_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS semestre (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            iniziale TEXT NOT NULL,
            finale TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attivita_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attivita (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome_attivita TEXT NOT NULL,
            abbreviazione TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Activity participation visits, two per weekday per guest when fully
/// attended (morning and afternoon). An absence is a row with null
/// `attivita` and null scores.
async fn create_partecipazione_attivita_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS partecipazione_attivita (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            mattino INTEGER NOT NULL DEFAULT 0,
            attivita INTEGER REFERENCES attivita(id),
            adesione INTEGER,
            partecipazione INTEGER,
            umore INTEGER,
            comunicazione INTEGER,
            comportamento_problematico INTEGER NOT NULL DEFAULT 0,
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_partecipazione_persona_data
         ON partecipazione_attivita(id_persona, anno, mese_int, giorno)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_partecipazione_semestre
         ON partecipazione_attivita(id_semestre)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Materialized per-month appreciation summary
///
/// One row per (guest, activity, month, semester): mean adherence and
/// participation already normalized to 0-100 percentages, plus the visit
/// count. Maintained by the activity DAO on every write.
async fn create_grad_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grad (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            attivita INTEGER NOT NULL REFERENCES attivita(id),
            mese INTEGER NOT NULL,
            id_semestre INTEGER REFERENCES semestre(id),
            mediaAdesione REAL NOT NULL,
            mediaPartecipazione REAL NOT NULL,
            nVolte INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_grad_persona_attivita
         ON grad(id_persona, attivita, mese)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bagno_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bagno (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            mattino INTEGER NOT NULL DEFAULT 0,
            urine INTEGER NOT NULL DEFAULT 0,
            feci INTEGER NOT NULL DEFAULT 0,
            panno TEXT,
            rossore INTEGER NOT NULL DEFAULT 0,
            ciclo INTEGER NOT NULL DEFAULT 0,
            cintura INTEGER NOT NULL DEFAULT 0,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_idratazione_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS idratazione (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            fatto INTEGER NOT NULL DEFAULT 0,
            note TEXT,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_doccia_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doccia (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            fatto INTEGER NOT NULL DEFAULT 0,
            note TEXT,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_peso_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS peso (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            peso REAL NOT NULL,
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_pressione_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pressione (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            minima INTEGER NOT NULL,
            massima INTEGER NOT NULL,
            temperatura REAL NOT NULL,
            battito INTEGER NOT NULL,
            saturazione INTEGER NOT NULL,
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_crisi_epilettica_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS crisi_epilettica (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            ora TEXT,
            durata TEXT,
            note TEXT,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_diario_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS diario (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            evento TEXT NOT NULL,
            intervento TEXT,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attivita_mirata_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attivita_mirata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            evento TEXT NOT NULL,
            intervento TEXT NOT NULL,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Problem-type catalog, each entry tagged with a class
async fn create_problema_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS problema (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome TEXT NOT NULL,
            classe TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_comportamento_problema_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comportamento_problema (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_persona INTEGER NOT NULL REFERENCES persona(id),
            giorno INTEGER NOT NULL,
            mese_int INTEGER NOT NULL,
            anno INTEGER NOT NULL,
            intensita TEXT,
            durata TEXT,
            causa TEXT,
            contenimento TEXT,
            firma INTEGER REFERENCES account(id),
            id_semestre INTEGER REFERENCES semestre(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Which problem types applied to a recorded incident
///
/// `id_evento` references the incident row, `id_comportamento` the catalog
/// entry (names carried over from the store this schema replicates).
async fn create_evento_comportamento_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evento_comportamento (
            id_evento INTEGER NOT NULL REFERENCES comportamento_problema(id) ON DELETE CASCADE,
            id_comportamento INTEGER NOT NULL REFERENCES problema(id),
            PRIMARY KEY (id_evento, id_comportamento)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Polled chart-rendering job state
///
/// Shared across worker processes; the guest queue and the rendered-chart
/// map are JSON text columns.
async fn create_graph_jobs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS graph_jobs (
            session_id TEXT PRIMARY KEY,
            queue TEXT NOT NULL,
            cursor INTEGER NOT NULL DEFAULT 0,
            charts TEXT NOT NULL,
            touched_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
