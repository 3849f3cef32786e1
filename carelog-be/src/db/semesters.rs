//! Semester lifecycle
//!
//! A semester is created from the date span of the activity records and
//! then adopts every record that predates semester tracking. That
//! adoption is a one-way ratchet: once legacy rows carry a semester id
//! the next creation will not see them, so semesters must be created in
//! the chronological order they represent.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use carelog_common::db::SEMESTER_TABLES;
use carelog_common::{Error, Result};

/// Italian month names for the human-readable semester labels
const MONTH_NAMES: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

#[derive(Debug, Clone, Serialize)]
pub struct Semester {
    pub id: i64,
    pub start: String,
    pub end: String,
}

pub async fn list_semesters(pool: &SqlitePool) -> Result<Vec<Semester>> {
    let rows: Vec<(i64, String, String)> =
        sqlx::query_as("SELECT id, iniziale, finale FROM semestre")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, start, end)| Semester { id, start, end })
        .collect())
}

/// Create a new semester spanning the recorded activity dates and attach
/// all still-unassigned records to it.
///
/// The span scan, the insert, the backfill of every table in
/// [`SEMESTER_TABLES`], and the aggregate rebuild run in one transaction;
/// a failure part-way leaves nothing attached.
pub async fn create_semester(pool: &SqlitePool) -> Result<Semester> {
    let mut tx = pool.begin().await?;

    // The activity table is the canonical date range
    let earliest: Option<(i64, i64, i64)> = sqlx::query_as(
        "SELECT giorno, mese_int, anno FROM partecipazione_attivita
         ORDER BY anno ASC, mese_int ASC, giorno ASC LIMIT 1",
    )
    .fetch_optional(&mut *tx)
    .await?;
    let latest: Option<(i64, i64, i64)> = sqlx::query_as(
        "SELECT giorno, mese_int, anno FROM partecipazione_attivita
         ORDER BY anno DESC, mese_int DESC, giorno DESC LIMIT 1",
    )
    .fetch_optional(&mut *tx)
    .await?;

    let (Some(first), Some(last)) = (earliest, latest) else {
        return Err(Error::EmptyRange(
            "no activity records to bound a semester".to_string(),
        ));
    };

    let iniziale = month_label(first.1, first.2);
    let finale = month_label(last.1, last.2);

    let result = sqlx::query("INSERT INTO semestre (iniziale, finale) VALUES (?, ?)")
        .bind(&iniziale)
        .bind(&finale)
        .execute(&mut *tx)
        .await?;
    let semester_id = result.last_insert_rowid();

    let mut attached = 0u64;
    for table in SEMESTER_TABLES {
        let sql = format!("UPDATE {} SET id_semestre = ? WHERE id_semestre IS NULL", table);
        let result = sqlx::query(&sql).bind(semester_id).execute(&mut *tx).await?;
        attached += result.rows_affected();
    }

    // Rebuild the monthly summary so aggregate rows carry the same
    // semester attribution as their source records
    sqlx::query("DELETE FROM grad").execute(&mut *tx).await?;
    sqlx::query(
        "INSERT INTO grad
         (id_persona, attivita, mese, id_semestre, mediaAdesione, mediaPartecipazione, nVolte)
         SELECT id_persona, attivita, mese_int, id_semestre,
                AVG(adesione) / 4.0 * 100.0,
                AVG(partecipazione) / 4.0 * 100.0,
                COUNT(*)
         FROM partecipazione_attivita
         WHERE attivita IS NOT NULL
         GROUP BY id_persona, attivita, mese_int, id_semestre",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(
        "Created semester {} ({} - {}), attached {} legacy rows",
        semester_id, iniziale, finale, attached
    );

    Ok(Semester {
        id: semester_id,
        start: iniziale,
        end: finale,
    })
}

fn month_label(month: i64, year: i64) -> String {
    let name = MONTH_NAMES
        .get((month - 1).clamp(0, 11) as usize)
        .copied()
        .unwrap_or("?");
    format!("{} {}", name, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_common::db::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
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

    async fn insert_visit(pool: &SqlitePool, g: i64, m: i64, a: i64) {
        sqlx::query(
            "INSERT INTO partecipazione_attivita
             (id_persona, giorno, mese_int, anno, mattino, attivita, adesione, partecipazione, id_semestre)
             VALUES (1, ?, ?, ?, 1, 1, 3, 3, NULL)",
        )
        .bind(g)
        .bind(m)
        .bind(a)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn creation_fails_without_activity_records() {
        let pool = test_pool().await;
        let result = create_semester(&pool).await;
        assert!(matches!(result, Err(Error::EmptyRange(_))));
    }

    #[tokio::test]
    async fn creation_labels_span_and_backfills_every_table() {
        let pool = test_pool().await;
        insert_visit(&pool, 5, 1, 2024).await;
        insert_visit(&pool, 20, 6, 2024).await;

        // legacy rows in other dated tables
        sqlx::query(
            "INSERT INTO peso (id_persona, giorno, mese_int, anno, peso, id_semestre)
             VALUES (1, 7, 2, 2024, 68.5, NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO diario (id_persona, giorno, mese_int, anno, evento, id_semestre)
             VALUES (1, 8, 2, 2024, 'nota', NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let semester = create_semester(&pool).await.unwrap();
        assert_eq!(semester.start, "Gennaio 2024");
        assert_eq!(semester.end, "Giugno 2024");

        for table in ["partecipazione_attivita", "peso", "diario"] {
            let unassigned: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE id_semestre IS NULL",
                table
            ))
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(unassigned, 0, "table {} still has legacy rows", table);
        }

        // the rebuilt aggregate carries the new semester id
        let grad_semesters: Vec<(Option<i64>,)> =
            sqlx::query_as("SELECT DISTINCT id_semestre FROM grad")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(grad_semesters, vec![(Some(semester.id),)]);
    }

    #[tokio::test]
    async fn second_run_attaches_nothing() {
        let pool = test_pool().await;
        insert_visit(&pool, 5, 1, 2024).await;
        insert_visit(&pool, 20, 6, 2024).await;

        let first = create_semester(&pool).await.unwrap();
        let second = create_semester(&pool).await.unwrap();
        assert_ne!(first.id, second.id);

        // all rows stayed with the first semester
        let counts: Vec<(Option<i64>, i64)> = sqlx::query_as(
            "SELECT id_semestre, COUNT(*) FROM partecipazione_attivita GROUP BY id_semestre",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(counts, vec![(Some(first.id), 2)]);

        let listed = list_semesters(&pool).await.unwrap();
        assert_eq!(listed.len(), 2);
    }
}
