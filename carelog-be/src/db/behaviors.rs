//! Problem behaviors and their catalog
//!
//! Incidents are dated records with free-text detail; the catalog is a
//! reference list of problem types grouped by class, linked many-to-many
//! to incidents. Listings return the incident rows with a problem-status
//! vector aligned positionally to the flat catalog order, plus the
//! catalog grouped by class for the form.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use carelog_common::{DateKey, Result, SemesterFilter};

#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub id: i64,
    pub nome: String,
    pub classe: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BehaviorEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub intensity: Option<String>,
    pub duration: Option<String>,
    pub cause: Option<String>,
    pub containment: Option<String>,
    pub signature: Option<i64>,
    /// 1/0 per catalog entry, in `classe, nome` order
    pub problem_statuses: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BehaviorsOutput {
    pub behaviors: Vec<BehaviorEntry>,
    pub problems: BTreeMap<String, Vec<Problem>>,
}

#[derive(Debug, Deserialize)]
pub struct NewBehaviorEntry {
    pub person_id: i64,
    pub date: String,
    pub intensity: Option<String>,
    pub duration: Option<String>,
    pub cause: Option<String>,
    pub containment: Option<String>,
    /// Catalog ids of the problem types that applied
    #[serde(default)]
    pub problems: Vec<i64>,
}

/// The full catalog in `classe, nome` order
async fn catalog(pool: &SqlitePool) -> Result<Vec<Problem>> {
    let rows: Vec<(i64, String, String)> =
        sqlx::query_as("SELECT id, nome, classe FROM problema ORDER BY classe, nome")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, nome, classe)| Problem { id, nome, classe })
        .collect())
}

/// One guest's incidents with the catalog attached
pub async fn list_behaviors(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<BehaviorsOutput> {
    let problems = catalog(pool).await?;

    let sql = format!(
        "SELECT id, id_persona, giorno, mese_int, anno, intensita, durata,
                causa, contenimento, firma
         FROM comportamento_problema
         WHERE id_persona = ? AND id_semestre {}
         ORDER BY anno DESC, mese_int DESC, giorno DESC",
        filter.predicate()
    );
    let mut query = sqlx::query(&sql).bind(person_id);
    if let Some(id) = filter.bind() {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;

    // which problem types applied to each listed incident
    let mut applied: HashMap<i64, HashSet<i64>> = HashMap::new();
    if !rows.is_empty() {
        let ids: Vec<String> = rows
            .iter()
            .map(|row| row.get::<i64, _>("id").to_string())
            .collect();
        let link_sql = format!(
            "SELECT id_evento, id_comportamento FROM evento_comportamento
             WHERE id_evento IN ({})",
            ids.join(",")
        );
        let links: Vec<(i64, i64)> = sqlx::query_as(&link_sql).fetch_all(pool).await?;
        for (incident, problem) in links {
            applied.entry(incident).or_default().insert(problem);
        }
    }

    let behaviors = rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            let empty = HashSet::new();
            let incident_problems = applied.get(&id).unwrap_or(&empty);
            let problem_statuses = problems
                .iter()
                .map(|p| i64::from(incident_problems.contains(&p.id)))
                .collect();

            BehaviorEntry {
                id,
                person_id: row.get("id_persona"),
                date: DateKey {
                    giorno: row.get("giorno"),
                    mese: row.get("mese_int"),
                    anno: row.get("anno"),
                }
                .format(),
                intensity: row.get("intensita"),
                duration: row.get("durata"),
                cause: row.get("causa"),
                containment: row.get("contenimento"),
                signature: row.get("firma"),
                problem_statuses,
            }
        })
        .collect();

    let mut grouped: BTreeMap<String, Vec<Problem>> = BTreeMap::new();
    for problem in problems {
        grouped.entry(problem.classe.clone()).or_default().push(problem);
    }

    Ok(BehaviorsOutput {
        behaviors,
        problems: grouped,
    })
}

/// Record an incident and its problem-type links in one transaction
pub async fn create_behavior(
    pool: &SqlitePool,
    entry: &NewBehaviorEntry,
    signer: i64,
) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO comportamento_problema
         (id_persona, giorno, mese_int, anno, intensita, durata, causa,
          contenimento, firma, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(&entry.intensity)
    .bind(&entry.duration)
    .bind(&entry.cause)
    .bind(&entry.containment)
    .bind(signer)
    .execute(&mut *tx)
    .await?;
    let incident_id = result.last_insert_rowid();

    for problem_id in &entry.problems {
        sqlx::query(
            "INSERT INTO evento_comportamento (id_evento, id_comportamento) VALUES (?, ?)",
        )
        .bind(incident_id)
        .bind(problem_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Delete an incident and its links
pub async fn delete_behavior(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM evento_comportamento WHERE id_evento = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comportamento_problema WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
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
        sqlx::query("INSERT INTO account (nome, cognome, password) VALUES ('Mario', 'Rossi', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO persona (nome, cognome) VALUES ('Anna', 'Bianchi')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO problema (nome, classe) VALUES
             ('urla', 'verbale'), ('spinte', 'fisico'), ('morsi', 'fisico')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn statuses_align_with_catalog_order() {
        let pool = test_pool().await;

        // catalog order is classe, nome: morsi(3), spinte(2), urla(1)
        let entry = NewBehaviorEntry {
            person_id: 1,
            date: "2024-03-05".to_string(),
            intensity: Some("alta".to_string()),
            duration: Some("5 min".to_string()),
            cause: None,
            containment: None,
            problems: vec![1, 2],
        };
        create_behavior(&pool, &entry, 1).await.unwrap();

        let output = list_behaviors(&pool, 1, SemesterFilter::none()).await.unwrap();
        assert_eq!(output.behaviors.len(), 1);
        assert_eq!(output.behaviors[0].problem_statuses, vec![0, 1, 1]);

        assert_eq!(output.problems["fisico"].len(), 2);
        assert_eq!(output.problems["verbale"].len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_links_too() {
        let pool = test_pool().await;
        let entry = NewBehaviorEntry {
            person_id: 1,
            date: "2024-03-05".to_string(),
            intensity: None,
            duration: None,
            cause: None,
            containment: None,
            problems: vec![1],
        };
        create_behavior(&pool, &entry, 1).await.unwrap();
        delete_behavior(&pool, 1).await.unwrap();

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evento_comportamento")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }
}
