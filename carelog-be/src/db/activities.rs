//! Activity participation and the appreciation engine
//!
//! Participation rows are the canonical dated records of the system: two
//! per weekday per fully attended guest (morning and afternoon), each
//! scoring adherence and participation on the 1-4 scale. The `grad` table
//! is the materialized per-month summary of those scores, normalized to
//! 0-100 percentages; this module owns both sides and keeps them
//! consistent on every write.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};

use carelog_common::{DateKey, Result, SemesterFilter};

use super::records::yes_flag;

/// One listed participation visit
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub morning: i64,
    /// Null for absence rows
    pub activity: Option<String>,
    pub adesion: Option<i64>,
    pub participation: Option<i64>,
    pub mood: Option<i64>,
    pub communication: Option<i64>,
    pub problem_behaviour: i64,
    pub activity_id: Option<i64>,
}

/// Submission for a new participation visit
#[derive(Debug, Deserialize)]
pub struct NewActivityEntry {
    pub person_id: i64,
    pub date: String,
    /// `yes` for the morning visit, anything else for the afternoon
    pub morning: String,
    pub activity: i64,
    pub adesion: i64,
    pub participation: i64,
    pub mood: i64,
    pub communication: i64,
    #[serde(default)]
    pub problem_behaviour: bool,
}

/// Reference activity
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: i64,
    pub nome_attivita: String,
    pub abbreviazione: String,
}

/// One appreciation row: a (guest, activity) pair over a month or a
/// whole semester
#[derive(Debug, Clone, Serialize)]
pub struct AppreciationRow {
    pub id_persona: i64,
    pub attivita: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mese: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_semestre: Option<i64>,
    pub media_adesione: i64,
    pub media_partecipazione: i64,
    pub n_volte: i64,
    pub abbreviazione: String,
}

/// A guest's appreciation rows, ordered by activity abbreviation
#[derive(Debug, Clone, Serialize)]
pub struct GuestAppreciations {
    pub id_persona: i64,
    pub nome: String,
    pub cognome: String,
    pub activities: Vec<AppreciationRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppreciationsOutput {
    pub appreciations: Vec<GuestAppreciations>,
    pub activities: Vec<Activity>,
}

/// List one guest's participation visits, optionally restricted to a month
pub async fn list_activities(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
    month: Option<i64>,
) -> Result<Vec<ActivityEntry>> {
    let month_constraint = if month.is_some() {
        " AND pa.mese_int = ?"
    } else {
        ""
    };
    let sql = format!(
        "SELECT
            pa.id,
            pa.id_persona,
            pa.giorno,
            pa.mese_int,
            pa.anno,
            pa.mattino,
            a.nome_attivita,
            pa.adesione,
            pa.partecipazione,
            pa.umore,
            pa.comunicazione,
            pa.comportamento_problematico,
            a.id AS attivita_id
        FROM partecipazione_attivita pa
        LEFT JOIN attivita a ON pa.attivita = a.id
        WHERE pa.id_persona = ? AND pa.id_semestre {}{}
        ORDER BY pa.anno DESC, pa.mese_int DESC, pa.giorno DESC",
        filter.predicate(),
        month_constraint
    );

    let mut query = sqlx::query(&sql).bind(person_id);
    if let Some(id) = filter.bind() {
        query = query.bind(id);
    }
    if let Some(m) = month {
        query = query.bind(m);
    }

    let rows = query.fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let key = DateKey {
                giorno: row.get("giorno"),
                mese: row.get("mese_int"),
                anno: row.get("anno"),
            };
            ActivityEntry {
                id: row.get("id"),
                person_id: row.get("id_persona"),
                date: key.format(),
                morning: row.get("mattino"),
                activity: row.get("nome_attivita"),
                adesion: row.get("adesione"),
                participation: row.get("partecipazione"),
                mood: row.get("umore"),
                communication: row.get("comunicazione"),
                problem_behaviour: row.get("comportamento_problematico"),
                activity_id: row.get("attivita_id"),
            }
        })
        .collect())
}

/// Record a participation visit and refresh its aggregate bucket.
///
/// New rows always start with no semester; they are attached to one by
/// the next semester creation.
pub async fn create_activity_entry(pool: &SqlitePool, entry: &NewActivityEntry) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO partecipazione_attivita
         (id_persona, giorno, mese_int, anno, mattino, attivita, adesione,
          partecipazione, umore, comunicazione, comportamento_problematico, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(yes_flag(&entry.morning))
    .bind(entry.activity)
    .bind(entry.adesion)
    .bind(entry.participation)
    .bind(entry.mood)
    .bind(entry.communication)
    .bind(i64::from(entry.problem_behaviour))
    .execute(&mut *tx)
    .await?;

    refresh_month_aggregate(&mut *tx, entry.person_id, entry.activity, date.mese, None).await?;

    tx.commit().await?;
    Ok(())
}

/// Delete a participation visit and refresh its aggregate bucket.
///
/// Deleting an id that is already gone succeeds silently.
pub async fn delete_activity(pool: &SqlitePool, id: i64) -> Result<()> {
    let row: Option<(i64, Option<i64>, i64, Option<i64>)> = sqlx::query_as(
        "SELECT id_persona, attivita, mese_int, id_semestre
         FROM partecipazione_attivita WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some((person_id, activity, month, semester)) = row else {
        return Ok(());
    };

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM partecipazione_attivita WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if let Some(activity) = activity {
        refresh_month_aggregate(&mut *tx, person_id, activity, month, semester).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Declare a full-day absence: the morning and afternoon sibling rows are
/// inserted together, with no activity and no scores, in one transaction.
pub async fn declare_absence(pool: &SqlitePool, person_id: i64, date: &str) -> Result<()> {
    let date = DateKey::parse(date)?;
    let mut tx = pool.begin().await?;

    for mattino in [0i64, 1] {
        sqlx::query(
            "INSERT INTO partecipazione_attivita
             (id_persona, giorno, mese_int, anno, mattino, attivita, id_semestre)
             VALUES (?, ?, ?, ?, ?, NULL, NULL)",
        )
        .bind(person_id)
        .bind(date.giorno)
        .bind(date.mese)
        .bind(date.anno)
        .bind(mattino)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Recompute one (guest, activity, month, semester) bucket of `grad` from
/// its source rows. Scores are normalized from the 1-4 scale to 0-100
/// percentages here; absence rows carry no activity and never reach a
/// bucket.
pub async fn refresh_month_aggregate(
    conn: &mut SqliteConnection,
    person_id: i64,
    activity: i64,
    month: i64,
    semester: Option<i64>,
) -> Result<()> {
    let filter = SemesterFilter(semester);

    let sql = format!(
        "SELECT AVG(adesione) AS avg_adesione,
                AVG(partecipazione) AS avg_partecipazione,
                COUNT(*) AS n
         FROM partecipazione_attivita
         WHERE id_persona = ? AND attivita = ? AND mese_int = ? AND id_semestre {}",
        filter.predicate()
    );
    let mut query = sqlx::query(&sql).bind(person_id).bind(activity).bind(month);
    if let Some(id) = filter.bind() {
        query = query.bind(id);
    }
    let row = query.fetch_one(&mut *conn).await?;
    let n: i64 = row.get("n");

    let delete_sql = format!(
        "DELETE FROM grad WHERE id_persona = ? AND attivita = ? AND mese = ? AND id_semestre {}",
        filter.predicate()
    );
    let mut delete = sqlx::query(&delete_sql).bind(person_id).bind(activity).bind(month);
    if let Some(id) = filter.bind() {
        delete = delete.bind(id);
    }
    delete.execute(&mut *conn).await?;

    if n == 0 {
        return Ok(());
    }

    let avg_adesione: f64 = row.get::<Option<f64>, _>("avg_adesione").unwrap_or(0.0);
    let avg_partecipazione: f64 = row.get::<Option<f64>, _>("avg_partecipazione").unwrap_or(0.0);

    sqlx::query(
        "INSERT INTO grad
         (id_persona, attivita, mese, id_semestre, mediaAdesione, mediaPartecipazione, nVolte)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(person_id)
    .bind(activity)
    .bind(month)
    .bind(semester)
    .bind(avg_adesione / 4.0 * 100.0)
    .bind(avg_partecipazione / 4.0 * 100.0)
    .bind(n)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Appreciation views over the materialized monthly summary.
///
/// With a month: the stored monthly means, truncated to integers.
/// Without: one row per (guest, activity) averaging the monthly
/// percentage means and summing the visit counts — the average of
/// monthly averages, not a flat visit-weighted average, so months with
/// few visits weigh as much as busy ones.
pub async fn get_appreciations(
    pool: &SqlitePool,
    filter: SemesterFilter,
    month: Option<i64>,
    rotate: bool,
) -> Result<AppreciationsOutput> {
    let sql = match month {
        Some(_) => format!(
            "SELECT
                p.nome,
                p.cognome,
                g.id_persona,
                g.attivita,
                g.mese,
                g.id_semestre,
                g.mediaAdesione AS adesione,
                g.mediaPartecipazione AS partecipazione,
                g.nVolte AS n_volte,
                a.abbreviazione
            FROM grad g
            JOIN attivita a ON g.attivita = a.id
            JOIN persona p ON g.id_persona = p.id
            WHERE g.id_semestre {} AND g.mese = ?
            ORDER BY g.id_persona, a.abbreviazione, g.mese",
            filter.predicate()
        ),
        None => format!(
            "SELECT
                p.nome,
                p.cognome,
                g.id_persona,
                g.attivita,
                AVG(g.mediaAdesione) AS adesione,
                AVG(g.mediaPartecipazione) AS partecipazione,
                SUM(g.nVolte) AS n_volte,
                a.abbreviazione
            FROM grad g
            JOIN attivita a ON g.attivita = a.id
            JOIN persona p ON g.id_persona = p.id
            WHERE g.id_semestre {}
            GROUP BY g.id_persona, g.attivita, a.abbreviazione, p.nome, p.cognome
            ORDER BY g.id_persona, a.abbreviazione",
            filter.predicate()
        ),
    };

    let mut query = sqlx::query(&sql);
    if let Some(id) = filter.bind() {
        query = query.bind(id);
    }
    if let Some(m) = month {
        query = query.bind(m);
    }
    let rows = query.fetch_all(pool).await?;

    let mut appreciations: Vec<GuestAppreciations> = Vec::new();
    for row in &rows {
        let person_id: i64 = row.get("id_persona");
        let entry = match month {
            Some(_) => AppreciationRow {
                id_persona: person_id,
                attivita: row.get("attivita"),
                mese: Some(row.get("mese")),
                id_semestre: row.get("id_semestre"),
                // stored monthly means are reported truncated
                media_adesione: row.get::<f64, _>("adesione") as i64,
                media_partecipazione: row.get::<f64, _>("partecipazione") as i64,
                n_volte: row.get("n_volte"),
                abbreviazione: row.get("abbreviazione"),
            },
            None => AppreciationRow {
                id_persona: person_id,
                attivita: row.get("attivita"),
                mese: None,
                id_semestre: None,
                // averages of monthly means are reported rounded
                media_adesione: row.get::<f64, _>("adesione").round() as i64,
                media_partecipazione: row.get::<f64, _>("partecipazione").round() as i64,
                n_volte: row.get("n_volte"),
                abbreviazione: row.get("abbreviazione"),
            },
        };

        match appreciations.last_mut() {
            Some(guest) if guest.id_persona == person_id => guest.activities.push(entry),
            _ => appreciations.push(GuestAppreciations {
                id_persona: person_id,
                nome: row.get("nome"),
                cognome: row.get("cognome"),
                activities: vec![entry],
            }),
        }
    }

    let activities = activities_list(pool, rotate).await?;

    Ok(AppreciationsOutput {
        appreciations,
        activities,
    })
}

/// The activity reference list, ordered by abbreviation.
///
/// `rotate` applies the historical reordering where the first entry moves
/// to the end. Consumers index into this list positionally, so the
/// rotation is part of the external contract until they stop.
pub async fn activities_list(pool: &SqlitePool, rotate: bool) -> Result<Vec<Activity>> {
    let rows: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT id, nome_attivita, abbreviazione FROM attivita ORDER BY abbreviazione",
    )
    .fetch_all(pool)
    .await?;

    let mut activities: Vec<Activity> = rows
        .into_iter()
        .map(|(id, nome_attivita, abbreviazione)| Activity {
            id,
            nome_attivita,
            abbreviazione,
        })
        .collect();

    if rotate {
        rotate_first_to_last(&mut activities);
    }

    Ok(activities)
}

/// Move the first entry to the end, leaving the rest in place
fn rotate_first_to_last(activities: &mut Vec<Activity>) {
    if !activities.is_empty() {
        let first = activities.remove(0);
        activities.push(first);
    }
}
