//! Per-entity instantiations of the dated-record shape
//!
//! Each entity family is its row type, its [`RecordKind`], and thin
//! create/list/delete wrappers over the shared repository. The kinds
//! encode the per-entity quirks the views depend on: toilet days list
//! morning before afternoon, the logbook ignores the semester filter,
//! and most listings degrade to an empty table on store failure.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use carelog_common::{DateKey, Result, SemesterFilter};

use super::records::{checkbox_flag, delete_row, list_rows, yes_flag, OnListFailure, RecordKind};

fn date_of(row: &SqliteRow) -> String {
    DateKey {
        giorno: row.get("giorno"),
        mese: row.get("mese_int"),
        anno: row.get("anno"),
    }
    .format()
}

fn signature_of(row: &SqliteRow) -> String {
    format!(
        "{} {}",
        row.get::<String, _>("firma_nome"),
        row.get::<String, _>("firma_cognome")
    )
}

// ========================================
// Toilet (bagno)
// ========================================

pub const TOILET: RecordKind = RecordKind {
    table: "bagno",
    // within one day the morning flag sorts ascending
    tiebreak: ", t.mattino ASC",
    signer_join: true,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct ToiletEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub morning: i64,
    pub urine: i64,
    pub feces: i64,
    pub diaper: Option<String>,
    pub redness: i64,
    pub period: i64,
    pub belt: i64,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct NewToiletEntry {
    pub person_id: i64,
    pub date: String,
    pub morning: String,
    pub urine: String,
    pub feces: String,
    /// Diaper size as submitted; `2` is the no-diaper sentinel
    pub diaper: String,
    pub redness: Option<String>,
    pub period: Option<String>,
    pub belt: Option<String>,
}

pub async fn list_toilet(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<ToiletEntry>> {
    list_rows(pool, &TOILET, person_id, filter, |row| ToiletEntry {
        id: row.get("id"),
        person_id: row.get("id_persona"),
        date: date_of(row),
        morning: row.get("mattino"),
        urine: row.get("urine"),
        feces: row.get("feci"),
        diaper: row.get("panno"),
        redness: row.get("rossore"),
        period: row.get("ciclo"),
        belt: row.get("cintura"),
        signature: signature_of(row),
    })
    .await
}

pub async fn create_toilet(pool: &SqlitePool, entry: &NewToiletEntry, signer: i64) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    let diaper = if entry.diaper == "2" {
        None
    } else {
        Some(entry.diaper.clone())
    };

    sqlx::query(
        "INSERT INTO bagno
         (id_persona, giorno, mese_int, anno, mattino, urine, feci, panno,
          rossore, ciclo, cintura, firma, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(yes_flag(&entry.morning))
    .bind(yes_flag(&entry.urine))
    .bind(yes_flag(&entry.feces))
    .bind(diaper)
    .bind(checkbox_flag(entry.redness.as_deref()))
    .bind(checkbox_flag(entry.period.as_deref()))
    .bind(checkbox_flag(entry.belt.as_deref()))
    .bind(signer)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_toilet(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &TOILET, id).await
}

// ========================================
// Hydration (idratazione) and shower (doccia)
// ========================================

pub const HYDRATION: RecordKind = RecordKind {
    table: "idratazione",
    tiebreak: "",
    signer_join: true,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

pub const SHOWER: RecordKind = RecordKind {
    table: "doccia",
    tiebreak: "",
    signer_join: true,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct CareTaskEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub done: i64,
    pub notes: Option<String>,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct NewCareTaskEntry {
    pub person_id: i64,
    pub date: String,
    pub done: Option<String>,
    pub notes: Option<String>,
}

async fn list_care_task(
    pool: &SqlitePool,
    kind: &RecordKind,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<CareTaskEntry>> {
    list_rows(pool, kind, person_id, filter, |row| CareTaskEntry {
        id: row.get("id"),
        person_id: row.get("id_persona"),
        date: date_of(row),
        done: row.get("fatto"),
        notes: row.get("note"),
        signature: signature_of(row),
    })
    .await
}

async fn create_care_task(
    pool: &SqlitePool,
    kind: &RecordKind,
    entry: &NewCareTaskEntry,
    signer: i64,
) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    let sql = format!(
        "INSERT INTO {}
         (id_persona, giorno, mese_int, anno, fatto, note, firma, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
        kind.table
    );
    sqlx::query(&sql)
        .bind(entry.person_id)
        .bind(date.giorno)
        .bind(date.mese)
        .bind(date.anno)
        .bind(checkbox_flag(entry.done.as_deref()))
        .bind(&entry.notes)
        .bind(signer)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_hydration(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<CareTaskEntry>> {
    list_care_task(pool, &HYDRATION, person_id, filter).await
}

pub async fn create_hydration(
    pool: &SqlitePool,
    entry: &NewCareTaskEntry,
    signer: i64,
) -> Result<()> {
    create_care_task(pool, &HYDRATION, entry, signer).await
}

pub async fn delete_hydration(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &HYDRATION, id).await
}

pub async fn list_shower(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<CareTaskEntry>> {
    list_care_task(pool, &SHOWER, person_id, filter).await
}

pub async fn create_shower(pool: &SqlitePool, entry: &NewCareTaskEntry, signer: i64) -> Result<()> {
    create_care_task(pool, &SHOWER, entry, signer).await
}

pub async fn delete_shower(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &SHOWER, id).await
}

// ========================================
// Weight (peso)
// ========================================

pub const WEIGHT: RecordKind = RecordKind {
    table: "peso",
    tiebreak: "",
    signer_join: false,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct WeightEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewWeightEntry {
    pub person_id: i64,
    pub date: String,
    pub value: f64,
}

pub async fn list_weights(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<WeightEntry>> {
    list_rows(pool, &WEIGHT, person_id, filter, |row| WeightEntry {
        id: row.get("id"),
        person_id: row.get("id_persona"),
        date: date_of(row),
        weight: row.get("peso"),
    })
    .await
}

pub async fn create_weight(pool: &SqlitePool, entry: &NewWeightEntry) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    sqlx::query(
        "INSERT INTO peso (id_persona, giorno, mese_int, anno, peso, id_semestre)
         VALUES (?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(entry.value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_weight(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &WEIGHT, id).await
}

// ========================================
// Vital parameters (pressione)
// ========================================

pub const VITALS: RecordKind = RecordKind {
    table: "pressione",
    tiebreak: "",
    signer_join: false,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct VitalEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub min_pressure: i64,
    pub max_pressure: i64,
    pub temperature: f64,
    pub heart_rate: i64,
    pub saturation: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewVitalEntry {
    pub person_id: i64,
    pub date: String,
    pub min_pressure: i64,
    pub max_pressure: i64,
    pub temperature: f64,
    pub heart_rate: i64,
    pub saturation: i64,
}

pub async fn list_vitals(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<VitalEntry>> {
    list_rows(pool, &VITALS, person_id, filter, |row| VitalEntry {
        id: row.get("id"),
        person_id: row.get("id_persona"),
        date: date_of(row),
        min_pressure: row.get("minima"),
        max_pressure: row.get("massima"),
        temperature: row.get("temperatura"),
        heart_rate: row.get("battito"),
        saturation: row.get("saturazione"),
    })
    .await
}

pub async fn create_vital(pool: &SqlitePool, entry: &NewVitalEntry) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    sqlx::query(
        "INSERT INTO pressione
         (id_persona, giorno, mese_int, anno, minima, massima, temperatura,
          battito, saturazione, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(entry.min_pressure)
    .bind(entry.max_pressure)
    .bind(entry.temperature)
    .bind(entry.heart_rate)
    .bind(entry.saturation)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_vital(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &VITALS, id).await
}

// ========================================
// Epileptic seizures (crisi_epilettica)
// ========================================

pub const SEIZURES: RecordKind = RecordKind {
    table: "crisi_epilettica",
    tiebreak: "",
    signer_join: true,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct SeizureEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    /// `HH:MM`, seconds trimmed off the stored value
    pub time: Option<String>,
    pub duration: Option<String>,
    pub notes: Option<String>,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct NewSeizureEntry {
    pub person_id: i64,
    pub date: String,
    pub time: String,
    pub duration: String,
    pub notes: Option<String>,
}

pub async fn list_seizures(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<SeizureEntry>> {
    list_rows(pool, &SEIZURES, person_id, filter, |row| {
        let time: Option<String> = row.get("ora");
        SeizureEntry {
            id: row.get("id"),
            person_id: row.get("id_persona"),
            date: date_of(row),
            time: time.map(|t| if t.len() >= 3 { t[..t.len() - 3].to_string() } else { t }),
            duration: row.get("durata"),
            notes: row.get("note"),
            signature: signature_of(row),
        }
    })
    .await
}

pub async fn create_seizure(pool: &SqlitePool, entry: &NewSeizureEntry, signer: i64) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    sqlx::query(
        "INSERT INTO crisi_epilettica
         (id_persona, giorno, mese_int, anno, ora, durata, note, firma, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(format!("{}:00", entry.time))
    .bind(&entry.duration)
    .bind(&entry.notes)
    .bind(signer)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_seizure(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &SEIZURES, id).await
}

// ========================================
// Logbook (diario)
// ========================================

pub const LOGBOOK: RecordKind = RecordKind {
    table: "diario",
    tiebreak: "",
    signer_join: false,
    // the logbook view always shows the full history
    semester_scoped: false,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct LogbookEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub event: String,
    pub intervention: Option<String>,
    pub signature: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewLogbookEntry {
    pub person_id: i64,
    pub date: String,
    pub event: String,
    pub intervention: Option<String>,
}

pub async fn list_logbook(pool: &SqlitePool, person_id: i64) -> Result<Vec<LogbookEntry>> {
    list_rows(pool, &LOGBOOK, person_id, SemesterFilter::none(), |row| {
        LogbookEntry {
            id: row.get("id"),
            person_id: row.get("id_persona"),
            date: date_of(row),
            event: row.get("evento"),
            intervention: row.get("intervento"),
            signature: row.get("firma"),
        }
    })
    .await
}

pub async fn create_logbook(pool: &SqlitePool, entry: &NewLogbookEntry, signer: i64) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    sqlx::query(
        "INSERT INTO diario
         (id_persona, giorno, mese_int, anno, evento, intervento, firma, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(&entry.event)
    .bind(&entry.intervention)
    .bind(signer)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_logbook(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &LOGBOOK, id).await
}

// ========================================
// Targeted interventions (attivita_mirata)
// ========================================

pub const TARGET: RecordKind = RecordKind {
    table: "attivita_mirata",
    tiebreak: "",
    signer_join: true,
    semester_scoped: true,
    on_list_failure: OnListFailure::SoftEmpty,
};

#[derive(Debug, Clone, Serialize)]
pub struct TargetEntry {
    pub id: i64,
    pub person_id: i64,
    pub date: String,
    pub event: String,
    pub intervention: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTargetEntry {
    pub person_id: i64,
    pub date: String,
    pub event: String,
    pub intervention: String,
}

pub async fn list_targets(
    pool: &SqlitePool,
    person_id: i64,
    filter: SemesterFilter,
) -> Result<Vec<TargetEntry>> {
    list_rows(pool, &TARGET, person_id, filter, |row| TargetEntry {
        id: row.get("id"),
        person_id: row.get("id_persona"),
        date: date_of(row),
        event: row.get("evento"),
        intervention: row.get("intervento"),
        signature: signature_of(row),
    })
    .await
}

pub async fn create_target(pool: &SqlitePool, entry: &NewTargetEntry, signer: i64) -> Result<()> {
    let date = DateKey::parse(&entry.date)?;
    sqlx::query(
        "INSERT INTO attivita_mirata
         (id_persona, giorno, mese_int, anno, evento, intervento, firma, id_semestre)
         VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(entry.person_id)
    .bind(date.giorno)
    .bind(date.mese)
    .bind(date.anno)
    .bind(&entry.event)
    .bind(&entry.intervention)
    .bind(signer)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_target(pool: &SqlitePool, id: i64) -> Result<()> {
    delete_row(pool, &TARGET, id).await
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
        sqlx::query("INSERT INTO account (nome, cognome, password) VALUES ('Mario', 'Rossi', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn toilet_day_orders_by_morning_flag_ascending() {
        let pool = test_pool().await;
        let afternoon = NewToiletEntry {
            person_id: 1,
            date: "2024-04-03".to_string(),
            morning: "no".to_string(),
            urine: "yes".to_string(),
            feces: "no".to_string(),
            diaper: "2".to_string(),
            redness: None,
            period: None,
            belt: None,
        };
        let morning = NewToiletEntry {
            person_id: 1,
            date: "2024-04-03".to_string(),
            morning: "yes".to_string(),
            urine: "no".to_string(),
            feces: "yes".to_string(),
            diaper: "1".to_string(),
            redness: Some("on".to_string()),
            period: None,
            belt: None,
        };
        create_toilet(&pool, &afternoon, 1).await.unwrap();
        create_toilet(&pool, &morning, 1).await.unwrap();

        let listed = list_toilet(&pool, 1, SemesterFilter::none()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].morning, 0);
        assert_eq!(listed[1].morning, 1);
        assert_eq!(listed[0].diaper, None);
        assert_eq!(listed[1].diaper.as_deref(), Some("1"));
        assert_eq!(listed[0].signature, "Mario Rossi");
    }

    #[tokio::test]
    async fn logbook_listing_ignores_semester_assignment() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO semestre (iniziale, finale) VALUES ('Gennaio 2024', 'Giugno 2024')")
            .execute(&pool)
            .await
            .unwrap();

        let entry = NewLogbookEntry {
            person_id: 1,
            date: "2024-02-01".to_string(),
            event: "visita medica".to_string(),
            intervention: None,
        };
        create_logbook(&pool, &entry, 1).await.unwrap();
        sqlx::query("UPDATE diario SET id_semestre = 1")
            .execute(&pool)
            .await
            .unwrap();

        // still listed even though the row belongs to a semester
        let listed = list_logbook(&pool, 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].event, "visita medica");
    }

    #[tokio::test]
    async fn seizure_time_is_trimmed_to_minutes() {
        let pool = test_pool().await;
        let entry = NewSeizureEntry {
            person_id: 1,
            date: "2024-02-01".to_string(),
            time: "14:35".to_string(),
            duration: "2 min".to_string(),
            notes: None,
        };
        create_seizure(&pool, &entry, 1).await.unwrap();

        let listed = list_seizures(&pool, 1, SemesterFilter::none()).await.unwrap();
        assert_eq!(listed[0].time.as_deref(), Some("14:35"));
    }

    #[tokio::test]
    async fn hydration_checkbox_normalization() {
        let pool = test_pool().await;
        let entry = NewCareTaskEntry {
            person_id: 1,
            date: "2024-02-01".to_string(),
            done: Some("on".to_string()),
            notes: Some("mezzo litro".to_string()),
        };
        create_hydration(&pool, &entry, 1).await.unwrap();

        let listed = list_hydration(&pool, 1, SemesterFilter::none()).await.unwrap();
        assert_eq!(listed[0].done, 1);
        assert_eq!(listed[0].notes.as_deref(), Some("mezzo litro"));
    }
}
