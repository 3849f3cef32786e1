//! Generic dated-record repository shape
//!
//! Every per-guest record table shares the same backbone and the same
//! three operations: list (descending by the stored date triple), create
//! (decompose the submitted date, normalize checkbox flags, stamp the
//! signing operator), delete (hard delete by id, zero rows affected is
//! success). The per-entity modules instantiate this shape with a
//! [`RecordKind`] and a row mapper.

use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use tracing::error;

use carelog_common::{Result, SemesterFilter};

/// What a listing does when the store fails.
///
/// Several views historically swallow store errors and render an empty
/// table instead of failing the page; others propagate. The divergence is
/// per-entity configuration, not something to unify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnListFailure {
    /// Surface the store error to the caller
    Propagate,
    /// Log the error and return an empty listing
    SoftEmpty,
}

/// Static description of one dated-record table
#[derive(Debug, Clone, Copy)]
pub struct RecordKind {
    /// Backing table
    pub table: &'static str,
    /// Extra ORDER BY terms after the descending date triple
    /// (e.g. `, mattino ASC` so morning sorts before afternoon in a day)
    pub tiebreak: &'static str,
    /// Join the signing operator's name onto each row
    pub signer_join: bool,
    /// Whether listings compose the semester filter (the logbook never
    /// did; keep that observable behavior)
    pub semester_scoped: bool,
    /// Listing failure mode
    pub on_list_failure: OnListFailure,
}

/// List one guest's records, ordered most recent first.
///
/// The semester predicate is composed identically for every scoped kind:
/// a concrete id matches only that semester, no selection matches only
/// rows that predate semester tracking.
pub async fn list_rows<T, F>(
    pool: &SqlitePool,
    kind: &RecordKind,
    person_id: i64,
    filter: SemesterFilter,
    map: F,
) -> Result<Vec<T>>
where
    F: Fn(&SqliteRow) -> T,
{
    let select = if kind.signer_join {
        format!(
            "SELECT t.*, account.nome AS firma_nome, account.cognome AS firma_cognome
             FROM {} t JOIN account ON t.firma = account.id",
            kind.table
        )
    } else {
        format!("SELECT t.* FROM {} t", kind.table)
    };

    let mut sql = format!("{} WHERE t.id_persona = ?", select);
    if kind.semester_scoped {
        sql.push_str(&format!(" AND t.id_semestre {}", filter.predicate()));
    }
    sql.push_str(&format!(
        " ORDER BY t.anno DESC, t.mese_int DESC, t.giorno DESC{}",
        kind.tiebreak
    ));

    let mut query = sqlx::query(&sql).bind(person_id);
    if kind.semester_scoped {
        if let Some(id) = filter.bind() {
            query = query.bind(id);
        }
    }

    match query.fetch_all(pool).await {
        Ok(rows) => Ok(rows.iter().map(map).collect()),
        Err(e) => match kind.on_list_failure {
            OnListFailure::Propagate => Err(e.into()),
            OnListFailure::SoftEmpty => {
                error!("listing {} failed, returning empty: {}", kind.table, e);
                Ok(Vec::new())
            }
        },
    }
}

/// Hard-delete a record by primary key.
///
/// Deleting an id that is already gone succeeds silently; listings are
/// the source of truth and a double delete leaves them unchanged.
pub async fn delete_row(pool: &SqlitePool, kind: &RecordKind, id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table);
    sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(())
}

/// Normalize a select-style `yes`/`no` submission to integer storage form
pub fn yes_flag(value: &str) -> i64 {
    i64::from(value == "yes")
}

/// Normalize a checkbox submission: checked arrives as `on`, unchecked is
/// absent from the payload entirely
pub fn checkbox_flag(value: Option<&str>) -> i64 {
    i64::from(matches!(value, Some("on")))
}
