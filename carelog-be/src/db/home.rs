//! Home dashboard scan
//!
//! Flags the guests who are short on recorded activity visits over the
//! trailing week. A fully attended weekday has two visits (morning and
//! afternoon); anything less puts that (guest, day) pair on the
//! dashboard.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;

use carelog_common::Result;

use super::guests;

/// A weekday with fewer than the expected two visits
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MissingDay {
    pub day: i64,
    pub month_int: i64,
}

/// One guest's dashboard row
#[derive(Debug, Clone, Serialize)]
pub struct GuestDashboard {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub visible: i64,
    pub activities: Vec<MissingDay>,
}

/// Scan the trailing 7 calendar days ending `today`, weekdays only, and
/// report each visible guest with the days where fewer than 2 visits are
/// recorded. Guests fully covered carry an empty list; the roster is
/// always complete, ordered by surname then name.
pub async fn missing_activities(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<GuestDashboard>> {
    // newest first, like the record listings
    let window: Vec<NaiveDate> = (0..7)
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .filter(|d| d.weekday().number_from_monday() <= 5)
        .collect();

    let roster = guests::visible_guests(pool).await?;
    if window.is_empty() || roster.is_empty() {
        return Ok(roster
            .into_iter()
            .map(|g| GuestDashboard {
                id: g.id,
                name: g.name,
                surname: g.surname,
                visible: g.visible,
                activities: Vec::new(),
            })
            .collect());
    }

    // one grouped count query over the whole window
    let day_predicate = window
        .iter()
        .map(|_| "(giorno = ? AND mese_int = ? AND anno = ?)")
        .collect::<Vec<_>>()
        .join(" OR ");
    let sql = format!(
        "SELECT id_persona, giorno, mese_int, anno, COUNT(*) AS n
         FROM partecipazione_attivita
         WHERE {}
         GROUP BY id_persona, giorno, mese_int, anno",
        day_predicate
    );
    let mut query = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(&sql);
    for day in &window {
        query = query
            .bind(day.day() as i64)
            .bind(day.month() as i64)
            .bind(day.year() as i64);
    }
    let counts = query.fetch_all(pool).await?;

    let count_for = |person: i64, date: &NaiveDate| -> i64 {
        counts
            .iter()
            .find(|(p, g, m, a, _)| {
                *p == person
                    && *g == date.day() as i64
                    && *m == date.month() as i64
                    && *a == date.year() as i64
            })
            .map(|(_, _, _, _, n)| *n)
            .unwrap_or(0)
    };

    Ok(roster
        .into_iter()
        .map(|guest| {
            let activities = window
                .iter()
                .filter(|date| count_for(guest.id, date) < 2)
                .map(|date| MissingDay {
                    day: date.day() as i64,
                    month_int: date.month() as i64,
                })
                .collect();
            GuestDashboard {
                id: guest.id,
                name: guest.name,
                surname: guest.surname,
                visible: guest.visible,
                activities,
            }
        })
        .collect())
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

    async fn insert_visits(pool: &SqlitePool, date: NaiveDate, n: i64) {
        for mattino in 0..n {
            sqlx::query(
                "INSERT INTO partecipazione_attivita
                 (id_persona, giorno, mese_int, anno, mattino, attivita, adesione, partecipazione)
                 VALUES (1, ?, ?, ?, ?, 1, 3, 3)",
            )
            .bind(date.day() as i64)
            .bind(date.month() as i64)
            .bind(date.year() as i64)
            .bind(mattino)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    // 2024-06-14 is a Friday; the trailing week's weekdays are
    // Mon 10 .. Fri 14 plus the previous Sat/Sun which are dropped
    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    #[tokio::test]
    async fn fully_covered_guest_has_no_missing_days() {
        let pool = test_pool().await;
        for day in 10..=14 {
            insert_visits(&pool, NaiveDate::from_ymd_opt(2024, 6, day).unwrap(), 2).await;
        }

        let dashboard = missing_activities(&pool, friday()).await.unwrap();
        assert_eq!(dashboard.len(), 1);
        assert!(dashboard[0].activities.is_empty());
    }

    #[tokio::test]
    async fn single_visit_day_is_flagged_once() {
        let pool = test_pool().await;
        for day in 10..=14 {
            let n = if day == 12 { 1 } else { 2 };
            insert_visits(&pool, NaiveDate::from_ymd_opt(2024, 6, day).unwrap(), n).await;
        }

        let dashboard = missing_activities(&pool, friday()).await.unwrap();
        assert_eq!(
            dashboard[0].activities,
            vec![MissingDay {
                day: 12,
                month_int: 6
            }]
        );
    }

    #[tokio::test]
    async fn weekends_never_counted_and_empty_week_flags_all_weekdays() {
        let pool = test_pool().await;

        let dashboard = missing_activities(&pool, friday()).await.unwrap();
        let days: Vec<i64> = dashboard[0].activities.iter().map(|d| d.day).collect();
        // newest first; 8 and 9 June 2024 are the weekend
        assert_eq!(days, vec![14, 13, 12, 11, 10]);
    }

    #[tokio::test]
    async fn hidden_guests_are_not_scanned() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO persona (nome, cognome, visibile) VALUES ('Luca', 'Verdi', 0)")
            .execute(&pool)
            .await
            .unwrap();

        let dashboard = missing_activities(&pool, friday()).await.unwrap();
        assert_eq!(dashboard.len(), 1);
        assert_eq!(dashboard[0].name, "Anna");
    }
}
