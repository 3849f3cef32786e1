//! Guest administration
//!
//! Guests are never hard-deleted: removal flips the visibility flag so
//! their historical records stay queryable.

use sqlx::SqlitePool;

use carelog_common::Result;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Guest {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub visible: i64,
}

/// All visible guests, ordered by surname then name
pub async fn visible_guests(pool: &SqlitePool) -> Result<Vec<Guest>> {
    let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
        "SELECT id, nome, cognome, visibile FROM persona WHERE visibile = 1 ORDER BY cognome, nome",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, surname, visible)| Guest {
            id,
            name,
            surname,
            visible,
        })
        .collect())
}

pub async fn create_guest(pool: &SqlitePool, name: &str, surname: &str) -> Result<()> {
    sqlx::query("INSERT INTO persona (nome, cognome, visibile) VALUES (?, ?, 1)")
        .bind(name)
        .bind(surname)
        .execute(pool)
        .await?;
    Ok(())
}

/// Soft-delete: hide the guest without touching their records
pub async fn delete_guest(pool: &SqlitePool, guest_id: i64) -> Result<()> {
    sqlx::query("UPDATE persona SET visibile = 0 WHERE id = ?")
        .bind(guest_id)
        .execute(pool)
        .await?;
    Ok(())
}
