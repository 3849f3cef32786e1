//! Operator accounts and server-side sessions
//!
//! Login matches (name, surname, SHA-256 digest) against the account
//! table. Sessions live in the `sessioni` table so every worker process
//! sees the same state; the row carries the operator's semester selection
//! and a sliding expiry.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use carelog_common::Result;

/// A resolved, unexpired session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account_id: i64,
    /// Selected semester id, None meaning the legacy (pre-semester) view
    pub semester: Option<i64>,
}

/// SHA-256 hex digest of a password, the storage form
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Look up an operator by name, surname and password digest
pub async fn login(
    pool: &SqlitePool,
    nome: &str,
    cognome: &str,
    digest: &str,
) -> Result<Option<i64>> {
    let id: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM account WHERE nome = ? AND cognome = ? AND password = ?",
    )
    .bind(nome)
    .bind(cognome)
    .bind(digest)
    .fetch_optional(pool)
    .await?;

    Ok(id.map(|(id,)| id))
}

/// Create a session for an operator, returning the token
pub async fn create_session(pool: &SqlitePool, account_id: i64, minutes: i64) -> Result<String> {
    let token = Uuid::new_v4().to_string();
    let scadenza = (Utc::now() + Duration::minutes(minutes)).to_rfc3339();

    sqlx::query("INSERT INTO sessioni (token, id_account, id_semestre, scadenza) VALUES (?, ?, NULL, ?)")
        .bind(&token)
        .bind(account_id)
        .bind(scadenza)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a session token, sliding its expiry forward.
///
/// Expired rows are deleted on touch and resolve to None.
pub async fn resolve_session(
    pool: &SqlitePool,
    token: &str,
    minutes: i64,
) -> Result<Option<Session>> {
    let row: Option<(i64, Option<i64>, String)> = sqlx::query_as(
        "SELECT id_account, id_semestre, scadenza FROM sessioni WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let Some((account_id, semester, scadenza)) = row else {
        return Ok(None);
    };

    let expired = chrono::DateTime::parse_from_rfc3339(&scadenza)
        .map(|t| t.with_timezone(&Utc) < Utc::now())
        .unwrap_or(true);
    if expired {
        sqlx::query("DELETE FROM sessioni WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        return Ok(None);
    }

    let scadenza = (Utc::now() + Duration::minutes(minutes)).to_rfc3339();
    sqlx::query("UPDATE sessioni SET scadenza = ? WHERE token = ?")
        .bind(scadenza)
        .bind(token)
        .execute(pool)
        .await?;

    Ok(Some(Session {
        token: token.to_string(),
        account_id,
        semester,
    }))
}

/// Set or clear the session's semester selection
pub async fn set_session_semester(
    pool: &SqlitePool,
    token: &str,
    semester: Option<i64>,
) -> Result<()> {
    sqlx::query("UPDATE sessioni SET id_semestre = ? WHERE token = ?")
        .bind(semester)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a session (logout)
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessioni WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
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
        sqlx::query("INSERT INTO account (nome, cognome, password) VALUES ('Mario', 'Rossi', ?)")
            .bind(password_digest("segreto"))
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO semestre (iniziale, finale) VALUES
             ('2024-01-01', '2024-06-30'), ('2024-07-01', '2024-12-31')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[test]
    fn digest_is_sha256_hex() {
        let digest = password_digest("segreto");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, password_digest("segreto"));
        assert_ne!(digest, password_digest("altro"));
    }

    #[tokio::test]
    async fn login_matches_digest_only() {
        let pool = test_pool().await;

        let id = login(&pool, "Mario", "Rossi", &password_digest("segreto"))
            .await
            .unwrap();
        assert_eq!(id, Some(1));

        let wrong = login(&pool, "Mario", "Rossi", &password_digest("sbagliato"))
            .await
            .unwrap();
        assert_eq!(wrong, None);
    }

    #[tokio::test]
    async fn session_round_trip_and_semester_selection() {
        let pool = test_pool().await;
        let token = create_session(&pool, 1, 30).await.unwrap();

        let session = resolve_session(&pool, &token, 30).await.unwrap().unwrap();
        assert_eq!(session.account_id, 1);
        assert_eq!(session.semester, None);

        set_session_semester(&pool, &token, Some(2)).await.unwrap();
        let session = resolve_session(&pool, &token, 30).await.unwrap().unwrap();
        assert_eq!(session.semester, Some(2));

        delete_session(&pool, &token).await.unwrap();
        assert!(resolve_session(&pool, &token, 30).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_purged_on_touch() {
        let pool = test_pool().await;
        let token = create_session(&pool, 1, -1).await.unwrap();

        assert!(resolve_session(&pool, &token, 30).await.unwrap().is_none());

        // the row itself is gone
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessioni")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
