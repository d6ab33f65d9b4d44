//! Participant operations.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{Participant, RosterEntry};

/// Whether an upsert created a new participant or overwrote a wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Register a participant, or overwrite the wishlist if the name exists.
///
/// Names are matched exactly here: the stored name is the unique key.
pub async fn upsert_participant(
    pool: &SqlitePool,
    name: &str,
    wishlist: &str,
) -> Result<UpsertOutcome> {
    let mut tx = pool.begin().await?;

    // The insert decides the outcome; only one writer can create a name.
    let inserted = sqlx::query(
        r#"
        INSERT INTO participants (name, wishlist)
        VALUES (?, ?)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(wishlist)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let outcome = if inserted == 1 {
        UpsertOutcome::Created
    } else {
        sqlx::query(
            r#"
            UPDATE participants
            SET wishlist = ?, updated_at = datetime('now')
            WHERE name = ?
            "#,
        )
        .bind(wishlist)
        .bind(name)
        .execute(&mut *tx)
        .await?;
        UpsertOutcome::Updated
    };

    tx.commit().await?;
    tracing::debug!("Upserted participant {} ({:?})", name, outcome);
    Ok(outcome)
}

/// Find a participant by name, ignoring case.
///
/// An exact-case match wins over other case variants.
pub async fn find_participant_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Participant>> {
    let participant = sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, name, wishlist
        FROM participants
        WHERE name = ? COLLATE NOCASE
        ORDER BY (name = ?) DESC, id
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(participant)
}

/// List all participants ordered by name.
pub async fn list_participants(pool: &SqlitePool) -> Result<Vec<Participant>> {
    let participants = sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, name, wishlist
        FROM participants
        ORDER BY name COLLATE NOCASE, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(participants)
}

/// Snapshot the id and name of every participant.
pub async fn roster(pool: &SqlitePool) -> Result<Vec<RosterEntry>> {
    let entries = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT id, name
        FROM participants
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Count registered participants.
pub async fn count_participants(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM participants
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
