//! Group, membership and assignment storage.
//!
//! Writes take a `SqliteConnection` so the assignment run can compose them
//! inside a single transaction. Reads go through the pool.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{AngelGroup, Assignment, AssignmentDetail};
use crate::Database;

/// Delete every group, membership and assignment row.
pub async fn clear_assignment_data(conn: &mut SqliteConnection) -> Result<()> {
    // Children first, without relying on cascades.
    sqlx::query("DELETE FROM assignments").execute(&mut *conn).await?;
    sqlx::query("DELETE FROM group_memberships")
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM angel_groups").execute(&mut *conn).await?;
    Ok(())
}

/// Insert a group and return its id.
pub async fn insert_group(conn: &mut SqliteConnection, label: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO angel_groups (label)
        VALUES (?)
        "#,
    )
    .bind(label)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Add a participant to a group.
pub async fn insert_membership(
    conn: &mut SqliteConnection,
    group_id: i64,
    participant_id: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO group_memberships (group_id, participant_id)
        VALUES (?, ?)
        "#,
    )
    .bind(group_id)
    .bind(participant_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        DatabaseError::from_insert(
            "GroupMembership",
            format!("{}/{}", group_id, participant_id),
            e,
        )
    })?;

    Ok(())
}

/// Record that `giver_id` gives to `receiver_id` within a group.
pub async fn insert_assignment(
    conn: &mut SqliteConnection,
    group_id: i64,
    giver_id: i64,
    receiver_id: i64,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO assignments (group_id, giver_id, receiver_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(group_id)
    .bind(giver_id)
    .bind(receiver_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        DatabaseError::from_insert("Assignment", format!("{}/{}", group_id, giver_id), e)
    })?;

    Ok(result.last_insert_rowid())
}

/// Find the assignment where the named participant is the giver.
///
/// The name is matched ignoring case.
pub async fn find_assignment_for_giver(
    pool: &SqlitePool,
    giver_name: &str,
) -> Result<Option<AssignmentDetail>> {
    let detail = sqlx::query_as::<_, AssignmentDetail>(
        r#"
        SELECT g.label AS group_label,
               giver.name AS giver_name,
               receiver.name AS receiver_name,
               receiver.wishlist AS receiver_wishlist
        FROM assignments a
        JOIN angel_groups g ON g.id = a.group_id
        JOIN participants giver ON giver.id = a.giver_id
        JOIN participants receiver ON receiver.id = a.receiver_id
        WHERE giver.name = ? COLLATE NOCASE
        ORDER BY (giver.name = ?) DESC, a.id
        LIMIT 1
        "#,
    )
    .bind(giver_name)
    .bind(giver_name)
    .fetch_optional(pool)
    .await?;

    Ok(detail)
}

/// List all groups ordered by creation.
pub async fn list_groups(pool: &SqlitePool) -> Result<Vec<AngelGroup>> {
    let groups = sqlx::query_as::<_, AngelGroup>(
        r#"
        SELECT id, label FROM angel_groups ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(groups)
}

/// List all assignments.
pub async fn list_assignments(pool: &SqlitePool) -> Result<Vec<Assignment>> {
    let assignments = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, group_id, giver_id, receiver_id
        FROM assignments
        ORDER BY group_id, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(assignments)
}

/// Count assignment rows.
pub async fn count_assignments(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assignments")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Count group rows.
pub async fn count_groups(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM angel_groups")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Count membership rows.
pub async fn count_memberships(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM group_memberships")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Wipe all four tables in one transaction.
pub async fn clear_all_data(db: &Database) -> Result<()> {
    let mut tx = db.begin().await?;
    clear_assignment_data(&mut tx).await?;
    sqlx::query("DELETE FROM participants")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::warn!("All participant and assignment data cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupMembership;
    use crate::{in_memory, participant};

    async fn list_memberships(pool: &SqlitePool, group_id: i64) -> Result<Vec<GroupMembership>> {
        let members = sqlx::query_as::<_, GroupMembership>(
            r#"
            SELECT group_id, participant_id
            FROM group_memberships
            WHERE group_id = ?
            ORDER BY participant_id
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    #[tokio::test]
    async fn test_assignment_lookup_ignores_case() {
        let db = in_memory().await.unwrap();
        participant::upsert_participant(db.pool(), "Alice", "").await.unwrap();
        participant::upsert_participant(db.pool(), "Bob", "books").await.unwrap();
        let roster = participant::roster(db.pool()).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let group_id = insert_group(&mut tx, "Group 1").await.unwrap();
        insert_membership(&mut tx, group_id, roster[0].id).await.unwrap();
        insert_membership(&mut tx, group_id, roster[1].id).await.unwrap();
        insert_assignment(&mut tx, group_id, roster[0].id, roster[1].id)
            .await
            .unwrap();
        insert_assignment(&mut tx, group_id, roster[1].id, roster[0].id)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let detail = find_assignment_for_giver(db.pool(), "aLiCe")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.receiver_name, "Bob");
        assert_eq!(detail.receiver_wishlist, "books");
        assert_eq!(detail.group_label, "Group 1");

        assert!(find_assignment_for_giver(db.pool(), "Carol")
            .await
            .unwrap()
            .is_none());
        assert_eq!(list_memberships(db.pool(), group_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_self_assignment_rejected_by_schema() {
        let db = in_memory().await.unwrap();
        participant::upsert_participant(db.pool(), "Alice", "").await.unwrap();
        let roster = participant::roster(db.pool()).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let group_id = insert_group(&mut tx, "Group 1").await.unwrap();
        let result = insert_assignment(&mut tx, group_id, roster[0].id, roster[0].id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rollback_on_drop() {
        let db = in_memory().await.unwrap();
        {
            let mut tx = db.begin().await.unwrap();
            insert_group(&mut tx, "Group 1").await.unwrap();
        }
        assert_eq!(count_groups(db.pool()).await.unwrap(), 0);
    }
}
