use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{SessionSnapshotRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionSnapshotRepository for SqliteRepository {
    async fn save_snapshot(
        &self,
        slot: &str,
        payload: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO session_snapshots (slot, payload, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(slot) DO UPDATE SET
                    payload = excluded.payload,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(slot)
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_snapshot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT payload
                FROM session_snapshots
                WHERE slot = ?1
            ",
        )
        .bind(slot)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => {
                let payload: String = row
                    .try_get("payload")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    async fn clear_snapshot(&self, slot: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_snapshots WHERE slot = ?1")
            .bind(slot)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
