use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use interview_core::model::Snapshot;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the single durable session slot.
///
/// A slot holds one JSON snapshot document; saving overwrites atomically.
/// Adapters stay shape-agnostic; parsing and migration happen above them.
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Write the snapshot payload, replacing any prior one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be written.
    async fn save_snapshot(
        &self,
        slot: &str,
        payload: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Read the raw payload, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures other than absence.
    async fn load_snapshot(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Remove the slot. Clearing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear_snapshot(&self, slot: &str) -> Result<(), StorageError>;
}

/// In-memory snapshot store for tests and storage-degraded operation.
///
/// When durable storage is unavailable the interview keeps running against
/// this store; only resume-across-restarts is lost.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionSnapshotRepository for InMemorySnapshotStore {
    async fn save_snapshot(
        &self,
        slot: &str,
        payload: &str,
        _saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(slot.to_owned(), payload.to_owned());
        Ok(())
    }

    async fn load_snapshot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(slot).cloned())
    }

    async fn clear_snapshot(&self, slot: &str) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(slot);
        Ok(())
    }
}

/// Typed facade over a snapshot repository.
///
/// Serializes/parses the snapshot document and applies the "corrupt data is
/// no session" rule so callers never see a parse failure.
#[derive(Clone)]
pub struct SnapshotStore {
    repo: Arc<dyn SessionSnapshotRepository>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(repo: Arc<dyn SessionSnapshotRepository>) -> Self {
        Self { repo }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySnapshotStore::new()))
    }

    /// Persist a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the snapshot cannot be
    /// encoded, or the repository's write error.
    pub async fn save(
        &self,
        slot: &str,
        snapshot: &Snapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.repo.save_snapshot(slot, &payload, saved_at).await
    }

    /// Load and parse the slot.
    ///
    /// An empty slot and an unparsable payload both yield `Ok(None)`; the
    /// latter is logged and treated as "no session", never as fatal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for repository read failures.
    pub async fn load(&self, slot: &str) -> Result<Option<Snapshot>, StorageError> {
        let Some(payload) = self.repo.load_snapshot(slot).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Snapshot>(&payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(error) => {
                warn!(%slot, %error, "discarding unparsable session snapshot");
                Ok(None)
            }
        }
    }

    /// Remove the slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    pub async fn clear(&self, slot: &str) -> Result<(), StorageError> {
        self.repo.clear_snapshot(slot).await
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
