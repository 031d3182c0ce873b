#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemorySnapshotStore, SessionSnapshotRepository, SnapshotStore, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
