#![forbid(unsafe_code)]

pub mod http;
pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{DocumentPath, DocumentStore, KeyValueStore, Storage, StorageError};
pub use snapshot::{LOCAL_SNAPSHOT_KEY, LocalSnapshotBackend, RemoteSnapshotBackend, SnapshotBackend};
