//! Core of the fighting-game note organizer.
//! This crate owns the game → character → category → file hierarchy and is
//! the single source of truth for its invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod store;
pub mod tree;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use logging::{init_logging, logging_status, LogConfig, LogLevel, LoggingError};
pub use model::file::{FileUpdate, NoteFile};
pub use model::game::{Category, Character, Game, GameUpdate};
pub use model::settings::{Settings, SettingsUpdate};
pub use model::snapshot::StoreSnapshot;
pub use model::{EntityId, EntityKind};
pub use repo::kv_repo::{
    KeyValueStore, KvRepoError, KvRepoResult, MemoryKeyValueStore, SqliteKeyValueStore,
};
pub use search::file_search::{FileSearchHit, MatchKind};
pub use store::{
    NoteStore, PersistenceError, Statistics, StoreError, StoreResult, DEFAULT_STORAGE_KEY,
};
pub use tree::TreeError;

/// Opens a store backed by a SQLite file at `path`.
///
/// Convenience for hosts that only need the default storage key.
pub fn open_sqlite_store(
    path: impl AsRef<std::path::Path>,
) -> StoreResult<NoteStore<SqliteKeyValueStore>> {
    NoteStore::open(open_sqlite_storage(path)?)
}

/// Overwrites the store in the SQLite file at `path` with the empty default
/// state without reading the current snapshot.
pub fn reset_sqlite_store(
    path: impl AsRef<std::path::Path>,
) -> StoreResult<NoteStore<SqliteKeyValueStore>> {
    NoteStore::reset_storage(open_sqlite_storage(path)?)
}

fn open_sqlite_storage(path: impl AsRef<std::path::Path>) -> StoreResult<SqliteKeyValueStore> {
    let conn = db::open_db(path).map_err(|err| PersistenceError::Storage(KvRepoError::Db(err)))?;
    let storage = SqliteKeyValueStore::try_new(conn).map_err(PersistenceError::Storage)?;
    Ok(storage)
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
