//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose explorer, editor and data-management use-cases to Dart via FRB.
//! - Own the single process-wide store handle the UI talks to.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Calls are serialized through one mutex, so concurrent callers never
//!   interleave a stage/flush/commit cycle.
//! - Structured results cross the boundary as JSON text in the shapes the
//!   core serializes (`camelCase` keys).

use kakumemo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_sqlite_store,
    ping as ping_inner, reset_sqlite_store, FileUpdate, GameUpdate, KeyValueStore, NoteStore,
    SettingsUpdate, SqliteKeyValueStore, StoreError, StoreResult,
};
use log::{error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

const STORE_DB_FILE_NAME: &str = "kakumemo.sqlite3";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE: OnceLock<Mutex<Option<NoteStore<SqliteKeyValueStore>>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Envelope for commands that create, change or remove entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected entity.
    pub id: Option<String>,
    /// `not_found|validation_error|persistence_error` on failure.
    pub error_code: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl StoreActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(op: &str, err: CallError) -> Self {
        Self {
            ok: false,
            id: None,
            error_code: err.code.map(str::to_string),
            message: format!("{op} failed: {}", err.message),
        }
    }
}

/// Envelope for queries returning structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQueryResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// JSON payload; `null` when the requested entity does not exist.
    pub payload_json: String,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl StoreQueryResponse {
    fn from_result<T: Serialize>(op: &str, result: Result<T, CallError>) -> Self {
        match result.and_then(|value| {
            serde_json::to_string(&value).map_err(|err| CallError::internal(err.to_string()))
        }) {
            Ok(payload_json) => Self {
                ok: true,
                payload_json,
                message: String::new(),
            },
            Err(err) => Self {
                ok: false,
                payload_json: "null".to_string(),
                message: format!("{op} failed: {}", err.message),
            },
        }
    }
}

/// Creates a game.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the new game id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_create_game(name: String) -> StoreActionResponse {
    match with_store(|store| store.create_game(name.trim())) {
        Ok(game) => StoreActionResponse::success("Game created.", Some(game.id)),
        Err(err) => StoreActionResponse::failure("explorer_create_game", err),
    }
}

/// Creates a character under `game_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_create_character(game_id: String, name: String) -> StoreActionResponse {
    match with_store(|store| store.create_character(&game_id, name.trim())) {
        Ok(character) => StoreActionResponse::success("Character created.", Some(character.id)),
        Err(err) => StoreActionResponse::failure("explorer_create_character", err),
    }
}

/// Creates a category under `character_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_create_category(character_id: String, name: String) -> StoreActionResponse {
    match with_store(|store| store.create_category(&character_id, name.trim())) {
        Ok(category) => StoreActionResponse::success("Category created.", Some(category.id)),
        Err(err) => StoreActionResponse::failure("explorer_create_category", err),
    }
}

/// Creates a note under `category_id`; `content` defaults to empty.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_create_file(
    category_id: String,
    title: String,
    content: Option<String>,
) -> StoreActionResponse {
    match with_store(|store| {
        store.create_file(&category_id, title.trim(), content.unwrap_or_default())
    }) {
        Ok(file) => StoreActionResponse::success("File created.", Some(file.id)),
        Err(err) => StoreActionResponse::failure("explorer_create_file", err),
    }
}

/// Deletes one note.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_delete_file(file_id: String) -> StoreActionResponse {
    match with_store(|store| store.delete_file(&file_id)) {
        Ok(()) => StoreActionResponse::success("File deleted.", Some(file_id)),
        Err(err) => StoreActionResponse::failure("explorer_delete_file", err),
    }
}

/// Deletes a game with all of its characters, categories and notes.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_delete_game(game_id: String) -> StoreActionResponse {
    match with_store(|store| store.delete_game(&game_id)) {
        Ok(()) => StoreActionResponse::success("Game deleted.", Some(game_id)),
        Err(err) => StoreActionResponse::failure("explorer_delete_game", err),
    }
}

/// Renames a game.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_update_game(game_id: String, name: String) -> StoreActionResponse {
    let update = GameUpdate {
        name: Some(name.trim().to_string()),
    };
    match with_store(|store| store.update_game(&game_id, update)) {
        Ok(game) => StoreActionResponse::success("Game updated.", Some(game.id)),
        Err(err) => StoreActionResponse::failure("explorer_update_game", err),
    }
}

/// Every game with its nested characters and categories, in creation order.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_get_games() -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "explorer_get_games",
        with_store(|store| Ok(store.get_games())),
    )
}

/// One game as JSON, or `null` when it does not exist.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_get_game(game_id: String) -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "explorer_get_game",
        with_store(|store| Ok(store.get_game(&game_id))),
    )
}

/// One character of `game_id` as JSON, or `null`.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_get_character(game_id: String, character_id: String) -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "explorer_get_character",
        with_store(|store| Ok(store.get_character(&game_id, &character_id))),
    )
}

/// One category as JSON, or `null`.
#[flutter_rust_bridge::frb(sync)]
pub fn explorer_get_category(category_id: String) -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "explorer_get_category",
        with_store(|store| Ok(store.get_category(&category_id))),
    )
}

/// The whole `{games, files, settings}` document the explorer renders from.
#[flutter_rust_bridge::frb(sync)]
pub fn get_all_data() -> StoreQueryResponse {
    StoreQueryResponse::from_result("get_all_data", with_store(|store| Ok(store.get_all_data())))
}

/// Loads one note as JSON, or `null` when it does not exist.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_get_file(file_id: String) -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "editor_get_file",
        with_store(|store| Ok(store.get_file(&file_id))),
    )
}

/// Saves title and/or content of a note. `None` keeps the current value.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_update_file(
    file_id: String,
    title: Option<String>,
    content: Option<String>,
) -> StoreActionResponse {
    let update = FileUpdate { title, content };
    match with_store(|store| store.update_file(&file_id, update)) {
        Ok(file) => StoreActionResponse::success("File saved.", Some(file.id)),
        Err(err) => StoreActionResponse::failure("editor_update_file", err),
    }
}

/// Searches note titles and contents; payload is an array of hits.
#[flutter_rust_bridge::frb(sync)]
pub fn search_files(query: String) -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "search_files",
        with_store(|store| Ok(store.search_files(&query))),
    )
}

/// Breadcrumb for a note as a JSON string; `""` when unknown or orphaned.
#[flutter_rust_bridge::frb(sync)]
pub fn file_path(file_id: String) -> StoreQueryResponse {
    StoreQueryResponse::from_result(
        "file_path",
        with_store(|store| Ok(store.get_file_path(&file_id))),
    )
}

/// Dashboard counters as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn statistics() -> StoreQueryResponse {
    StoreQueryResponse::from_result("statistics", with_store(|store| Ok(store.get_statistics())))
}

/// Whole store as pretty JSON in the payload.
#[flutter_rust_bridge::frb(sync)]
pub fn export_data() -> StoreQueryResponse {
    match with_store(|store| store.export_data()) {
        Ok(payload_json) => StoreQueryResponse {
            ok: true,
            payload_json,
            message: String::new(),
        },
        Err(err) => StoreQueryResponse {
            ok: false,
            payload_json: "null".to_string(),
            message: format!("export_data failed: {}", err.message),
        },
    }
}

/// Overlays an exported document on the current data.
#[flutter_rust_bridge::frb(sync)]
pub fn import_data(serialized: String) -> StoreActionResponse {
    match with_store(|store| store.import_data(&serialized)) {
        Ok(()) => StoreActionResponse::success("Data imported.", None),
        Err(err) => StoreActionResponse::failure("import_data", err),
    }
}

/// Erases every game, note and setting.
///
/// Also works when the stored snapshot is corrupt and the store cannot be
/// opened: the snapshot is then overwritten without being read.
#[flutter_rust_bridge::frb(sync)]
pub fn reset_data() -> StoreActionResponse {
    let mut slot = lock_store();
    let result = reset_in_slot(&mut *slot, || reset_sqlite_store(resolve_store_db_path()));
    match result.map_err(CallError::from) {
        Ok(()) => StoreActionResponse::success("Data reset.", None),
        Err(err) => StoreActionResponse::failure("reset_data", err),
    }
}

/// Seeds the sample game when the store has no games yet.
#[flutter_rust_bridge::frb(sync)]
pub fn seed_sample_data() -> StoreActionResponse {
    match with_store(|store| store.seed_sample_data()) {
        Ok(true) => StoreActionResponse::success("Sample data created.", None),
        Ok(false) => StoreActionResponse::success("Store already has data.", None),
        Err(err) => StoreActionResponse::failure("seed_sample_data", err),
    }
}

/// Current settings as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn get_settings() -> StoreQueryResponse {
    StoreQueryResponse::from_result("get_settings", with_store(|store| Ok(store.get_settings())))
}

/// Merges provided settings; payload is the resulting settings.
#[flutter_rust_bridge::frb(sync)]
pub fn update_settings(
    theme: Option<String>,
    auto_save: Option<bool>,
    auto_save_interval: Option<u64>,
) -> StoreQueryResponse {
    let update = SettingsUpdate {
        theme,
        auto_save,
        auto_save_interval,
    };
    StoreQueryResponse::from_result(
        "update_settings",
        with_store(|store| store.update_settings(update)),
    )
}

struct CallError {
    code: Option<&'static str>,
    message: String,
}

impl CallError {
    fn internal(message: String) -> Self {
        Self {
            code: None,
            message,
        }
    }
}

impl From<StoreError> for CallError {
    fn from(err: StoreError) -> Self {
        Self {
            code: Some(err.code()),
            message: err.to_string(),
        }
    }
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("KAKUMEMO_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn lock_store() -> MutexGuard<'static, Option<NoteStore<SqliteKeyValueStore>>> {
    // Live state only changes after a successful flush, so a poisoned lock
    // still guards a consistent store.
    STORE
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Resets the open store, or replaces an unopened one through `reset_storage`.
fn reset_in_slot<S: KeyValueStore>(
    slot: &mut Option<NoteStore<S>>,
    reset_storage: impl FnOnce() -> StoreResult<NoteStore<S>>,
) -> StoreResult<()> {
    if let Some(store) = slot.as_mut() {
        return store.reset_data();
    }
    *slot = Some(reset_storage()?);
    info!("event=ffi_store_reset module=ffi status=ok opened=false");
    Ok(())
}

fn with_store<T>(
    f: impl FnOnce(&mut NoteStore<SqliteKeyValueStore>) -> StoreResult<T>,
) -> Result<T, CallError> {
    let mut slot = lock_store();

    if slot.is_none() {
        let db_path = resolve_store_db_path();
        let store = open_sqlite_store(&db_path).map_err(|err| {
            error!(
                "event=ffi_store_open module=ffi status=error error_code={} hint=reset_data error={}",
                err.code(),
                err
            );
            CallError::from(err)
        })?;
        *slot = Some(store);
    }

    let Some(store) = slot.as_mut() else {
        return Err(CallError::internal("store handle unavailable".to_string()));
    };
    f(store).map_err(|err| {
        warn!(
            "event=ffi_call module=ffi status=error error_code={}",
            err.code()
        );
        CallError::from(err)
    })
}
