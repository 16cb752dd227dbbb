//! Hierarchical note store.
//!
//! # Responsibility
//! - Own the game/character/category/file hierarchy and user settings.
//! - Mirror the whole state to a [`KeyValueStore`] after every mutation.
//! - Provide CRUD, search, path lookup and statistics use-cases.
//!
//! # Invariants
//! - Every mutation is staged on a copy, flushed, then committed. If any
//!   step fails the live state is unchanged, so memory never runs ahead of
//!   storage.
//! - Structural changes (create/delete) touch the timestamps of the entity
//!   and all its ancestors; content updates touch only the entity itself.
//! - The store is an ordinary value passed to its consumers; nothing here
//!   is global.

mod error;
mod sample;

pub use error::{PersistenceError, StoreError, StoreResult};

use crate::clock::{Clock, SystemClock};
use crate::model::file::{FileUpdate, NoteFile};
use crate::model::game::{Category, Character, Game, GameUpdate};
use crate::model::settings::{Settings, SettingsUpdate};
use crate::model::snapshot::StoreSnapshot;
use crate::model::EntityId;
use crate::repo::kv_repo::KeyValueStore;
use crate::search::file_search::{search_files, FileSearchHit};
use crate::tree::{NoteTree, TreeError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// Storage key the snapshot is written under.
pub const DEFAULT_STORAGE_KEY: &str = "kakumemo2_data";

/// Aggregate counters for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_games: usize,
    pub total_characters: usize,
    pub total_files: usize,
    /// Sum of note content lengths, not an entity count.
    pub total_character_count: usize,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    tree: NoteTree,
    settings: Settings,
}

impl StoreState {
    fn from_snapshot(snapshot: &StoreSnapshot) -> Result<Self, TreeError> {
        Ok(Self {
            tree: NoteTree::from_snapshot(snapshot)?,
            settings: snapshot.settings.clone(),
        })
    }

    fn snapshot(&self) -> StoreSnapshot {
        self.tree.to_snapshot(&self.settings)
    }
}

/// Note store over a key-value storage backend.
pub struct NoteStore<S: KeyValueStore> {
    storage: S,
    storage_key: String,
    state: StoreState,
    clock: Box<dyn Clock + Send>,
}

impl<S: KeyValueStore> NoteStore<S> {
    /// Loads the store from `storage` under [`DEFAULT_STORAGE_KEY`].
    pub fn open(storage: S) -> StoreResult<Self> {
        Self::open_with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Loads the store from `storage` under a custom key.
    ///
    /// A missing entry yields the empty default state. A present entry is
    /// overlaid key by key on the default shape.
    ///
    /// # Errors
    /// - `Persistence` when storage cannot be read or holds a corrupt or
    ///   inconsistent snapshot.
    pub fn open_with_key(storage: S, storage_key: impl Into<String>) -> StoreResult<Self> {
        let started_at = Instant::now();
        let storage_key = storage_key.into();

        let snapshot = match storage.get(&storage_key).map_err(PersistenceError::from)? {
            None => StoreSnapshot::default(),
            Some(text) => decode_stored_snapshot(&text).map_err(|err| {
                error!(
                    "event=store_open module=store status=error error_code=corrupt_snapshot error={}",
                    err
                );
                PersistenceError::CorruptSnapshot(err)
            })?,
        };
        let state =
            StoreState::from_snapshot(&snapshot).map_err(PersistenceError::InvalidSnapshot)?;

        info!(
            "event=store_open module=store status=ok games={} files={} duration_ms={}",
            state.tree.game_count(),
            state.tree.file_count(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            storage,
            storage_key,
            state,
            clock: Box::new(SystemClock),
        })
    }

    /// Discards whatever `storage` holds under [`DEFAULT_STORAGE_KEY`] and
    /// starts from the empty default state.
    ///
    /// The recovery path when [`NoteStore::open`] refuses a corrupt or
    /// inconsistent snapshot; the stored blob is never read.
    ///
    /// # Errors
    /// - `Persistence` when the default state cannot be written.
    pub fn reset_storage(storage: S) -> StoreResult<Self> {
        let mut store = Self {
            storage,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            state: StoreState::default(),
            clock: Box::new(SystemClock),
        };
        write_snapshot(&mut store.storage, &store.storage_key, &store.state)?;
        warn!("event=store_reset module=store status=ok reason=storage_reset");
        Ok(store)
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Creates an empty game.
    pub fn create_game(&mut self, name: impl Into<String>) -> StoreResult<Game> {
        let name = name.into();
        let id = new_entity_id();
        let game = self.commit("game_create", |state, now| {
            Ok(state.tree.add_game(id, name, now)?)
        })?;
        info!("event=game_create module=store status=ok game_id={}", game.id);
        Ok(game)
    }

    /// Creates a character under `game_id`.
    ///
    /// # Errors
    /// - `NotFound` when the game does not exist.
    pub fn create_character(
        &mut self,
        game_id: &str,
        name: impl Into<String>,
    ) -> StoreResult<Character> {
        let name = name.into();
        let id = new_entity_id();
        let character = self.commit("character_create", |state, now| {
            Ok(state.tree.add_character(game_id, id, name, now)?)
        })?;
        info!(
            "event=character_create module=store status=ok game_id={} character_id={}",
            game_id, character.id
        );
        Ok(character)
    }

    /// Creates a category under `character_id`.
    ///
    /// # Errors
    /// - `NotFound` when the character does not exist.
    pub fn create_category(
        &mut self,
        character_id: &str,
        name: impl Into<String>,
    ) -> StoreResult<Category> {
        let name = name.into();
        let id = new_entity_id();
        let category = self.commit("category_create", |state, now| {
            Ok(state.tree.add_category(character_id, id, name, now)?)
        })?;
        info!(
            "event=category_create module=store status=ok character_id={} category_id={}",
            character_id, category.id
        );
        Ok(category)
    }

    /// Creates a note under `category_id`. Pass `""` for an empty note.
    ///
    /// # Errors
    /// - `NotFound` when the category does not exist.
    pub fn create_file(
        &mut self,
        category_id: &str,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<NoteFile> {
        let title = title.into();
        let content = content.into();
        let id = new_entity_id();
        let file = self.commit("file_create", |state, now| {
            Ok(state.tree.add_file(category_id, id, title, content, now)?)
        })?;
        info!(
            "event=file_create module=store status=ok category_id={} file_id={}",
            category_id, file.id
        );
        Ok(file)
    }

    pub fn get_file(&self, id: &str) -> Option<NoteFile> {
        self.state.tree.file(id).cloned()
    }

    pub fn get_game(&self, id: &str) -> Option<Game> {
        self.state.tree.game(id)
    }

    /// All games in creation order.
    pub fn get_games(&self) -> Vec<Game> {
        self.state.tree.games()
    }

    /// Looks up a character inside one game; a character of another game is
    /// not returned.
    pub fn get_character(&self, game_id: &str, id: &str) -> Option<Character> {
        self.state.tree.character(game_id, id)
    }

    pub fn get_category(&self, id: &str) -> Option<Category> {
        self.state.tree.category(id)
    }

    /// Merges provided fields into a note.
    ///
    /// Only the note's own `lastModified` changes; ancestors keep theirs.
    ///
    /// # Errors
    /// - `NotFound` when the note does not exist.
    pub fn update_file(&mut self, id: &str, update: FileUpdate) -> StoreResult<NoteFile> {
        let file = self.commit("file_update", |state, now| {
            Ok(state.tree.update_file(id, update, now)?)
        })?;
        info!("event=file_update module=store status=ok file_id={id}");
        Ok(file)
    }

    /// Merges provided fields into a game.
    ///
    /// # Errors
    /// - `NotFound` when the game does not exist.
    pub fn update_game(&mut self, id: &str, update: GameUpdate) -> StoreResult<Game> {
        let game = self.commit("game_update", |state, now| {
            Ok(state.tree.update_game(id, update, now)?)
        })?;
        info!("event=game_update module=store status=ok game_id={id}");
        Ok(game)
    }

    /// Deletes a note and unlinks it from its category.
    ///
    /// # Errors
    /// - `NotFound` when the note does not exist.
    pub fn delete_file(&mut self, id: &str) -> StoreResult<()> {
        self.commit("file_delete", |state, now| {
            state.tree.remove_file(id, now)?;
            Ok(())
        })?;
        info!("event=file_delete module=store status=ok file_id={id}");
        Ok(())
    }

    /// Deletes a game and every character, category and note below it.
    ///
    /// # Errors
    /// - `NotFound` when the game does not exist.
    pub fn delete_game(&mut self, id: &str) -> StoreResult<()> {
        let removed_files = self.commit("game_delete", |state, now| {
            Ok(state.tree.remove_game(id, now)?)
        })?;
        info!("event=game_delete module=store status=ok game_id={id} removed_files={removed_files}");
        Ok(())
    }

    /// Case-insensitive title/content search. See [`search_files`].
    pub fn search_files(&self, query: &str) -> Vec<FileSearchHit> {
        search_files(&self.state.tree, query)
    }

    /// `"Game > Character > Category"` for a note, empty when unknown or
    /// orphaned.
    pub fn get_file_path(&self, file_id: &str) -> String {
        self.state.tree.file_path(file_id)
    }

    pub fn get_statistics(&self) -> Statistics {
        let tree = &self.state.tree;
        Statistics {
            total_games: tree.game_count(),
            total_characters: tree.character_count(),
            total_files: tree.file_count(),
            total_character_count: tree.total_content_len(),
        }
    }

    pub fn get_settings(&self) -> Settings {
        self.state.settings.clone()
    }

    /// Merges provided settings fields.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> StoreResult<Settings> {
        let settings = self.commit("settings_update", |state, _now| {
            state.settings.apply(update);
            Ok(state.settings.clone())
        })?;
        info!("event=settings_update module=store status=ok");
        Ok(settings)
    }

    /// Full materialized snapshot.
    pub fn get_all_data(&self) -> StoreSnapshot {
        self.state.snapshot()
    }

    /// Serializes the whole store as pretty-printed JSON.
    pub fn export_data(&self) -> StoreResult<String> {
        let text = serde_json::to_string_pretty(&self.state.snapshot())
            .map_err(PersistenceError::Encode)?;
        info!("event=data_export module=store status=ok bytes={}", text.len());
        Ok(text)
    }

    /// Overlays an exported document onto the current store.
    ///
    /// Imported top-level keys replace current ones; absent keys are kept.
    ///
    /// # Errors
    /// - `Validation` when the payload is not a JSON object with a `games`
    ///   array, or when the merged result breaks hierarchy invariants.
    pub fn import_data(&mut self, serialized: &str) -> StoreResult<()> {
        let incoming = parse_import_payload(serialized).map_err(|err| {
            warn!(
                "event=data_import module=store status=error error_code=validation_error error={}",
                err
            );
            err
        })?;

        self.commit("data_import", |state, _now| {
            let merged = state
                .snapshot()
                .overlay(incoming)
                .map_err(|err| StoreError::Validation(err.to_string()))?;
            *state = StoreState::from_snapshot(&merged)
                .map_err(|err| StoreError::Validation(err.to_string()))?;
            Ok(())
        })?;

        info!(
            "event=data_import module=store status=ok games={} files={}",
            self.state.tree.game_count(),
            self.state.tree.file_count()
        );
        Ok(())
    }

    /// Replaces everything with the empty default state.
    pub fn reset_data(&mut self) -> StoreResult<()> {
        self.commit("data_reset", |state, _now| {
            *state = StoreState::default();
            Ok(())
        })?;
        info!("event=data_reset module=store status=ok");
        Ok(())
    }

    /// Stages `mutate` on a copy of the state, flushes it, then commits.
    fn commit<T>(
        &mut self,
        op: &'static str,
        mutate: impl FnOnce(&mut StoreState, &str) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let now = self.clock.now_iso();
        let mut staged = self.state.clone();
        let value = mutate(&mut staged, &now)?;

        let started_at = Instant::now();
        if let Err(err) = write_snapshot(&mut self.storage, &self.storage_key, &staged) {
            error!(
                "event=store_flush module=store status=error op={} duration_ms={} error={}",
                op,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        self.state = staged;
        Ok(value)
    }
}

fn write_snapshot<S: KeyValueStore>(
    storage: &mut S,
    key: &str,
    state: &StoreState,
) -> Result<(), PersistenceError> {
    let text = serde_json::to_string(&state.snapshot()).map_err(PersistenceError::Encode)?;
    storage.set(key, &text)?;
    Ok(())
}

fn decode_stored_snapshot(text: &str) -> serde_json::Result<StoreSnapshot> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => StoreSnapshot::default().overlay(map),
        _ => Err(serde::de::Error::custom("stored snapshot is not a JSON object")),
    }
}

fn parse_import_payload(serialized: &str) -> StoreResult<serde_json::Map<String, Value>> {
    let value: Value = serde_json::from_str(serialized)
        .map_err(|err| StoreError::Validation(format!("import payload is not JSON: {err}")))?;
    let Value::Object(map) = value else {
        return Err(StoreError::Validation(
            "import payload must be a JSON object".to_string(),
        ));
    };
    if !matches!(map.get("games"), Some(Value::Array(_))) {
        return Err(StoreError::Validation(
            "import payload must contain a `games` array".to_string(),
        ));
    }
    Ok(map)
}

fn new_entity_id() -> EntityId {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::{parse_import_payload, NoteStore, StoreError, DEFAULT_STORAGE_KEY};
    use crate::repo::kv_repo::{KeyValueStore, MemoryKeyValueStore};

    #[test]
    fn import_payload_requires_games_array() {
        for payload in ["not json", "[]", r#"{"files": []}"#, r#"{"games": {}}"#] {
            let err = parse_import_payload(payload).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{payload}");
        }
        assert!(parse_import_payload(r#"{"games": []}"#).is_ok());
    }

    #[test]
    fn failed_lookup_does_not_flush() {
        let mut store = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
        let err = store.create_character("missing", "Ryu").unwrap_err();
        assert_eq!(err.code(), "not_found");
        assert!(store
            .storage()
            .get(DEFAULT_STORAGE_KEY)
            .unwrap()
            .is_none());
    }
}
