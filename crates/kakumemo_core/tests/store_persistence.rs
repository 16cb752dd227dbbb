use kakumemo_core::{
    open_sqlite_store, reset_sqlite_store, FileUpdate, KeyValueStore, KvRepoError, KvRepoResult,
    MemoryKeyValueStore, NoteStore, PersistenceError, StoreError, DEFAULT_STORAGE_KEY,
};
use serde_json::{json, Value};

/// Memory storage whose writes can be switched off to simulate quota errors.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryKeyValueStore,
    reject_writes: bool,
}

impl KeyValueStore for FlakyStorage {
    fn get(&self, key: &str) -> KvRepoResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> KvRepoResult<()> {
        if self.reject_writes {
            return Err(KvRepoError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, value)
    }
}

fn stored_json<S: KeyValueStore>(store: &NoteStore<S>) -> Value {
    let text = store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    serde_json::from_str(&text).unwrap()
}

fn populated_store() -> NoteStore<MemoryKeyValueStore> {
    let mut store = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
    let game = store.create_game("SF6").unwrap();
    let character = store.create_character(&game.id, "Ryu").unwrap();
    let category = store.create_category(&character.id, "Combos").unwrap();
    store.create_file(&category.id, "BnB", "5 hits").unwrap();
    store.create_file(&category.id, "Punish", "DP").unwrap();
    store
}

#[test]
fn every_mutation_is_flushed_in_the_documented_layout() {
    let store = populated_store();
    let stored = stored_json(&store);

    let game = &stored["games"][0];
    assert_eq!(game["name"], "SF6");
    let character = &game["characters"][0];
    assert_eq!(character["gameId"], game["id"]);
    let category = &character["categories"][0];
    assert_eq!(category["characterId"], character["id"]);
    assert_eq!(category["files"].as_array().unwrap().len(), 2);
    assert_eq!(stored["files"][0]["title"], "BnB");
    assert_eq!(stored["files"][0]["categoryId"], category["id"]);
    for key in ["createdAt", "lastModified"] {
        assert!(game[key].as_str().unwrap().ends_with('Z'));
    }
    assert_eq!(
        stored["settings"],
        json!({ "theme": "dark", "autoSave": true, "autoSaveInterval": 3000 })
    );
}

#[test]
fn reopening_storage_restores_the_same_state() {
    let store = populated_store();
    let before = store.get_all_data();

    let reopened = NoteStore::open(store.into_storage()).unwrap();
    assert_eq!(reopened.get_all_data(), before);
}

#[test]
fn import_of_export_keeps_statistics() {
    let mut store = populated_store();
    let stats = store.get_statistics();
    let exported = store.export_data().unwrap();

    store.import_data(&exported).unwrap();
    assert_eq!(store.get_statistics(), stats);

    let mut fresh = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
    fresh.import_data(&exported).unwrap();
    assert_eq!(fresh.get_statistics(), stats);
    assert_eq!(fresh.get_all_data(), store.get_all_data());
}

#[test]
fn export_is_pretty_printed() {
    let store = populated_store();
    let exported = store.export_data().unwrap();
    assert!(exported.starts_with("{\n  \"games\""));
}

#[test]
fn invalid_import_is_rejected_without_changes() {
    let mut store = populated_store();
    let before = store.get_all_data();
    let stored_before = stored_json(&store);

    for payload in [
        "{ not json",
        "42",
        r#"{"files": []}"#,
        r#"{"games": "nope"}"#,
        r#"{"games": [{"id": "g", "name": "G", "characters": [{"id": "g", "name": "dup", "gameId": "g"}]}]}"#,
    ] {
        let err = store.import_data(payload).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{payload}: {err}");
    }

    assert_eq!(store.get_all_data(), before);
    assert_eq!(stored_json(&store), stored_before);
}

#[test]
fn import_replacing_games_must_not_leave_dangling_file_refs() {
    let mut store = populated_store();
    let err = store
        .import_data(
            &json!({
                "games": [{
                    "id": "g2", "name": "GGST",
                    "characters": [{
                        "id": "c2", "name": "Sol", "gameId": "g2",
                        "categories": [{ "id": "k2", "name": "Combos", "characterId": "c2", "files": ["ghost"] }]
                    }]
                }]
            })
            .to_string(),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn import_overwrites_only_present_top_level_keys() {
    let mut store = populated_store();
    store
        .import_data(r#"{"games": [], "settings": {"theme": "light"}}"#)
        .unwrap();

    let stats = store.get_statistics();
    assert_eq!(stats.total_games, 0);
    // `files` was not in the payload, so the notes survive as orphans.
    assert_eq!(stats.total_files, 2);
    assert_eq!(store.get_settings().theme, "light");
    assert!(store.get_settings().auto_save);
}

#[test]
fn import_accepts_legacy_name_field_for_files() {
    let mut store = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
    store
        .import_data(
            &json!({
                "games": [{
                    "id": "g", "name": "SF6",
                    "characters": [{
                        "id": "c", "name": "Ryu", "gameId": "g",
                        "categories": [{ "id": "k", "name": "Combos", "characterId": "c", "files": ["f"] }]
                    }]
                }],
                "files": [{ "id": "f", "name": "Legacy", "content": "abc", "categoryId": "k" }]
            })
            .to_string(),
        )
        .unwrap();

    assert_eq!(store.get_file("f").unwrap().title, "Legacy");
    assert_eq!(store.get_file_path("f"), "SF6 > Ryu > Combos");
    assert_eq!(stored_json(&store)["files"][0]["title"], "Legacy");
}

#[test]
fn failed_flush_leaves_memory_and_storage_unchanged() {
    let mut store = NoteStore::open(FlakyStorage::default()).unwrap();
    let game = store.create_game("SF6").unwrap();
    let character = store.create_character(&game.id, "Ryu").unwrap();
    let category = store.create_category(&character.id, "Combos").unwrap();
    let file = store.create_file(&category.id, "BnB", "old").unwrap();
    let before = store.get_all_data();

    store.storage_mut().reject_writes = true;
    let err = store
        .update_file(&file.id, FileUpdate::content("new"))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Storage(KvRepoError::Unavailable(_)))
    ));
    assert!(matches!(
        store.delete_game(&game.id).unwrap_err(),
        StoreError::Persistence(_)
    ));
    assert!(store.create_game("GGST").is_err());

    assert_eq!(store.get_all_data(), before);
    assert_eq!(store.get_file(&file.id).unwrap().content, "old");

    store.storage_mut().reject_writes = false;
    store
        .update_file(&file.id, FileUpdate::content("new"))
        .unwrap();
    assert_eq!(stored_json(&store)["files"][0]["content"], "new");
}

#[test]
fn corrupt_stored_snapshot_fails_to_open() {
    let storage = MemoryKeyValueStore::new().with_entry(DEFAULT_STORAGE_KEY, "{ broken");
    let err = NoteStore::open(storage).err().unwrap();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::CorruptSnapshot(_))
    ));
}

#[test]
fn stored_snapshot_is_merged_over_default_shape() {
    let storage = MemoryKeyValueStore::new().with_entry(
        DEFAULT_STORAGE_KEY,
        r#"{"games": [{"id": "g", "name": "SF6"}]}"#,
    );
    let store = NoteStore::open(storage).unwrap();

    assert_eq!(store.get_game("g").unwrap().characters.len(), 0);
    assert_eq!(store.get_statistics().total_files, 0);
    assert_eq!(store.get_settings().auto_save_interval, 3000);
}

#[test]
fn custom_storage_key_is_used_for_reads_and_writes() {
    let mut store = NoteStore::open_with_key(MemoryKeyValueStore::new(), "other").unwrap();
    store.create_game("SF6").unwrap();
    assert!(store.storage().get("other").unwrap().is_some());
    assert!(store.storage().get(DEFAULT_STORAGE_KEY).unwrap().is_none());
}

#[test]
fn reset_data_restores_empty_default_shape() {
    let mut store = populated_store();
    store.reset_data().unwrap();

    assert_eq!(
        stored_json(&store),
        json!({
            "games": [],
            "files": [],
            "settings": { "theme": "dark", "autoSave": true, "autoSaveInterval": 3000 }
        })
    );
    assert_eq!(store.get_statistics().total_games, 0);
}

#[test]
fn sqlite_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kakumemo.sqlite3");

    let file_id = {
        let mut store = open_sqlite_store(&path).unwrap();
        let game = store.create_game("SF6").unwrap();
        let character = store.create_character(&game.id, "Ryu").unwrap();
        let category = store.create_category(&character.id, "Combos").unwrap();
        store.create_file(&category.id, "BnB", "5 hits").unwrap().id
    };

    let store = open_sqlite_store(&path).unwrap();
    assert_eq!(store.get_file_path(&file_id), "SF6 > Ryu > Combos");
    assert_eq!(store.get_statistics().total_character_count, 6);
}

#[test]
fn stored_null_text_fields_open_as_empty() {
    let storage = MemoryKeyValueStore::new().with_entry(
        DEFAULT_STORAGE_KEY,
        json!({
            "games": [{
                "id": "g", "name": "SF6",
                "characters": [{
                    "id": "c", "name": "Ryu", "gameId": "g",
                    "categories": [{ "id": "k", "name": "Combos", "characterId": "c", "files": ["f"] }]
                }]
            }],
            "files": [{ "id": "f", "title": "BnB", "content": null, "categoryId": "k" }]
        })
        .to_string(),
    );
    let store = NoteStore::open(storage).unwrap();

    assert_eq!(store.get_file("f").unwrap().content, "");
    assert_eq!(store.get_statistics().total_character_count, 0);
    assert_eq!(store.search_files("bnb").len(), 1);
}

#[test]
fn import_accepts_file_with_both_title_and_name() {
    let mut store = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
    store
        .import_data(
            &json!({
                "games": [{
                    "id": "g", "name": "SF6",
                    "characters": [{
                        "id": "c", "name": "Ryu", "gameId": "g",
                        "categories": [{ "id": "k", "name": "Combos", "characterId": "c", "files": ["f"] }]
                    }]
                }],
                "files": [{ "id": "f", "title": "BnB v2", "name": "BnB", "content": "", "categoryId": "k" }]
            })
            .to_string(),
        )
        .unwrap();

    assert_eq!(store.get_file("f").unwrap().title, "BnB v2");
    let stored = stored_json(&store);
    assert_eq!(stored["files"][0]["title"], "BnB v2");
    assert!(stored["files"][0].get("name").is_none());
}

#[test]
fn reset_storage_recovers_from_corrupt_snapshot() {
    let storage = MemoryKeyValueStore::new().with_entry(DEFAULT_STORAGE_KEY, "{not json");
    assert!(NoteStore::open(storage.clone()).is_err());

    let mut store = NoteStore::reset_storage(storage).unwrap();
    assert_eq!(store.get_statistics().total_games, 0);
    assert_eq!(stored_json(&store)["games"], json!([]));

    store.create_game("SF6").unwrap();
    let reopened = NoteStore::open(store.into_storage()).unwrap();
    assert_eq!(reopened.get_games()[0].name, "SF6");
}

#[test]
fn sqlite_store_with_corrupt_snapshot_can_be_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kakumemo.sqlite3");
    {
        let conn = kakumemo_core::db::open_db(&path).unwrap();
        let mut storage = kakumemo_core::SqliteKeyValueStore::try_new(conn).unwrap();
        storage.set(DEFAULT_STORAGE_KEY, "[1, 2").unwrap();
    }
    assert!(matches!(
        open_sqlite_store(&path).err().unwrap(),
        StoreError::Persistence(PersistenceError::CorruptSnapshot(_))
    ));

    reset_sqlite_store(&path).unwrap();
    let store = open_sqlite_store(&path).unwrap();
    assert_eq!(store.get_statistics().total_files, 0);
}
