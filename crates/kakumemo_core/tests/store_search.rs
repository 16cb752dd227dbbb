use kakumemo_core::{MatchKind, MemoryKeyValueStore, NoteStore};
use serde_json::json;

fn store_with_notes(notes: &[(&str, &str)]) -> (NoteStore<MemoryKeyValueStore>, Vec<String>) {
    let mut store = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
    let game = store.create_game("SF6").unwrap();
    let character = store.create_character(&game.id, "JP").unwrap();
    let category = store.create_category(&character.id, "Strategy").unwrap();
    let ids = notes
        .iter()
        .map(|(title, content)| {
            store
                .create_file(&category.id, *title, *content)
                .unwrap()
                .id
        })
        .collect();
    (store, ids)
}

#[test]
fn title_hits_and_content_hits_follow_collection_order() {
    let (store, ids) = store_with_notes(&[
        ("Warp Strike", "teleport follow-ups"),
        ("Oki", "meaty then warp cancel on block"),
        ("Unrelated", "nothing here"),
    ]);

    let hits = store.search_files("warp");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, ids[0]);
    assert_eq!(hits[0].match_kind, MatchKind::Title);
    assert_eq!(hits[1].id, ids[1]);
    assert_eq!(hits[1].match_kind, MatchKind::Content);
    assert_eq!(hits[1].title, "Oki");
    assert_eq!(hits[1].path, "SF6 > JP > Strategy");
}

#[test]
fn blank_queries_return_empty_list() {
    let (store, _) = store_with_notes(&[("   ", "   ")]);
    assert!(store.search_files("").is_empty());
    assert!(store.search_files("   ").is_empty());
}

#[test]
fn file_matching_title_and_content_is_reported_once_as_title() {
    let (store, _) = store_with_notes(&[("Drive Impact", "drive impact on wakeup")]);
    let hits = store.search_files("drive impact");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].match_kind, MatchKind::Title);
}

#[test]
fn hits_serialize_with_match_kind_key() {
    let (store, ids) = store_with_notes(&[("Anti-air", "")]);
    let hits = store.search_files("ANTI");
    let encoded = serde_json::to_value(&hits[0]).unwrap();
    assert_eq!(
        encoded,
        json!({
            "id": ids[0],
            "title": "Anti-air",
            "path": "SF6 > JP > Strategy",
            "matchKind": "title"
        })
    );
}

#[test]
fn orphaned_file_has_empty_path() {
    let mut store = NoteStore::open(MemoryKeyValueStore::new()).unwrap();
    store
        .import_data(
            &json!({
                "games": [],
                "files": [{ "id": "lost", "title": "Lost note", "content": "", "categoryId": "gone" }]
            })
            .to_string(),
        )
        .unwrap();

    assert!(store.get_file("lost").is_some());
    assert_eq!(store.get_file_path("lost"), "");
    assert_eq!(store.get_file_path("never-existed"), "");
    let hits = store.search_files("lost");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "");
}
