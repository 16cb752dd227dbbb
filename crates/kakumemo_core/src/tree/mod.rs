//! Id-keyed arena for the game → character → category → file hierarchy.
//!
//! # Responsibility
//! - Hold every entity exactly once, keyed by id.
//! - Express every relationship as an id reference (children lists plus
//!   parent links), so lookups by id and upward traversal are O(1) per hop.
//! - Convert from/to the nested [`StoreSnapshot`] layout.
//!
//! # Invariants
//! - Ids are unique across all four maps.
//! - Every id in a category's `file_ids` exists in `files`, and
//!   `file_owner[file] == category` for each of them.
//! - A file is referenced by at most one category; unreferenced files are
//!   orphans and have no owner.
//! - `game_order` / `file_order` list exactly the keys of `games` / `files`.

use crate::model::file::{FileUpdate, NoteFile};
use crate::model::game::{Category, Character, Game, GameUpdate};
use crate::model::settings::Settings;
use crate::model::snapshot::StoreSnapshot;
use crate::model::{EntityId, EntityKind};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator used by [`NoteTree::file_path`].
pub const PATH_SEPARATOR: &str = " > ";

/// Structural errors raised by arena mutations and snapshot decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: EntityId },
    /// Id already used by another entity of any kind.
    DuplicateId(EntityId),
    /// Category lists a file id that is not in the file collection.
    DanglingFileRef {
        category_id: EntityId,
        file_id: EntityId,
    },
    /// File id listed by more than one category entry.
    SharedFileRef(EntityId),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::DuplicateId(id) => write!(f, "duplicate entity id: {id}"),
            Self::DanglingFileRef {
                category_id,
                file_id,
            } => write!(
                f,
                "category {category_id} references missing file {file_id}"
            ),
            Self::SharedFileRef(id) => {
                write!(f, "file {id} is referenced by more than one category entry")
            }
        }
    }
}

impl Error for TreeError {}

#[derive(Debug, Clone)]
struct GameNode {
    name: String,
    character_ids: Vec<EntityId>,
    created_at: String,
    last_modified: String,
}

#[derive(Debug, Clone)]
struct CharacterNode {
    name: String,
    game_id: EntityId,
    category_ids: Vec<EntityId>,
    created_at: String,
    last_modified: String,
}

#[derive(Debug, Clone)]
struct CategoryNode {
    name: String,
    character_id: EntityId,
    file_ids: Vec<EntityId>,
    created_at: String,
    last_modified: String,
}

/// Flattened in-memory hierarchy.
#[derive(Debug, Clone, Default)]
pub struct NoteTree {
    game_order: Vec<EntityId>,
    games: HashMap<EntityId, GameNode>,
    characters: HashMap<EntityId, CharacterNode>,
    categories: HashMap<EntityId, CategoryNode>,
    file_order: Vec<EntityId>,
    files: HashMap<EntityId, NoteFile>,
    file_owner: HashMap<EntityId, EntityId>,
}

impl NoteTree {
    /// Builds an arena from the nested snapshot layout.
    ///
    /// Parent ids stored on children (`gameId`, `characterId`) are taken from
    /// the actual nesting, not from the stored field.
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Result<Self, TreeError> {
        let mut tree = Self::default();
        let mut seen = HashSet::new();

        for game in &snapshot.games {
            claim_id(&mut seen, &game.id)?;
            let mut character_ids = Vec::with_capacity(game.characters.len());
            for character in &game.characters {
                claim_id(&mut seen, &character.id)?;
                let mut category_ids = Vec::with_capacity(character.categories.len());
                for category in &character.categories {
                    claim_id(&mut seen, &category.id)?;
                    tree.categories.insert(
                        category.id.clone(),
                        CategoryNode {
                            name: category.name.clone(),
                            character_id: character.id.clone(),
                            file_ids: category.files.clone(),
                            created_at: category.created_at.clone(),
                            last_modified: category.last_modified.clone(),
                        },
                    );
                    category_ids.push(category.id.clone());
                }
                tree.characters.insert(
                    character.id.clone(),
                    CharacterNode {
                        name: character.name.clone(),
                        game_id: game.id.clone(),
                        category_ids,
                        created_at: character.created_at.clone(),
                        last_modified: character.last_modified.clone(),
                    },
                );
                character_ids.push(character.id.clone());
            }
            tree.games.insert(
                game.id.clone(),
                GameNode {
                    name: game.name.clone(),
                    character_ids,
                    created_at: game.created_at.clone(),
                    last_modified: game.last_modified.clone(),
                },
            );
            tree.game_order.push(game.id.clone());
        }

        for file in &snapshot.files {
            claim_id(&mut seen, &file.id)?;
            tree.files.insert(file.id.clone(), file.clone());
            tree.file_order.push(file.id.clone());
        }

        for (category_id, category) in &tree.categories {
            for file_id in &category.file_ids {
                if !tree.files.contains_key(file_id) {
                    return Err(TreeError::DanglingFileRef {
                        category_id: category_id.clone(),
                        file_id: file_id.clone(),
                    });
                }
                if tree
                    .file_owner
                    .insert(file_id.clone(), category_id.clone())
                    .is_some()
                {
                    return Err(TreeError::SharedFileRef(file_id.clone()));
                }
                if let Some(file) = tree.files.get_mut(file_id) {
                    file.category_id = category_id.clone();
                }
            }
        }

        Ok(tree)
    }

    /// Materializes the nested snapshot layout, preserving every order.
    pub fn to_snapshot(&self, settings: &Settings) -> StoreSnapshot {
        StoreSnapshot {
            games: self.games(),
            files: self.files().cloned().collect(),
            settings: settings.clone(),
        }
    }

    /// Returns whether any entity of any kind uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.games.contains_key(id)
            || self.characters.contains_key(id)
            || self.categories.contains_key(id)
            || self.files.contains_key(id)
    }

    pub fn game_count(&self) -> usize {
        self.game_order.len()
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn file_count(&self) -> usize {
        self.file_order.len()
    }

    /// All games in creation order.
    pub fn games(&self) -> Vec<Game> {
        self.game_order
            .iter()
            .filter_map(|id| self.game(id))
            .collect()
    }

    pub fn game(&self, id: &str) -> Option<Game> {
        let node = self.games.get(id)?;
        Some(Game {
            id: id.to_string(),
            name: node.name.clone(),
            characters: node
                .character_ids
                .iter()
                .filter_map(|character_id| self.character_by_id(character_id))
                .collect(),
            created_at: node.created_at.clone(),
            last_modified: node.last_modified.clone(),
        })
    }

    /// Looks up a character scoped to its owning game.
    pub fn character(&self, game_id: &str, id: &str) -> Option<Character> {
        let node = self.characters.get(id)?;
        if node.game_id != game_id {
            return None;
        }
        self.character_by_id(id)
    }

    fn character_by_id(&self, id: &str) -> Option<Character> {
        let node = self.characters.get(id)?;
        Some(Character {
            id: id.to_string(),
            name: node.name.clone(),
            game_id: node.game_id.clone(),
            categories: node
                .category_ids
                .iter()
                .filter_map(|category_id| self.category(category_id))
                .collect(),
            created_at: node.created_at.clone(),
            last_modified: node.last_modified.clone(),
        })
    }

    pub fn category(&self, id: &str) -> Option<Category> {
        let node = self.categories.get(id)?;
        Some(Category {
            id: id.to_string(),
            name: node.name.clone(),
            character_id: node.character_id.clone(),
            files: node.file_ids.clone(),
            created_at: node.created_at.clone(),
            last_modified: node.last_modified.clone(),
        })
    }

    pub fn file(&self, id: &str) -> Option<&NoteFile> {
        self.files.get(id)
    }

    /// Files in collection order.
    pub fn files(&self) -> impl Iterator<Item = &NoteFile> + '_ {
        self.file_order.iter().filter_map(|id| self.files.get(id))
    }

    /// Returns `"Game > Character > Category"` for an owned file, or an empty
    /// string for unknown and orphaned files.
    pub fn file_path(&self, file_id: &str) -> String {
        let Some(category_id) = self.file_owner.get(file_id) else {
            return String::new();
        };
        let Some(category) = self.categories.get(category_id) else {
            return String::new();
        };
        let Some(character) = self.characters.get(&category.character_id) else {
            return String::new();
        };
        let Some(game) = self.games.get(&character.game_id) else {
            return String::new();
        };
        [
            game.name.as_str(),
            character.name.as_str(),
            category.name.as_str(),
        ]
        .join(PATH_SEPARATOR)
    }

    /// Sum of content lengths (UTF-16 units) across all files.
    pub fn total_content_len(&self) -> usize {
        self.files.values().map(NoteFile::content_len).sum()
    }

    pub fn add_game(&mut self, id: EntityId, name: String, now: &str) -> Result<Game, TreeError> {
        self.ensure_unused(&id)?;
        self.games.insert(
            id.clone(),
            GameNode {
                name,
                character_ids: Vec::new(),
                created_at: now.to_string(),
                last_modified: now.to_string(),
            },
        );
        self.game_order.push(id.clone());
        self.game(&id).ok_or(TreeError::NotFound {
            kind: EntityKind::Game,
            id,
        })
    }

    pub fn add_character(
        &mut self,
        game_id: &str,
        id: EntityId,
        name: String,
        now: &str,
    ) -> Result<Character, TreeError> {
        if !self.games.contains_key(game_id) {
            return Err(not_found(EntityKind::Game, game_id));
        }
        self.ensure_unused(&id)?;
        self.characters.insert(
            id.clone(),
            CharacterNode {
                name,
                game_id: game_id.to_string(),
                category_ids: Vec::new(),
                created_at: now.to_string(),
                last_modified: now.to_string(),
            },
        );
        if let Some(game) = self.games.get_mut(game_id) {
            game.character_ids.push(id.clone());
            game.last_modified = now.to_string();
        }
        self.character_by_id(&id)
            .ok_or_else(|| not_found(EntityKind::Character, &id))
    }

    pub fn add_category(
        &mut self,
        character_id: &str,
        id: EntityId,
        name: String,
        now: &str,
    ) -> Result<Category, TreeError> {
        if !self.characters.contains_key(character_id) {
            return Err(not_found(EntityKind::Character, character_id));
        }
        self.ensure_unused(&id)?;
        self.categories.insert(
            id.clone(),
            CategoryNode {
                name,
                character_id: character_id.to_string(),
                file_ids: Vec::new(),
                created_at: now.to_string(),
                last_modified: now.to_string(),
            },
        );
        if let Some(character) = self.characters.get_mut(character_id) {
            character.category_ids.push(id.clone());
        }
        self.touch_character_chain(character_id, now);
        self.category(&id)
            .ok_or_else(|| not_found(EntityKind::Category, &id))
    }

    pub fn add_file(
        &mut self,
        category_id: &str,
        id: EntityId,
        title: String,
        content: String,
        now: &str,
    ) -> Result<NoteFile, TreeError> {
        if !self.categories.contains_key(category_id) {
            return Err(not_found(EntityKind::Category, category_id));
        }
        self.ensure_unused(&id)?;
        let file = NoteFile {
            id: id.clone(),
            title,
            content,
            category_id: category_id.to_string(),
            created_at: now.to_string(),
            last_modified: now.to_string(),
        };
        self.files.insert(id.clone(), file.clone());
        self.file_order.push(id.clone());
        self.file_owner.insert(id.clone(), category_id.to_string());
        if let Some(category) = self.categories.get_mut(category_id) {
            category.file_ids.push(id);
        }
        self.touch_category_chain(category_id, now);
        Ok(file)
    }

    /// Merges provided fields into a game and touches only that game.
    pub fn update_game(
        &mut self,
        id: &str,
        update: GameUpdate,
        now: &str,
    ) -> Result<Game, TreeError> {
        let node = self
            .games
            .get_mut(id)
            .ok_or_else(|| not_found(EntityKind::Game, id))?;
        if let Some(name) = update.name {
            node.name = name;
        }
        node.last_modified = now.to_string();
        self.game(id).ok_or_else(|| not_found(EntityKind::Game, id))
    }

    /// Merges provided fields into a file and touches only that file.
    ///
    /// Ancestor timestamps are left alone; only structural changes propagate.
    pub fn update_file(
        &mut self,
        id: &str,
        update: FileUpdate,
        now: &str,
    ) -> Result<NoteFile, TreeError> {
        let file = self
            .files
            .get_mut(id)
            .ok_or_else(|| not_found(EntityKind::File, id))?;
        if let Some(title) = update.title {
            file.title = title;
        }
        if let Some(content) = update.content {
            file.content = content;
        }
        file.last_modified = now.to_string();
        Ok(file.clone())
    }

    /// Removes a file and unlinks it from its owning category, touching the
    /// category chain when an owner existed.
    pub fn remove_file(&mut self, id: &str, now: &str) -> Result<NoteFile, TreeError> {
        let file = self
            .files
            .remove(id)
            .ok_or_else(|| not_found(EntityKind::File, id))?;
        self.file_order.retain(|file_id| file_id != id);
        if let Some(category_id) = self.file_owner.remove(id) {
            if let Some(category) = self.categories.get_mut(&category_id) {
                category.file_ids.retain(|file_id| file_id != id);
            }
            self.touch_category_chain(&category_id, now);
        }
        Ok(file)
    }

    /// Removes a game with every character, category and file below it.
    ///
    /// Returns the number of files removed.
    pub fn remove_game(&mut self, id: &str, now: &str) -> Result<usize, TreeError> {
        let game = self
            .games
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Game, id))?;

        let mut removed_files = 0;
        for character_id in &game.character_ids {
            let Some(character) = self.characters.remove(character_id) else {
                continue;
            };
            for category_id in &character.category_ids {
                let file_ids = self
                    .categories
                    .get(category_id)
                    .map(|category| category.file_ids.clone())
                    .unwrap_or_default();
                for file_id in file_ids {
                    self.remove_file(&file_id, now)?;
                    removed_files += 1;
                }
                self.categories.remove(category_id);
            }
        }

        self.games.remove(id);
        self.game_order.retain(|game_id| game_id != id);
        Ok(removed_files)
    }

    fn ensure_unused(&self, id: &str) -> Result<(), TreeError> {
        if self.contains_id(id) {
            return Err(TreeError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    fn touch_category_chain(&mut self, category_id: &str, now: &str) {
        let Some(category) = self.categories.get_mut(category_id) else {
            return;
        };
        category.last_modified = now.to_string();
        let character_id = category.character_id.clone();
        self.touch_character_chain(&character_id, now);
    }

    fn touch_character_chain(&mut self, character_id: &str, now: &str) {
        let Some(character) = self.characters.get_mut(character_id) else {
            return;
        };
        character.last_modified = now.to_string();
        if let Some(game) = self.games.get_mut(&character.game_id) {
            game.last_modified = now.to_string();
        }
    }
}

fn claim_id(seen: &mut HashSet<EntityId>, id: &str) -> Result<(), TreeError> {
    if !seen.insert(id.to_string()) {
        return Err(TreeError::DuplicateId(id.to_string()));
    }
    Ok(())
}

fn not_found(kind: EntityKind, id: &str) -> TreeError {
    TreeError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteTree, TreeError};
    use crate::model::settings::Settings;
    use crate::model::snapshot::StoreSnapshot;
    use crate::model::EntityKind;
    use serde_json::json;

    const T0: &str = "2024-05-01T12:00:00.000Z";
    const T1: &str = "2024-05-01T12:00:01.000Z";

    fn sample_tree() -> NoteTree {
        let mut tree = NoteTree::default();
        tree.add_game("g1".into(), "SF6".into(), T0).unwrap();
        tree.add_character("g1", "ch1".into(), "Ryu".into(), T0)
            .unwrap();
        tree.add_category("ch1", "cat1".into(), "Combos".into(), T0)
            .unwrap();
        tree.add_file("cat1", "f1".into(), "BnB".into(), "5 hits".into(), T0)
            .unwrap();
        tree
    }

    #[test]
    fn file_path_walks_parent_links() {
        let tree = sample_tree();
        assert_eq!(tree.file_path("f1"), "SF6 > Ryu > Combos");
        assert_eq!(tree.file_path("missing"), "");
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut tree = sample_tree();
        let err = tree
            .add_category("ch1", "f1".into(), "Dup".into(), T1)
            .unwrap_err();
        assert_eq!(err, TreeError::DuplicateId("f1".to_string()));
    }

    #[test]
    fn remove_file_touches_category_chain() {
        let mut tree = sample_tree();
        tree.remove_file("f1", T1).unwrap();

        let game = tree.game("g1").unwrap();
        assert_eq!(game.last_modified, T1);
        assert_eq!(game.characters[0].last_modified, T1);
        assert_eq!(game.characters[0].categories[0].last_modified, T1);
        assert!(game.characters[0].categories[0].files.is_empty());
    }

    #[test]
    fn remove_game_drops_every_descendant() {
        let mut tree = sample_tree();
        let removed = tree.remove_game("g1", T1).unwrap();
        assert_eq!(removed, 1);
        assert!(!tree.contains_id("g1"));
        assert!(!tree.contains_id("ch1"));
        assert!(!tree.contains_id("cat1"));
        assert!(!tree.contains_id("f1"));
        assert_eq!(tree.file_count(), 0);
    }

    #[test]
    fn snapshot_roundtrip_preserves_layout() {
        let tree = sample_tree();
        let snapshot = tree.to_snapshot(&Settings::default());
        let rebuilt = NoteTree::from_snapshot(&snapshot).unwrap();
        assert_eq!(rebuilt.to_snapshot(&Settings::default()), snapshot);
    }

    #[test]
    fn from_snapshot_rejects_dangling_file_reference() {
        let snapshot: StoreSnapshot = serde_json::from_value(json!({
            "games": [{
                "id": "g1", "name": "SF6",
                "characters": [{
                    "id": "ch1", "name": "Ryu", "gameId": "g1",
                    "categories": [{
                        "id": "cat1", "name": "Combos", "characterId": "ch1",
                        "files": ["ghost"]
                    }]
                }]
            }],
            "files": []
        }))
        .unwrap();

        let err = NoteTree::from_snapshot(&snapshot).unwrap_err();
        assert_eq!(
            err,
            TreeError::DanglingFileRef {
                category_id: "cat1".to_string(),
                file_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn from_snapshot_keeps_orphan_files_without_path() {
        let snapshot: StoreSnapshot = serde_json::from_value(json!({
            "games": [],
            "files": [{ "id": "f9", "title": "Loose", "content": "", "categoryId": "gone" }]
        }))
        .unwrap();

        let tree = NoteTree::from_snapshot(&snapshot).unwrap();
        assert!(tree.file("f9").is_some());
        assert_eq!(tree.file_path("f9"), "");
    }

    #[test]
    fn add_character_requires_existing_game() {
        let mut tree = NoteTree::default();
        let err = tree
            .add_character("nope", "ch1".into(), "Ryu".into(), T0)
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::NotFound {
                kind: EntityKind::Game,
                id: "nope".to_string()
            }
        );
    }
}
