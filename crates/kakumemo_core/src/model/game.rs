//! Game, character and category records.
//!
//! These are the materialized (nested) shapes written to storage. In memory
//! the store keeps them flattened in an id-keyed arena; see `crate::tree`.

use super::EntityId;
use serde::{Deserialize, Serialize};

/// Top-level grouping for one fighting title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: EntityId,
    pub name: String,
    /// Characters in creation order.
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_modified: String,
}

/// Playable character within a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: EntityId,
    pub name: String,
    pub game_id: EntityId,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_modified: String,
}

/// Named grouping of notes under a character, e.g. "Combos".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub character_id: EntityId,
    /// Ids into the flat file collection, in insertion order.
    #[serde(default)]
    pub files: Vec<EntityId>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_modified: String,
}

/// Partial update for [`Game`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub name: Option<String>,
}
