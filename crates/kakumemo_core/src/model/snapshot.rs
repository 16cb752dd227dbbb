//! Whole-store snapshot: the persisted and exported JSON document.
//!
//! # Invariants
//! - Top-level keys are exactly `games`, `files` and `settings`.
//! - Overlay merge is shallow: an incoming top-level key replaces the base
//!   key wholesale.

use super::file::NoteFile;
use super::game::Game;
use super::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub games: Vec<Game>,
    pub files: Vec<NoteFile>,
    pub settings: Settings,
}

impl StoreSnapshot {
    /// Overlays `incoming` top-level keys onto this snapshot and decodes the
    /// result.
    ///
    /// Unknown top-level keys in `incoming` are ignored on decode.
    pub fn overlay(&self, incoming: Map<String, Value>) -> serde_json::Result<StoreSnapshot> {
        let mut base = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in incoming {
            base.insert(key, value);
        }
        serde_json::from_value(Value::Object(base))
    }
}
