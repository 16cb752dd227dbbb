//! Domain model for the game → character → category → file hierarchy.
//!
//! # Responsibility
//! - Define the serde shapes of the persisted snapshot.
//! - Define partial-update inputs accepted by the store.
//!
//! # Invariants
//! - Field names serialize in camelCase to match the stored JSON layout.
//! - Every entity id is unique across all entity kinds.

pub mod file;
pub mod game;
pub mod settings;
pub mod snapshot;

use std::fmt::{Display, Formatter};

/// Stable identifier shared by every entity kind.
pub type EntityId = String;

/// Entity kind, used to qualify lookups and not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Game,
    Character,
    Category,
    File,
}

impl EntityKind {
    /// Returns the lowercase label used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Character => "character",
            Self::Category => "category",
            Self::File => "file",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
