//! Substring search over the flat file collection.
//!
//! # Invariants
//! - Blank queries return no hits and do not scan.
//! - Each file appears at most once; a title match wins over a content match.
//! - Hits follow file-collection order.

use crate::model::EntityId;
use crate::tree::NoteTree;
use serde::{Deserialize, Serialize};

/// Which field produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Title,
    Content,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
        }
    }
}

/// Single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchHit {
    pub id: EntityId,
    pub title: String,
    /// `"Game > Character > Category"`, empty for orphaned files.
    pub path: String,
    pub match_kind: MatchKind,
}

/// Searches file titles, then contents, for `query`.
///
/// Matching lowercases both sides; the query is otherwise used as given.
pub fn search_files(tree: &NoteTree, query: &str) -> Vec<FileSearchHit> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    tree.files()
        .filter_map(|file| {
            let match_kind = if file.title.to_lowercase().contains(&needle) {
                MatchKind::Title
            } else if file.content.to_lowercase().contains(&needle) {
                MatchKind::Content
            } else {
                return None;
            };
            Some(FileSearchHit {
                id: file.id.clone(),
                title: file.title.clone(),
                path: tree.file_path(&file.id),
                match_kind,
            })
        })
        .collect()
}
