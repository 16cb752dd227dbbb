//! Note file record.

use super::EntityId;
use serde::{Deserialize, Serialize};

/// Single markdown-flavored note owned by one category.
///
/// Files live in a flat collection; categories reference them by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredNoteFile")]
pub struct NoteFile {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub category_id: EntityId,
    pub created_at: String,
    pub last_modified: String,
}

/// Lenient input shape of [`NoteFile`].
///
/// Older exports wrote the title as `name`, and some wrote both keys after a
/// partial update; `title` wins when both are present. Missing or `null`
/// text fields decode as empty strings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNoteFile {
    id: EntityId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    content: Option<String>,
    category_id: EntityId,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_modified: Option<String>,
}

impl From<StoredNoteFile> for NoteFile {
    fn from(stored: StoredNoteFile) -> Self {
        Self {
            id: stored.id,
            title: stored.title.or(stored.name).unwrap_or_default(),
            content: stored.content.unwrap_or_default(),
            category_id: stored.category_id,
            created_at: stored.created_at.unwrap_or_default(),
            last_modified: stored.last_modified.unwrap_or_default(),
        }
    }
}

impl NoteFile {
    /// Length of `content` in UTF-16 code units.
    ///
    /// This is the unit the editor counts in, so statistics stay comparable
    /// with what the user sees.
    pub fn content_len(&self) -> usize {
        self.content.encode_utf16().count()
    }
}

/// Partial update for [`NoteFile`]. `None` leaves a field untouched.
///
/// The owning category is not updatable; moving a note means delete + create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl FileUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NoteFile;

    fn file_with(content: &str) -> NoteFile {
        NoteFile {
            id: "f1".to_string(),
            title: "t".to_string(),
            content: content.to_string(),
            category_id: "c1".to_string(),
            created_at: String::new(),
            last_modified: String::new(),
        }
    }

    #[test]
    fn content_len_counts_utf16_units() {
        assert_eq!(file_with("5 hits").content_len(), 6);
        assert_eq!(file_with("波動拳").content_len(), 3);
        assert_eq!(file_with("↓↘→ + P").content_len(), 7);
    }

    #[test]
    fn legacy_name_key_is_accepted_as_title() {
        let file: NoteFile = serde_json::from_str(
            r#"{"id":"f1","name":"Old","content":"x","categoryId":"c1"}"#,
        )
        .expect("legacy file should decode");
        assert_eq!(file.title, "Old");

        let encoded = serde_json::to_value(&file).expect("file should encode");
        assert_eq!(encoded["title"], "Old");
        assert!(encoded.get("name").is_none());
    }

    #[test]
    fn title_key_wins_when_legacy_name_is_also_present() {
        let file: NoteFile = serde_json::from_str(
            r#"{"id":"f1","title":"New","name":"Old","categoryId":"c1"}"#,
        )
        .expect("file with both keys should decode");
        assert_eq!(file.title, "New");

        let file: NoteFile = serde_json::from_str(
            r#"{"id":"f1","title":null,"name":"Old","categoryId":"c1"}"#,
        )
        .expect("null title should fall back to name");
        assert_eq!(file.title, "Old");
    }

    #[test]
    fn null_text_fields_decode_as_empty() {
        let file: NoteFile = serde_json::from_str(
            r#"{"id":"f1","title":"BnB","content":null,"categoryId":"c1","createdAt":null}"#,
        )
        .expect("null content should decode");
        assert_eq!(file.content, "");
        assert_eq!(file.created_at, "");
        assert_eq!(file.content_len(), 0);
    }
}
