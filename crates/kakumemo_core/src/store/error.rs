//! Store-level error types.

use crate::model::{EntityId, EntityKind};
use crate::repo::kv_repo::KvRepoError;
use crate::tree::TreeError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation.
///
/// `NotFound` and `Validation` leave both memory and storage untouched.
/// `Persistence` on a mutation also leaves memory untouched: the staged change
/// is dropped when the flush fails.
#[derive(Debug)]
pub enum StoreError {
    /// Entity id did not resolve.
    NotFound { kind: EntityKind, id: EntityId },
    /// Import payload or staged state is malformed.
    Validation(String),
    /// Reading or writing the persistent snapshot failed.
    Persistence(PersistenceError),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Stable machine-readable error code for UI surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Validation(message) => write!(f, "invalid data: {message}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Storage-side failure details.
#[derive(Debug)]
pub enum PersistenceError {
    /// Backend read/write failed.
    Storage(KvRepoError),
    /// Snapshot could not be serialized.
    Encode(serde_json::Error),
    /// Stored text is not a decodable snapshot.
    CorruptSnapshot(serde_json::Error),
    /// Stored snapshot decodes but breaks hierarchy invariants.
    InvalidSnapshot(TreeError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::CorruptSnapshot(err) => write!(f, "stored snapshot is corrupt: {err}"),
            Self::InvalidSnapshot(err) => write!(f, "stored snapshot is inconsistent: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::CorruptSnapshot(err) => Some(err),
            Self::InvalidSnapshot(err) => Some(err),
        }
    }
}

impl From<KvRepoError> for PersistenceError {
    fn from(value: KvRepoError) -> Self {
        Self::Storage(value)
    }
}
