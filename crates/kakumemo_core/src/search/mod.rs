//! Note search entry points.
//!
//! # Responsibility
//! - Case-insensitive substring search over note titles and contents.
//! - Keep hit shaping (path, match kind) inside core.

pub mod file_search;
