//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value storage contract the store flushes snapshots into.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Repository APIs surface backend failures unmodified; nothing is
//!   swallowed or retried here.

pub mod kv_repo;
