//! Flutter-facing bindings for the note store.

pub mod api;
