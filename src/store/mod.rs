//! JSON-document knowledge store.
//!
//! Persists the knowledge graph, user profile, activity log, content cache,
//! and chat sessions as separate JSON documents under one data directory.

mod documents;
mod error;
#[allow(clippy::module_inception)]
mod store;

pub use documents::*;
pub use error::*;
pub use store::*;
