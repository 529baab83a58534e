//! Highlight records and their persistence
//!
//! - `types`: records, page collections and the edit reducer
//! - `store`: persistence backends (memory, SQLite)
//! - `facade`: upsert/delete merge policy over a backend
//! - `service`: restore and apply-and-persist for documents

mod facade;
mod page_url;
mod service;
mod store;
mod types;

pub use facade::{HighlightStore, UpsertOutcome};
pub use service::{HighlightService, ServiceError};
pub use store::{create_pool, MemoryPageStore, PageStore, SqlitePageStore, StoreError};
pub use types::{
    reduce, reduce_all, HighlightDelta, HighlightRecord, PageRecord, PageSummary, StyleDelta,
};
