//! Highlight overlay
//!
//! Session-scoped selection handling plus the apply, restore and remove
//! entry points over a single document.

mod engine;
mod session;

pub use engine::{OverlayConfig, OverlayEngine, OverlayError, RestoreFailure, RestoreReport};
pub use session::{SelectionSession, ToolbarHandle};
