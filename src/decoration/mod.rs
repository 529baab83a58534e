//! Highlight decorations
//!
//! Visual markers inserted into the document tree around highlighted text.

mod applicator;
mod style;

pub use applicator::{ApplyOutcome, DecorationError, Decorator};
pub use style::{DecorationConfig, DecorationStyle};
