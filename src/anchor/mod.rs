//! Text anchoring module
//!
//! Converts live selections into structure-based anchors that survive a
//! reload, and resolves stored anchors back into live ranges.
//!
//! # Overview
//!
//! An anchor stores, for each end of a selection, the structural path of the
//! element holding the text, the index of the text node among that element's
//! text children, and a char offset:
//!
//! ```text
//! /html[1]/body[1]/p[2]  #0  :6
//! │                      │   └── char offset in the text node
//! │                      └────── first text child of the element
//! └───────────────────────────── element path
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use crate::anchor::{build_anchor, resolve_anchor, PathOptions};
//!
//! let capture = build_anchor(&doc, &selection, PathOptions::default())?;
//! // ... persist capture.anchor, reload the page ...
//! let resolved = resolve_anchor(&reloaded, &capture.anchor)?;
//! ```

mod builder;
mod path;
mod resolver;
mod types;

pub use builder::{build_anchor, text_node_index, AnchorCapture, AnchorError};
pub use path::{
    compute_path, resolve_path, PathError, PathOptions, PathParseError, PathStep, StructuralPath,
};
pub use resolver::{resolve_anchor, text_child, ResolveError, ResolvedAnchor};
pub use types::{SelectionAnchor, TextAnchorPoint};
