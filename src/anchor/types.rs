//! Anchor types
//!
//! The serialized form is the persisted wire format for stored highlights:
//!
//! ```json
//! {
//!   "start": { "xpath": "/html[1]/body[1]/p[2]", "textIndex": 0, "offset": 6 },
//!   "end":   { "xpath": "/html[1]/body[1]/p[3]", "textIndex": 0, "offset": 5 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::path::StructuralPath;

/// One end of a selection, relative to an element's text children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnchorPoint {
    /// Path of the element holding the text node
    #[serde(rename = "xpath")]
    pub path: StructuralPath,
    /// Zero-based index among the element's text children only
    #[serde(rename = "textIndex")]
    pub text_node_index: usize,
    /// Char offset within that text node
    pub offset: usize,
}

impl TextAnchorPoint {
    pub fn new(path: StructuralPath, text_node_index: usize, offset: usize) -> Self {
        Self {
            path,
            text_node_index,
            offset,
        }
    }
}

/// A durable start/end anchor for a text selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionAnchor {
    start: TextAnchorPoint,
    end: TextAnchorPoint,
}

impl SelectionAnchor {
    pub fn new(start: TextAnchorPoint, end: TextAnchorPoint) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> &TextAnchorPoint {
        &self.start
    }

    pub fn end(&self) -> &TextAnchorPoint {
        &self.end
    }

    /// Whether both ends sit in the same text node
    pub fn is_single_node(&self) -> bool {
        self.start.path == self.end.path && self.start.text_node_index == self.end.text_node_index
    }
}
