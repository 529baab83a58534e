//! Selection anchor builder
//!
//! Turns a live selection into a [`SelectionAnchor`]. Element endpoints are
//! first moved onto concrete text nodes: the start onto the first text node
//! intersecting the selection, the end onto the last one.

use std::cmp::Ordering;

use thiserror::Error;

use super::path::{compute_path, PathError, PathOptions};
use super::types::{SelectionAnchor, TextAnchorPoint};
use crate::dom::{compare_points, BoundaryPoint, Document, NodeId, Range};

/// Errors converting a selection into an anchor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("Selection is collapsed")]
    Collapsed,

    #[error("Selection does not touch any text node")]
    NoTextNode,

    #[error("Selection start resolves after its end")]
    InvertedRange,

    #[error("Selection container is not attached to the document")]
    Unrooted,

    #[error("Offset {offset} exceeds container length {length}")]
    OffsetOutOfBounds { offset: usize, length: usize },
}

impl From<PathError> for AnchorError {
    fn from(_: PathError) -> Self {
        // Computing a path only fails for detached nodes
        AnchorError::Unrooted
    }
}

/// Result of anchoring a selection
#[derive(Debug, Clone)]
pub struct AnchorCapture {
    pub anchor: SelectionAnchor,
    /// The selection with both ends on text nodes
    pub range: Range,
    /// Selected text snapshot
    pub text: String,
}

fn check_point(doc: &Document, point: &BoundaryPoint) -> Result<(), AnchorError> {
    if !doc.is_attached(point.node) {
        return Err(AnchorError::Unrooted);
    }
    let length = doc.node_length(point.node);
    if point.offset > length {
        return Err(AnchorError::OffsetOutOfBounds {
            offset: point.offset,
            length,
        });
    }
    Ok(())
}

/// Zero-based index of `text` among its parent's text children
pub fn text_node_index(doc: &Document, text: NodeId) -> usize {
    let mut index = 0;
    let mut sibling = doc.previous_sibling(text);
    while let Some(node) = sibling {
        if doc.is_text(node) {
            index += 1;
        }
        sibling = doc.previous_sibling(node);
    }
    index
}

fn anchor_point(
    doc: &Document,
    text: NodeId,
    offset: usize,
    options: PathOptions,
) -> Result<TextAnchorPoint, AnchorError> {
    let parent = doc.parent(text).ok_or(AnchorError::Unrooted)?;
    let path = compute_path(doc, parent, options)?;
    Ok(TextAnchorPoint::new(path, text_node_index(doc, text), offset))
}

/// Build a durable anchor for `selection`
pub fn build_anchor(
    doc: &Document,
    selection: &Range,
    options: PathOptions,
) -> Result<AnchorCapture, AnchorError> {
    if selection.is_collapsed() {
        return Err(AnchorError::Collapsed);
    }
    check_point(doc, &selection.start)?;
    check_point(doc, &selection.end)?;

    let start_text = if doc.is_text(selection.start.node) {
        selection.start.node
    } else {
        selection
            .text_nodes(doc)
            .next()
            .ok_or(AnchorError::NoTextNode)?
    };
    let end_text = if doc.is_text(selection.end.node) {
        selection.end.node
    } else {
        selection
            .text_nodes(doc)
            .last()
            .ok_or(AnchorError::NoTextNode)?
    };

    let start_offset = if selection.start.node == start_text {
        selection.start.offset
    } else {
        0
    };
    let end_offset = if selection.end.node == end_text {
        selection.end.offset
    } else {
        doc.node_length(end_text)
    };

    let start = BoundaryPoint::new(start_text, start_offset);
    let end = BoundaryPoint::new(end_text, end_offset);
    if compare_points(doc, &start, &end) == Ordering::Greater {
        return Err(AnchorError::InvertedRange);
    }

    let range = Range::new(start, end);
    let anchor = SelectionAnchor::new(
        anchor_point(doc, start_text, start_offset, options)?,
        anchor_point(doc, end_text, end_offset, options)?,
    );
    tracing::debug!(
        "Anchored selection {} #{}:{} .. {} #{}:{}",
        anchor.start().path,
        anchor.start().text_node_index,
        anchor.start().offset,
        anchor.end().path,
        anchor.end().text_node_index,
        anchor.end().offset
    );

    Ok(AnchorCapture {
        anchor,
        range,
        text: range.text(doc),
    })
}
