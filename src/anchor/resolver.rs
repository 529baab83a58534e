//! Anchor resolution
//!
//! Maps a stored [`SelectionAnchor`] back onto the current tree. Resolution
//! is a single pure attempt against the tree as it is at call time.

use std::cmp::Ordering;

use thiserror::Error;

use super::path::{resolve_path, PathError};
use super::types::{SelectionAnchor, TextAnchorPoint};
use crate::dom::{compare_points, BoundaryPoint, Document, NodeId, Range};

/// Errors mapping an anchor onto the current tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Path not found: {0}")]
    PathNotFound(#[from] PathError),

    #[error("Element at {path} has {available} text nodes, needed index {index}")]
    TextNodeNotFound {
        path: String,
        index: usize,
        available: usize,
    },

    #[error("Anchor start resolves after its end")]
    InvertedRange,

    #[error("Resolved text {found:?} does not match snapshot {expected:?}")]
    TextMismatch { expected: String, found: String },
}

/// A live range recovered from an anchor
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAnchor {
    pub range: Range,
    /// An offset had to be clamped to the text node's length
    pub degraded: bool,
}

impl ResolvedAnchor {
    /// Check the resolved text against a stored snapshot
    ///
    /// A degraded resolution also passes when its text is the snapshot cut
    /// short by the clamp, or equal to it up to whitespace.
    pub fn verify(&self, doc: &Document, expected: &str) -> Result<(), ResolveError> {
        let found = self.range.text(doc);
        if found == expected || (self.degraded && clamped_match(&found, expected)) {
            Ok(())
        } else {
            Err(ResolveError::TextMismatch {
                expected: expected.to_string(),
                found,
            })
        }
    }
}

fn clamped_match(found: &str, expected: &str) -> bool {
    if found.trim().is_empty() {
        return false;
    }
    let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    expected.starts_with(found) || expected.ends_with(found) || collapse(found) == collapse(expected)
}

/// The `index`th text child of `element`
pub fn text_child(doc: &Document, element: NodeId, index: usize) -> Option<NodeId> {
    doc.children(element)
        .filter(|&child| doc.is_text(child))
        .nth(index)
}

/// Resolve one end; returns the point and whether its offset was clamped
fn resolve_point(
    doc: &Document,
    point: &TextAnchorPoint,
) -> Result<(BoundaryPoint, bool), ResolveError> {
    let element = resolve_path(doc, &point.path)?;
    let text = text_child(doc, element, point.text_node_index).ok_or_else(|| {
        ResolveError::TextNodeNotFound {
            path: point.path.to_string(),
            index: point.text_node_index,
            available: doc.children(element).filter(|&c| doc.is_text(c)).count(),
        }
    })?;

    let length = doc.node_length(text);
    let clamped = point.offset > length;
    Ok((BoundaryPoint::new(text, point.offset.min(length)), clamped))
}

/// Resolve a stored anchor into a live range
pub fn resolve_anchor(
    doc: &Document,
    anchor: &SelectionAnchor,
) -> Result<ResolvedAnchor, ResolveError> {
    let (start, start_clamped) = resolve_point(doc, anchor.start())?;
    let (end, end_clamped) = resolve_point(doc, anchor.end())?;

    if compare_points(doc, &start, &end) == Ordering::Greater {
        return Err(ResolveError::InvertedRange);
    }

    let degraded = start_clamped || end_clamped;
    if degraded {
        tracing::warn!(
            "Clamped anchor offsets for {} .. {}",
            anchor.start().path,
            anchor.end().path
        );
    }

    Ok(ResolvedAnchor {
        range: Range::new(start, end),
        degraded,
    })
}
