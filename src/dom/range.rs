//! Boundary points and ranges over a [`Document`]
//!
//! A boundary point is `(node, offset)`: for a text node the offset counts
//! chars, for any other node it counts children. Points are ordered by a key
//! made of the node's child-index path from the root followed by the offset,
//! which reproduces DOM boundary-point ordering with a plain lexicographic
//! comparison.

use std::cmp::Ordering;

use indextree::NodeId;

use super::tree::{char_slice, Document};
use super::walker::TreeWalker;

/// A position inside the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A start/end pair of boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Range covering `[start, end)` chars of a single text node
    pub fn within(node: NodeId, start: usize, end: usize) -> Self {
        Self::new(BoundaryPoint::new(node, start), BoundaryPoint::new(node, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundary containers
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        doc.ancestors(self.start.node)
            .find(|&candidate| doc.is_inclusive_ancestor(candidate, self.end.node))
            .unwrap_or_else(|| doc.root())
    }

    /// Whether any part of `node` lies inside the range
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let Some(parent) = doc.parent(node) else {
            return true;
        };
        let offset = doc.index_in_parent(node);
        let before = BoundaryPoint::new(parent, offset);
        let after = BoundaryPoint::new(parent, offset + 1);

        compare_points(doc, &before, &self.end) == Ordering::Less
            && compare_points(doc, &after, &self.start) == Ordering::Greater
    }

    /// Text nodes under the common ancestor that intersect the range, lazily
    pub fn text_nodes<'a>(
        &'a self,
        doc: &'a Document,
    ) -> TreeWalker<'a, impl Fn(&Document, NodeId) -> bool + 'a> {
        TreeWalker::new(doc, self.common_ancestor(doc), move |doc, node| {
            doc.is_text(node) && self.intersects_node(doc, node)
        })
    }

    /// The `[start, end)` char span of `node` covered by this range
    pub fn clip(&self, doc: &Document, node: NodeId) -> (usize, usize) {
        let length = doc.node_length(node);
        let start = if node == self.start.node {
            self.start.offset.min(length)
        } else {
            0
        };
        let end = if node == self.end.node {
            self.end.offset.min(length)
        } else {
            length
        };
        (start, end.max(start))
    }

    /// Text covered by the range, in document order
    pub fn text(&self, doc: &Document) -> String {
        self.text_nodes(doc)
            .map(|node| {
                let (start, end) = self.clip(doc, node);
                char_slice(doc.text(node).unwrap_or_default(), start, end).to_string()
            })
            .collect()
    }
}

/// Child-index path of `node` from the document root
fn index_path(doc: &Document, node: NodeId) -> Vec<usize> {
    let mut path: Vec<usize> = doc
        .ancestors(node)
        .take_while(|&n| doc.parent(n).is_some())
        .map(|n| doc.index_in_parent(n))
        .collect();
    path.reverse();
    path
}

/// Sort key of a boundary point
pub fn boundary_key(doc: &Document, point: &BoundaryPoint) -> Vec<usize> {
    let mut key = index_path(doc, point.node);
    key.push(point.offset);
    key
}

/// Document-order comparison of two boundary points
pub fn compare_points(doc: &Document, a: &BoundaryPoint, b: &BoundaryPoint) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    boundary_key(doc, a).cmp(&boundary_key(doc, b))
}
