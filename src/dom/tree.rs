//! Arena-backed document tree
//!
//! Nodes live in an `indextree` arena and are addressed by `NodeId`. Nodes
//! that are taken out of the tree are only detached, never freed, so a
//! `NodeId` handed out earlier stays valid for the document's lifetime and
//! can be checked with [`Document::is_attached`].

use indextree::{Arena, NodeId};
use thiserror::Error;

/// Payload of a single tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The synthetic document node at the root of every tree
    Document,
    /// An element with a lowercase tag name
    Element(ElementData),
    /// A run of character data
    Text(String),
    /// A comment (kept so markup round-trips)
    Comment(String),
}

/// Element name and attributes, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Tree mutation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node is not a text node")]
    NotText,

    #[error("Offset {offset} is out of bounds for length {length}")]
    IndexSize { offset: usize, length: usize },

    #[error("Node has no parent")]
    NoParent,

    #[error("Range partially selects a non-text node")]
    PartialSelection,

    #[error("Invalid tree operation: {0}")]
    Hierarchy(String),
}

/// A mutable document tree
#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the document node
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Document);
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        self.arena[node].get()
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.arena
            .new_node(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(NodeData::Comment(text.into()))
    }

    // ---- node inspection ----

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.data(node), NodeData::Text(_))
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.data(node), NodeData::Element(_))
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.data(node) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.name.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Length in chars of a text node, or child count of any other node
    pub fn node_length(&self, node: NodeId) -> usize {
        match self.data(node) {
            NodeData::Text(text) | NodeData::Comment(text) => text.chars().count(),
            _ => self.children(node).count(),
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element(el) = self.arena[node].get_mut() {
            let value = value.into();
            match el.attrs.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value,
                None => el.attrs.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let NodeData::Element(el) = self.arena[node].get_mut() {
            el.attrs.retain(|(key, _)| key != name);
        }
    }

    // ---- navigation ----

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].parent()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].first_child()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].next_sibling()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].previous_sibling()
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(&self.arena)
    }

    /// Ancestors of `node`, starting with `node` itself
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena)
    }

    /// Pre-order descendants of `node`, starting with `node` itself
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    /// Whether `node` is still reachable from the document node
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == self.root)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Zero-based position of `node` among all of its parent's children
    pub fn index_in_parent(&self, node: NodeId) -> usize {
        node.preceding_siblings(&self.arena).count() - 1
    }

    pub fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).nth(index)
    }

    /// Concatenated text of all text descendants
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Elements whose attribute `name` equals `value`, in document order
    pub fn find_by_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&n| self.attr(n, name) == Some(value))
            .collect()
    }

    /// Element with the given `id`, only when exactly one element carries it
    pub fn unique_element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut matches = self
            .descendants(self.root)
            .filter(|&n| self.attr(n, "id") == Some(id));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    // ---- mutation ----

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|e| DomError::Hierarchy(format!("{:?}", e)))
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        if self.parent(reference).is_none() {
            return Err(DomError::NoParent);
        }
        reference
            .checked_insert_before(node, &mut self.arena)
            .map_err(|e| DomError::Hierarchy(format!("{:?}", e)))
    }

    /// Take `node` (with its subtree) out of the tree
    pub fn detach(&mut self, node: NodeId) {
        node.detach(&mut self.arena);
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match self.arena[node].get_mut() {
            NodeData::Text(existing) => {
                *existing = text.into();
                Ok(())
            }
            _ => Err(DomError::NotText),
        }
    }

    /// Split a text node at a char offset, keeping the head in `node` and
    /// returning the newly inserted tail node
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self.text(node).ok_or(DomError::NotText)?;
        let length = text.chars().count();
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        let at = byte_index(text, offset);
        let tail = text[at..].to_string();
        let head = text[..at].to_string();

        let tail_node = self.create_text(tail);
        match self.next_sibling(node) {
            Some(next) => self.insert_before(next, tail_node)?,
            None => {
                let parent = self.parent(node).ok_or(DomError::NoParent)?;
                self.append(parent, tail_node)?;
            }
        }
        self.set_text(node, head)?;
        Ok(tail_node)
    }

    /// Move every child of `node` to its position, then detach `node`
    pub fn unwrap(&mut self, node: NodeId) -> Result<(), DomError> {
        if self.parent(node).is_none() {
            return Err(DomError::NoParent);
        }
        let children: Vec<NodeId> = self.children(node).collect();
        for child in children {
            self.detach(child);
            self.insert_before(node, child)?;
        }
        self.detach(node);
        Ok(())
    }

    /// Merge adjacent text children and drop empty ones, recursively
    pub fn normalize(&mut self, node: NodeId) {
        let mut child = self.first_child(node);
        while let Some(current) = child {
            let next = self.next_sibling(current);
            if let Some(text) = self.text(current) {
                if text.is_empty() {
                    self.detach(current);
                    child = next;
                    continue;
                }
                let mut merged = text.to_string();
                let mut sibling = next;
                while let Some(following) = sibling {
                    match self.text(following) {
                        Some(more) => {
                            merged.push_str(more);
                            sibling = self.next_sibling(following);
                            self.detach(following);
                        }
                        None => break,
                    }
                }
                // `current` is known to be a text node
                let _ = self.set_text(current, merged);
                child = sibling;
            } else {
                self.normalize(current);
                child = next;
            }
        }
    }
}

/// Byte index of the `offset`th char, or the string length past the end
pub fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Substring between two char offsets, clamped to the string
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_index(text, start);
    let to = byte_index(text, end.max(start));
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = doc.create_element("P");
        let t = doc.create_text(text);
        doc.append(doc.root(), p).unwrap();
        doc.append(p, t).unwrap();
        (doc, p, t)
    }

    #[test]
    fn test_element_names_are_lowercased() {
        let (doc, p, _) = paragraph("x");
        assert_eq!(doc.tag_name(p), Some("p"));
    }

    #[test]
    fn test_split_text_counts_chars() {
        let (mut doc, p, t) = paragraph("héllo wörld");
        let tail = doc.split_text(t, 6).unwrap();

        assert_eq!(doc.text(t), Some("héllo "));
        assert_eq!(doc.text(tail), Some("wörld"));
        assert_eq!(doc.children(p).count(), 2);
        assert_eq!(doc.next_sibling(t), Some(tail));
    }

    #[test]
    fn test_split_text_out_of_bounds() {
        let (mut doc, _, t) = paragraph("abc");
        assert_eq!(
            doc.split_text(t, 4),
            Err(DomError::IndexSize {
                offset: 4,
                length: 3
            })
        );
    }

    #[test]
    fn test_unwrap_and_normalize() {
        let (mut doc, p, t) = paragraph("Hello world");
        let tail = doc.split_text(t, 6).unwrap();
        let span = doc.create_element("span");
        doc.insert_before(tail, span).unwrap();
        doc.detach(tail);
        doc.append(span, tail).unwrap();

        doc.unwrap(span).unwrap();
        assert!(!doc.is_attached(span));
        assert_eq!(doc.children(p).count(), 2);

        doc.normalize(p);
        assert_eq!(doc.children(p).count(), 1);
        assert_eq!(doc.text_content(p), "Hello world");
    }

    #[test]
    fn test_unique_element_by_id() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.set_attr(a, "id", "one");
        doc.set_attr(b, "id", "one");
        doc.append(doc.root(), a).unwrap();
        assert_eq!(doc.unique_element_by_id("one"), Some(a));

        doc.append(doc.root(), b).unwrap();
        assert_eq!(doc.unique_element_by_id("one"), None);
    }

    #[test]
    fn test_index_in_parent() {
        let mut doc = Document::new();
        let nodes: Vec<NodeId> = (0..3).map(|_| doc.create_element("li")).collect();
        for &n in &nodes {
            doc.append(doc.root(), n).unwrap();
        }
        assert_eq!(doc.index_in_parent(nodes[0]), 0);
        assert_eq!(doc.index_in_parent(nodes[2]), 2);
    }
}
