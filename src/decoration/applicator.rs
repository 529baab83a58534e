//! Decoration applicator
//!
//! Wraps the text covered by a range in decoration elements that carry a
//! highlight identifier, and unwraps them again.
//!
//! A range inside one text node gets a single wrapper. A range crossing
//! element boundaries gets one wrapper per intersecting text node, all
//! sharing the identifier; they are never merged because the crossed
//! elements may differ in tag.

use thiserror::Error;
use uuid::Uuid;

use super::style::{DecorationConfig, DecorationStyle};
use crate::dom::{char_slice, Document, DomError, NodeId, Range};

/// Errors applying a decoration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecorationError {
    #[error("Range is empty")]
    EmptyRange,

    #[error("Text node is not attached to the document")]
    Detached,

    #[error("Wrapping failed: {0}")]
    Wrap(#[from] DomError),
}

/// What an apply call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// New wrappers were inserted
    Wrapped(Vec<NodeId>),
    /// Wrappers for the identifier already existed and were restyled
    Restyled(Vec<NodeId>),
}

impl ApplyOutcome {
    pub fn elements(&self) -> &[NodeId] {
        match self {
            ApplyOutcome::Wrapped(elements) | ApplyOutcome::Restyled(elements) => elements,
        }
    }
}

/// Applies and removes decorations according to a [`DecorationConfig`]
#[derive(Debug, Clone, Default)]
pub struct Decorator {
    config: DecorationConfig,
}

impl Decorator {
    pub fn new(config: DecorationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecorationConfig {
        &self.config
    }

    /// Decoration elements carrying `id`, in document order
    pub fn decorations(&self, doc: &Document, id: Uuid) -> Vec<NodeId> {
        doc.find_by_attr(&self.config.id_attribute, &id.to_string())
    }

    /// Identifier of the nearest decorated inclusive ancestor of `node`
    pub fn decorated_ancestor(&self, doc: &Document, node: NodeId) -> Option<Uuid> {
        doc.ancestors(node)
            .filter_map(|n| doc.attr(n, &self.config.id_attribute))
            .find_map(|value| Uuid::parse_str(value).ok())
    }

    /// Decorate `range` with `style` under identifier `id`
    ///
    /// If wrappers for `id` already exist they are restyled in place instead,
    /// so applying the same highlight twice never nests wrappers.
    pub fn apply(
        &self,
        doc: &mut Document,
        range: &Range,
        id: Uuid,
        style: &DecorationStyle,
    ) -> Result<ApplyOutcome, DecorationError> {
        let existing = self.restyle_all(doc, id, style);
        if !existing.is_empty() {
            tracing::debug!("Restyled {} existing decorations for {}", existing.len(), id);
            return Ok(ApplyOutcome::Restyled(existing));
        }

        if range.is_collapsed() {
            return Err(DecorationError::EmptyRange);
        }

        if range.start.node == range.end.node && doc.is_text(range.start.node) {
            let element = self.wrap_text(
                doc,
                range.start.node,
                range.start.offset,
                range.end.offset,
                id,
                style,
            )?;
            return Ok(ApplyOutcome::Wrapped(vec![element]));
        }

        // Collect before mutating: wrapping changes the tree being walked
        let targets: Vec<(NodeId, usize, usize)> = range
            .text_nodes(doc)
            .map(|node| {
                let (start, end) = range.clip(doc, node);
                (node, start, end)
            })
            .filter(|&(_, start, end)| start < end)
            .collect();

        if targets.is_empty() {
            return Err(DecorationError::EmptyRange);
        }

        let mut elements = Vec::with_capacity(targets.len());
        for (node, start, end) in targets {
            elements.push(self.wrap_text(doc, node, start, end, id, style)?);
        }
        tracing::debug!("Wrapped {} text nodes for {}", elements.len(), id);
        Ok(ApplyOutcome::Wrapped(elements))
    }

    /// Restyle every decoration carrying `id`; returns the restyled elements
    pub fn restyle_all(&self, doc: &mut Document, id: Uuid, style: &DecorationStyle) -> Vec<NodeId> {
        let existing = self.decorations(doc, id);
        for &element in &existing {
            self.restyle(doc, element, style);
        }
        existing
    }

    /// Update style and note attributes of an existing wrapper
    pub fn restyle(&self, doc: &mut Document, element: NodeId, style: &DecorationStyle) {
        if self.config.include_inline_styles {
            doc.set_attr(element, "style", style.inline_css());
        }
        if style.note.is_empty() {
            doc.remove_attr(element, &self.config.note_attribute);
        } else {
            doc.set_attr(element, &self.config.note_attribute, style.note.clone());
        }
    }

    /// Unwrap every decoration carrying `id`; returns how many were removed
    pub fn remove(&self, doc: &mut Document, id: Uuid) -> usize {
        let elements = self.decorations(doc, id);
        let mut parents = Vec::new();
        for &element in &elements {
            let Some(parent) = doc.parent(element) else {
                continue;
            };
            if doc.unwrap(element).is_ok() && !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        for parent in parents {
            if doc.is_attached(parent) {
                doc.normalize(parent);
            }
        }
        elements.len()
    }

    fn create_wrapper(&self, doc: &mut Document, id: Uuid, style: &DecorationStyle) -> NodeId {
        let element = doc.create_element(&self.config.element);
        doc.set_attr(element, "class", self.config.class_name.clone());
        doc.set_attr(element, &self.config.id_attribute, id.to_string());
        self.restyle(doc, element, style);
        element
    }

    /// Wrap `[start, end)` chars of a text node, falling back to rebuilding
    /// the node from fragments when the direct wrap is rejected
    fn wrap_text(
        &self,
        doc: &mut Document,
        text: NodeId,
        start: usize,
        end: usize,
        id: Uuid,
        style: &DecorationStyle,
    ) -> Result<NodeId, DecorationError> {
        let wrapper = self.create_wrapper(doc, id, style);
        match surround_text(doc, text, start, end, wrapper) {
            Ok(()) => Ok(wrapper),
            Err(e) => {
                tracing::debug!("Direct wrap rejected ({}), rebuilding text node", e);
                rebuild_text(doc, text, start, end, wrapper)?;
                Ok(wrapper)
            }
        }
    }
}

/// Wrap a sub-span in place by splitting the text node
fn surround_text(
    doc: &mut Document,
    text: NodeId,
    start: usize,
    end: usize,
    wrapper: NodeId,
) -> Result<(), DomError> {
    let length = doc.text(text).ok_or(DomError::NotText)?.chars().count();
    if start > end || end > length {
        return Err(DomError::IndexSize {
            offset: end.max(start),
            length,
        });
    }
    if doc.parent(text).is_none() {
        return Err(DomError::NoParent);
    }

    let middle = if start > 0 {
        doc.split_text(text, start)?
    } else {
        text
    };
    if end < length {
        doc.split_text(middle, end - start)?;
    }
    doc.insert_before(middle, wrapper)?;
    doc.detach(middle);
    doc.append(wrapper, middle)
}

/// Replace a text node with `before`, wrapped `middle` and `after` fragments
fn rebuild_text(
    doc: &mut Document,
    text: NodeId,
    start: usize,
    end: usize,
    wrapper: NodeId,
) -> Result<(), DecorationError> {
    if !doc.is_attached(text) {
        return Err(DecorationError::Detached);
    }
    let content = doc.text(text).ok_or(DomError::NotText)?.to_string();
    let length = content.chars().count();
    let end = end.min(length);
    let start = start.min(end);

    let before = char_slice(&content, 0, start).to_string();
    let middle = char_slice(&content, start, end).to_string();
    let after = char_slice(&content, end, length).to_string();

    if !before.is_empty() {
        let node = doc.create_text(before);
        doc.insert_before(text, node)?;
    }
    let middle_node = doc.create_text(middle);
    doc.append(wrapper, middle_node)?;
    doc.insert_before(text, wrapper)?;
    if !after.is_empty() {
        let node = doc.create_text(after);
        doc.insert_before(text, node)?;
    }
    doc.detach(text);
    Ok(())
}
