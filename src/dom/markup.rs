//! Markup parsing and serialization
//!
//! Parses (X)HTML fragments or documents into a [`Document`] with
//! `quick-xml`. The reader runs with relaxed checks so common HTML habits
//! (void elements without a slash, valueless attributes, named entities,
//! stray end tags) still produce a sensible tree.

use std::borrow::Cow;

use indextree::NodeId;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::tree::{Document, DomError, NodeData};

/// Elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Markup parsing errors
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Malformed markup at byte {position}: {source}")]
    Syntax {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Invalid UTF-8 in tag or attribute name")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Tree error: {0}")]
    Tree(#[from] DomError),
}

/// Named HTML entities that XML does not predefine
fn resolve_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "middot" => "\u{b7}",
        _ => return None,
    })
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Parse markup into a new document
pub fn parse_markup(input: &str) -> Result<Document, MarkupError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(false);
    reader.check_end_names(false);
    reader.expand_empty_elements(false);

    let mut doc = Document::new();
    let mut open: Vec<NodeId> = vec![doc.root()];

    loop {
        let event = reader.read_event().map_err(|source| MarkupError::Syntax {
            position: reader.buffer_position(),
            source,
        })?;
        let parent = *open.last().unwrap_or(&doc.root());

        match event {
            Event::Start(start) => {
                let element = create_element(&mut doc, &start)?;
                doc.append(parent, element)?;
                let is_void_element = doc.tag_name(element).map(is_void).unwrap_or(false);
                if !is_void_element {
                    open.push(element);
                }
            }
            Event::Empty(start) => {
                let element = create_element(&mut doc, &start)?;
                doc.append(parent, element)?;
            }
            Event::End(end) => {
                let name = std::str::from_utf8(end.name().as_ref())?.to_ascii_lowercase();
                // Close up to the nearest matching open element; ignore strays
                if let Some(depth) = open
                    .iter()
                    .rposition(|&n| doc.tag_name(n) == Some(name.as_str()))
                {
                    open.truncate(depth.max(1));
                }
            }
            Event::Text(text) => {
                let content = match text.unescape_with(resolve_entity) {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::debug!("Keeping raw text after unescape failure: {}", e);
                        Cow::Owned(String::from_utf8_lossy(&text).into_owned())
                    }
                };
                append_text(&mut doc, parent, &content)?;
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(&data).into_owned();
                append_text(&mut doc, parent, &content)?;
            }
            Event::Comment(comment) => {
                let content = String::from_utf8_lossy(&comment).into_owned();
                let node = doc.create_comment(content);
                doc.append(parent, node)?;
            }
            Event::Eof => break,
            // Declarations, doctypes and processing instructions carry no content
            _ => {}
        }
    }

    Ok(doc)
}

fn create_element(doc: &mut Document, start: &BytesStart<'_>) -> Result<NodeId, MarkupError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let element = doc.create_element(&name);
    for attr in start.html_attributes().with_checks(false).flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?.to_ascii_lowercase();
        let value = attr
            .unescape_value()
            .map(Cow::into_owned)
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        doc.set_attr(element, &key, value);
    }
    Ok(element)
}

/// Append text, merging with a preceding text sibling
fn append_text(doc: &mut Document, parent: NodeId, content: &str) -> Result<(), DomError> {
    if content.is_empty() {
        return Ok(());
    }
    let last = doc.children(parent).last();
    if let Some(previous) = last.filter(|&n| doc.is_text(n)) {
        let merged = format!("{}{}", doc.text(previous).unwrap_or_default(), content);
        return doc.set_text(previous, merged);
    }
    let node = doc.create_text(content);
    doc.append(parent, node)
}

/// Serialize the whole document
pub fn to_markup(doc: &Document) -> String {
    let mut out = String::new();
    for child in doc.children(doc.root()) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.data(node) {
        NodeData::Document => {
            for child in doc.children(node) {
                write_node(doc, child, out);
            }
        }
        NodeData::Text(text) => out.push_str(&partial_escape(text)),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
            if is_void(&el.name) && doc.first_child(node).is_none() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in doc.children(node) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}
