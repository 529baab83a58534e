//! Structural paths
//!
//! A structural path addresses an element by the sequence of
//! `(tag, same-tag sibling index)` steps from the document root, written in an
//! xpath-like form:
//!
//! ```text
//! /html[1]/body[1]/div[2]/p[3]
//!  │       │       │      └── third <p> among the <div>'s <p> children
//!  │       │       └───────── second <div> among the <body>'s <div> children
//!  │       └───────────────── first <body> under <html>
//!  └───────────────────────── first <html> under the document node
//! ```
//!
//! A path may instead start at an element with a unique id:
//! `//*[@id="intro"]/p[1]`. Indices are 1-based; the document node itself is
//! written as `/`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::{Document, NodeId};

/// One `(tag, index)` step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Lowercase tag name
    pub tag: String,
    /// 1-based position among same-tag siblings
    pub index: usize,
}

impl PathStep {
    pub fn new(tag: impl Into<String>, index: usize) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            index,
        }
    }
}

/// A root-to-element coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StructuralPath {
    /// Unique element id the steps are relative to, if any
    pub id_anchor: Option<String>,
    pub steps: Vec<PathStep>,
}

/// Options for computing paths
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOptions {
    /// Stop at the nearest ancestor with a document-unique id
    pub use_ids: bool,
}

/// Path computation and resolution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Node is not attached to the document")]
    Unrooted,

    #[error("No element matches step {depth} of path {path}")]
    NotFound { path: String, depth: usize },
}

/// Path string parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    #[error("Empty path string")]
    Empty,

    #[error("Path must start with '/'")]
    MissingRoot,

    #[error("Expected tag name at position {0}")]
    ExpectedTag(usize),

    #[error("Expected index at position {0}")]
    ExpectedIndex(usize),

    #[error("Index must be at least 1 at position {0}")]
    ZeroIndex(usize),

    #[error("Unclosed id selector")]
    UnclosedId,

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

impl StructuralPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self {
            id_anchor: None,
            steps,
        }
    }

    pub fn from_id(id: impl Into<String>, steps: Vec<PathStep>) -> Self {
        Self {
            id_anchor: Some(id.into()),
            steps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id_anchor.is_none() && self.steps.is_empty()
    }

    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }
}

/// 1-based index of `element` among its same-tag siblings
fn same_tag_index(doc: &Document, element: NodeId, tag: &str) -> usize {
    let mut index = 1;
    let mut sibling = doc.previous_sibling(element);
    while let Some(node) = sibling {
        if doc.tag_name(node) == Some(tag) {
            index += 1;
        }
        sibling = doc.previous_sibling(node);
    }
    index
}

/// Ids with a quote cannot be written inside `[@id="..."]`
fn is_addressable_id(id: &str) -> bool {
    !id.is_empty() && !id.contains('"')
}

/// Compute the structural path of `node`
///
/// Text and comment nodes resolve to their parent element's path.
pub fn compute_path(
    doc: &Document,
    node: NodeId,
    options: PathOptions,
) -> Result<StructuralPath, PathError> {
    if !doc.is_attached(node) {
        return Err(PathError::Unrooted);
    }

    let mut current = if doc.is_element(node) || node == doc.root() {
        node
    } else {
        doc.parent(node).ok_or(PathError::Unrooted)?
    };

    let mut path = StructuralPath::default();
    while current != doc.root() {
        let Some(tag) = doc.tag_name(current) else {
            return Err(PathError::Unrooted);
        };
        if options.use_ids {
            if let Some(id) = doc.attr(current, "id") {
                if is_addressable_id(id) && doc.unique_element_by_id(id) == Some(current) {
                    path.id_anchor = Some(id.to_string());
                    break;
                }
            }
        }
        path.push(PathStep::new(tag, same_tag_index(doc, current, tag)));
        current = doc.parent(current).ok_or(PathError::Unrooted)?;
    }
    path.steps.reverse();
    Ok(path)
}

/// Resolve a structural path to the element it addresses
pub fn resolve_path(doc: &Document, path: &StructuralPath) -> Result<NodeId, PathError> {
    let not_found = |depth: usize| PathError::NotFound {
        path: path.to_string(),
        depth,
    };

    let mut current = match &path.id_anchor {
        Some(id) => doc.unique_element_by_id(id).ok_or_else(|| not_found(0))?,
        None => doc.root(),
    };

    for (depth, step) in path.steps.iter().enumerate() {
        current = doc
            .children(current)
            .filter(|&child| doc.tag_name(child) == Some(step.tag.as_str()))
            .nth(step.index.saturating_sub(1))
            .filter(|_| step.index > 0)
            .ok_or_else(|| not_found(depth + 1))?;
    }
    Ok(current)
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.id_anchor {
            write!(f, "//*[@id=\"{}\"]", id)?;
        } else if self.steps.is_empty() {
            return write!(f, "/");
        }
        for step in &self.steps {
            write!(f, "/{}[{}]", step.tag, step.index)?;
        }
        Ok(())
    }
}

/// Parser state
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathParseError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(PathParseError::UnexpectedChar(ch, self.pos)),
            None => Err(PathParseError::UnexpectedChar('\0', self.pos)),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn parse_id_anchor(&mut self) -> Result<String, PathParseError> {
        let rest = &self.input[self.pos..];
        let end = rest.find("\"]").ok_or(PathParseError::UnclosedId)?;
        let id = rest[..end].to_string();
        self.pos += end + 2;
        Ok(id)
    }

    fn parse_tag(&mut self) -> Result<String, PathParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.') {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(PathParseError::ExpectedTag(start));
        }
        Ok(self.input[start..self.pos].to_ascii_lowercase())
    }

    fn parse_index(&mut self) -> Result<usize, PathParseError> {
        self.expect('[')?;
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }
        let index: usize = self.input[start..self.pos]
            .parse()
            .map_err(|_| PathParseError::ExpectedIndex(start))?;
        if index == 0 {
            return Err(PathParseError::ZeroIndex(start));
        }
        self.expect(']')?;
        Ok(index)
    }

    fn parse(mut self) -> Result<StructuralPath, PathParseError> {
        if self.input.is_empty() {
            return Err(PathParseError::Empty);
        }

        let mut path = StructuralPath::default();
        if self.skip_str("//*[@id=\"") {
            path.id_anchor = Some(self.parse_id_anchor()?);
        } else if self.peek() != Some('/') {
            return Err(PathParseError::MissingRoot);
        } else if self.input == "/" {
            return Ok(path);
        }

        while !self.at_end() {
            self.expect('/')?;
            let tag = self.parse_tag()?;
            // A missing index means the first match, as in XPath shorthand
            let index = if self.peek() == Some('[') {
                self.parse_index()?
            } else {
                1
            };
            path.push(PathStep::new(tag, index));
        }
        Ok(path)
    }
}

impl FromStr for StructuralPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s.trim()).parse()
    }
}

impl TryFrom<String> for StructuralPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StructuralPath> for String {
    fn from(path: StructuralPath) -> Self {
        path.to_string()
    }
}
