//! Lazy filtered pre-order traversal
//!
//! A `TreeWalker` yields, in document order, the nodes under a root that
//! satisfy an inclusion predicate. It keeps only a cursor, so it can be
//! stopped and resumed at any point and [`TreeWalker::reset`] starts it over.

use indextree::NodeId;

use super::tree::Document;

pub struct TreeWalker<'a, F>
where
    F: Fn(&Document, NodeId) -> bool,
{
    doc: &'a Document,
    root: NodeId,
    accept: F,
    cursor: Cursor,
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Start,
    At(NodeId),
    Done,
}

impl<'a, F> TreeWalker<'a, F>
where
    F: Fn(&Document, NodeId) -> bool,
{
    pub fn new(doc: &'a Document, root: NodeId, accept: F) -> Self {
        Self {
            doc,
            root,
            accept,
            cursor: Cursor::Start,
        }
    }

    /// Last node visited, if any
    pub fn current(&self) -> Option<NodeId> {
        match self.cursor {
            Cursor::At(node) => Some(node),
            _ => None,
        }
    }

    /// Rewind to before the first node
    pub fn reset(&mut self) {
        self.cursor = Cursor::Start;
    }

    /// Next node in pre-order under `root`, accepted or not
    fn step(&self, node: NodeId) -> Option<NodeId> {
        if let Some(child) = self.doc.first_child(node) {
            return Some(child);
        }
        let mut current = node;
        loop {
            if current == self.root {
                return None;
            }
            if let Some(sibling) = self.doc.next_sibling(current) {
                return Some(sibling);
            }
            current = self.doc.parent(current)?;
        }
    }
}

impl<F> Iterator for TreeWalker<'_, F>
where
    F: Fn(&Document, NodeId) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let mut candidate = match self.cursor {
            Cursor::Start => Some(self.root),
            Cursor::At(node) => self.step(node),
            Cursor::Done => None,
        };
        while let Some(node) = candidate {
            self.cursor = Cursor::At(node);
            if (self.accept)(self.doc, node) {
                return Some(node);
            }
            candidate = self.step(node);
        }
        self.cursor = Cursor::Done;
        None
    }
}

/// Walker over every text node under `root`
pub fn text_walker(
    doc: &Document,
    root: NodeId,
) -> TreeWalker<'_, impl Fn(&Document, NodeId) -> bool> {
    TreeWalker::new(doc, root, |doc, node| doc.is_text(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_markup;

    #[test]
    fn test_text_walker_document_order() {
        let doc = parse_markup("<div><p>a<b>b</b></p><p>c</p></div>").unwrap();
        let found: Vec<&str> = text_walker(&doc, doc.root())
            .filter_map(|n| doc.text(n))
            .collect();
        assert_eq!(found, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_walker_stays_under_root() {
        let doc = parse_markup("<div><p>a</p><p>b</p></div>").unwrap();
        let first_p = doc
            .descendants(doc.root())
            .find(|&n| doc.tag_name(n) == Some("p"))
            .unwrap();
        let found: Vec<NodeId> = text_walker(&doc, first_p).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(doc.text(found[0]), Some("a"));
    }

    #[test]
    fn test_walker_resumes_and_resets() {
        let doc = parse_markup("<ul><li>1</li><li>2</li><li>3</li></ul>").unwrap();
        let mut walker = text_walker(&doc, doc.root());

        let first = walker.next().unwrap();
        assert_eq!(walker.current(), Some(first));
        assert_eq!(walker.by_ref().count(), 2);
        assert_eq!(walker.next(), None);

        walker.reset();
        assert_eq!(walker.next(), Some(first));
    }

    #[test]
    fn test_predicate_filters_elements() {
        let doc = parse_markup("<div><p>a</p><span>b</span><p>c</p></div>").unwrap();
        let paragraphs = TreeWalker::new(&doc, doc.root(), |doc, n| doc.tag_name(n) == Some("p"));
        assert_eq!(paragraphs.count(), 2);
    }
}
