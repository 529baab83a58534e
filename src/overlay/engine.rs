//! Overlay engine
//!
//! Entry points tying anchoring, resolution and decoration together for one
//! document: opening a selection session, applying a toolbar style, and
//! restoring or removing stored highlights.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::session::{SelectionSession, ToolbarHandle};
use crate::anchor::{build_anchor, resolve_anchor, AnchorError, PathOptions, ResolveError};
use crate::decoration::{DecorationConfig, DecorationError, Decorator};
use crate::dom::{Document, Range};
use crate::highlights::{reduce_all, HighlightRecord, PageRecord, StyleDelta};

/// Errors from overlay operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverlayError {
    #[error("Anchor error: {0}")]
    Anchor(#[from] AnchorError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Decoration error: {0}")]
    Decoration(#[from] DecorationError),

    #[error("Selection is inside highlight {0} but its record was not supplied")]
    UnknownHighlight(Uuid),

    #[error("Highlight {0} is not decorated in this document")]
    TargetNotDecorated(Uuid),
}

/// Overlay engine settings
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub decoration: DecorationConfig,
    /// Use document-unique ids as path shortcuts
    pub use_id_paths: bool,
    /// Compare resolved text with the stored snapshot on restore
    pub verify_text: bool,
    /// Color of a new highlight when the toolbar names none
    pub default_color: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            decoration: DecorationConfig::default(),
            use_id_paths: false,
            verify_text: true,
            default_color: "#ffff00".to_string(),
        }
    }
}

/// A highlight that could not be restored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreFailure {
    pub id: Uuid,
    pub reason: String,
}

/// Outcome of restoring a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Highlights decorated, in restore order
    pub applied: Vec<Uuid>,
    /// Subset of `applied` whose offsets had to be clamped
    pub degraded: Vec<Uuid>,
    pub failed: Vec<RestoreFailure>,
}

/// Overlay engine
#[derive(Debug, Clone)]
pub struct OverlayEngine {
    decorator: Decorator,
    path_options: PathOptions,
    verify_text: bool,
    default_color: String,
}

impl Default for OverlayEngine {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

impl OverlayEngine {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            decorator: Decorator::new(config.decoration),
            path_options: PathOptions {
                use_ids: config.use_id_paths,
            },
            verify_text: config.verify_text,
            default_color: config.default_color,
        }
    }

    pub fn decorator(&self) -> &Decorator {
        &self.decorator
    }

    /// Open a session for a released selection
    ///
    /// If the selection sits inside an existing decoration, the session
    /// targets that highlight and a style application edits it.
    pub fn begin_session(
        &self,
        doc: &Document,
        selection: Range,
    ) -> Result<SelectionSession, OverlayError> {
        let capture = build_anchor(doc, &selection, self.path_options)?;
        let target = self
            .decorator
            .decorated_ancestor(doc, selection.common_ancestor(doc));

        Ok(SelectionSession {
            selection,
            capture,
            target,
            toolbar: ToolbarHandle::new(),
        })
    }

    /// Apply the toolbar's style to the session's selection
    ///
    /// Consumes the session. For an edit, `existing` must be the stored
    /// record of the targeted highlight; its decorations are restyled in
    /// place. Otherwise a new record is created and the selection wrapped.
    pub fn apply_style(
        &self,
        doc: &mut Document,
        session: SelectionSession,
        delta: &StyleDelta,
        existing: Option<&HighlightRecord>,
    ) -> Result<HighlightRecord, OverlayError> {
        let base = match session.target {
            Some(id) => match existing {
                // Edits only restyle live decorations
                Some(_) if self.decorator.decorations(doc, id).is_empty() => {
                    return Err(OverlayError::TargetNotDecorated(id))
                }
                Some(record) if record.id == id => record.clone(),
                _ => return Err(OverlayError::UnknownHighlight(id)),
            },
            None => HighlightRecord::new(
                session.capture.text.clone(),
                session.capture.anchor.clone(),
                self.default_color.clone(),
            ),
        };

        let record = reduce_all(&base, &delta.to_deltas(&base), Utc::now());
        self.decorator
            .apply(doc, &session.capture.range, record.id, &record.style())?;

        tracing::debug!(
            "Applied style to highlight {} (toolbar {})",
            record.id,
            session.toolbar.id()
        );
        Ok(record)
    }

    /// Decorate one stored highlight; returns whether resolution degraded
    ///
    /// A highlight already decorated in this tree is only restyled.
    pub fn restore_one(
        &self,
        doc: &mut Document,
        record: &HighlightRecord,
    ) -> Result<bool, OverlayError> {
        if !self
            .decorator
            .restyle_all(doc, record.id, &record.style())
            .is_empty()
        {
            return Ok(false);
        }

        let resolved = resolve_anchor(doc, &record.anchor)?;
        if self.verify_text {
            resolved.verify(doc, &record.text)?;
        }
        self.decorator
            .apply(doc, &resolved.range, record.id, &record.style())?;
        Ok(resolved.degraded)
    }

    /// Re-apply a page's highlights in stored order
    ///
    /// Failures are local to one highlight: they are logged and reported,
    /// and the remaining highlights are still processed.
    pub fn restore(&self, doc: &mut Document, page: &PageRecord) -> RestoreReport {
        let mut report = RestoreReport::default();

        for record in &page.highlights {
            match self.restore_one(doc, record) {
                Ok(degraded) => {
                    report.applied.push(record.id);
                    if degraded {
                        report.degraded.push(record.id);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping highlight {}: {}", record.id, e);
                    report.failed.push(RestoreFailure {
                        id: record.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "Restored {}/{} highlights",
            report.applied.len(),
            page.highlights.len()
        );
        report
    }

    /// Remove a highlight's decorations; returns how many were unwrapped
    pub fn remove(&self, doc: &mut Document, id: Uuid) -> usize {
        self.decorator.remove(doc, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_markup, to_markup, BoundaryPoint, NodeId};

    const PAGE: &str = "<html><body><p>Hello </p><p>world</p><p>Third paragraph here</p></body></html>";

    fn find_text(doc: &Document, text: &str) -> NodeId {
        doc.descendants(doc.root())
            .find(|&n| doc.text(n) == Some(text))
            .unwrap()
    }

    fn yellow() -> StyleDelta {
        StyleDelta {
            color: Some("#ffff00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_highlight_across_paragraphs() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let selection = Range::new(
            BoundaryPoint::new(find_text(&doc, "Hello "), 0),
            BoundaryPoint::new(find_text(&doc, "world"), 5),
        );

        let session = engine.begin_session(&doc, selection).unwrap();
        assert!(!session.is_edit());
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();

        assert_eq!(record.text, "Hello world");
        assert_eq!(record.color, "#ffff00");
        let elements = engine.decorator().decorations(&doc, record.id);
        assert_eq!(elements.len(), 2);
        assert_eq!(doc.text_content(elements[0]), "Hello ");
        assert_eq!(doc.text_content(elements[1]), "world");
    }

    #[test]
    fn test_default_color_for_new_highlight() {
        let engine = OverlayEngine::new(OverlayConfig {
            default_color: "#c8e6c9".to_string(),
            ..Default::default()
        });
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "world");
        let session = engine.begin_session(&doc, Range::within(t, 0, 3)).unwrap();
        let delta = StyleDelta {
            bold: Some(true),
            ..Default::default()
        };

        let record = engine.apply_style(&mut doc, session, &delta, None).unwrap();
        assert_eq!(record.color, "#c8e6c9");
        assert!(record.bold);
    }

    #[test]
    fn test_selection_inside_highlight_edits_it() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "Third paragraph here");
        let session = engine.begin_session(&doc, Range::within(t, 6, 15)).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();

        // Select part of the decorated text
        let inner = find_text(&doc, "paragraph");
        let session = engine
            .begin_session(&doc, Range::within(inner, 2, 5))
            .unwrap();
        assert_eq!(session.target(), Some(record.id));

        let delta = StyleDelta {
            color: Some("#ff0000".to_string()),
            note: Some("edited".to_string()),
            ..Default::default()
        };
        let edited = engine
            .apply_style(&mut doc, session, &delta, Some(&record))
            .unwrap();

        assert_eq!(edited.id, record.id);
        assert_eq!(edited.text, "paragraph");
        assert_eq!(edited.created_at, record.created_at);
        let elements = engine.decorator().decorations(&doc, record.id);
        assert_eq!(elements.len(), 1);
        assert_eq!(doc.text_content(elements[0]), "paragraph");
        assert_eq!(doc.attr(elements[0], "data-note"), Some("edited"));
    }

    #[test]
    fn test_edit_without_record_fails() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "world");
        let session = engine.begin_session(&doc, Range::within(t, 0, 5)).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();

        let session = engine
            .begin_session(&doc, Range::within(find_text(&doc, "world"), 1, 2))
            .unwrap();
        assert_eq!(
            engine.apply_style(&mut doc, session, &yellow(), None),
            Err(OverlayError::UnknownHighlight(record.id))
        );
    }

    #[test]
    fn test_edit_of_undecorated_highlight_fails() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let world = find_text(&doc, "world");
        let session = engine.begin_session(&doc, Range::within(world, 0, 5)).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();

        // A fresh page where the highlight was never restored
        let mut reloaded = parse_markup(PAGE).unwrap();
        let third = find_text(&reloaded, "Third paragraph here");
        let session = engine
            .begin_session(&reloaded, Range::within(third, 0, 5))
            .unwrap()
            .with_target(record.id);

        assert_eq!(
            engine.apply_style(&mut reloaded, session, &yellow(), Some(&record)),
            Err(OverlayError::TargetNotDecorated(record.id))
        );
        assert!(engine.decorator().decorations(&reloaded, record.id).is_empty());
        assert_eq!(to_markup(&reloaded), to_markup(&parse_markup(PAGE).unwrap()));
    }

    #[test]
    fn test_restore_clamps_trailing_whitespace_drift() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup("<html><body><p>Hello world  </p></body></html>").unwrap();
        let t = find_text(&doc, "Hello world  ");
        let session = engine.begin_session(&doc, Range::within(t, 6, 13)).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();
        assert_eq!(record.text, "world  ");
        let page = PageRecord {
            title: String::new(),
            highlights: vec![record.clone()],
        };

        let mut trimmed = parse_markup("<html><body><p>Hello world</p></body></html>").unwrap();
        let report = engine.restore(&mut trimmed, &page);

        assert_eq!(report.applied, vec![record.id]);
        assert_eq!(report.degraded, vec![record.id]);
        assert!(report.failed.is_empty());
        let elements = engine.decorator().decorations(&trimmed, record.id);
        assert_eq!(elements.len(), 1);
        assert_eq!(trimmed.text_content(elements[0]), "world");
    }

    #[test]
    fn test_restore_on_reloaded_page() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let mut page = PageRecord::default();

        let hello = find_text(&doc, "Hello ");
        let session = engine.begin_session(&doc, Range::within(hello, 0, 5)).unwrap();
        page.highlights
            .push(engine.apply_style(&mut doc, session, &yellow(), None).unwrap());

        // Second highlight is anchored against the already decorated tree
        let third = find_text(&doc, "Third paragraph here");
        let session = engine.begin_session(&doc, Range::within(third, 0, 5)).unwrap();
        page.highlights
            .push(engine.apply_style(&mut doc, session, &yellow(), None).unwrap());
        let decorated = to_markup(&doc);

        let mut reloaded = parse_markup(PAGE).unwrap();
        let report = engine.restore(&mut reloaded, &page);

        assert_eq!(
            report.applied,
            page.highlights.iter().map(|h| h.id).collect::<Vec<_>>()
        );
        assert!(report.failed.is_empty());
        assert!(report.degraded.is_empty());
        assert_eq!(to_markup(&reloaded), decorated);
    }

    #[test]
    fn test_restore_skips_failures() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let world = find_text(&doc, "world");
        let session = engine.begin_session(&doc, Range::within(world, 0, 5)).unwrap();
        let good = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();

        let mut bad = good.clone();
        bad.id = Uuid::new_v4();
        bad.anchor = crate::anchor::SelectionAnchor::new(
            crate::anchor::TextAnchorPoint::new("/html[1]/body[1]/ul[1]".parse().unwrap(), 0, 0),
            crate::anchor::TextAnchorPoint::new("/html[1]/body[1]/ul[1]".parse().unwrap(), 0, 2),
        );
        let page = PageRecord {
            title: String::new(),
            highlights: vec![bad.clone(), good.clone()],
        };

        let mut reloaded = parse_markup(PAGE).unwrap();
        let report = engine.restore(&mut reloaded, &page);
        assert_eq!(report.applied, vec![good.id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, bad.id);
        assert!(engine.decorator().decorations(&reloaded, bad.id).is_empty());
    }

    #[test]
    fn test_restore_detects_drift() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let world = find_text(&doc, "world");
        let session = engine.begin_session(&doc, Range::within(world, 0, 5)).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();
        let page = PageRecord {
            title: String::new(),
            highlights: vec![record.clone()],
        };

        let mut drifted = parse_markup(
            "<html><body><p>Inserted</p><p>Hello </p><p>world</p><p>Third paragraph here</p></body></html>",
        )
        .unwrap();
        let report = engine.restore(&mut drifted, &page);

        assert!(report.applied.is_empty());
        assert_eq!(report.failed[0].id, record.id);
        assert!(engine.decorator().decorations(&drifted, record.id).is_empty());
    }

    #[test]
    fn test_restore_twice_is_idempotent() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "Third paragraph here");
        let session = engine.begin_session(&doc, Range::within(t, 6, 15)).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();
        let page = PageRecord {
            title: String::new(),
            highlights: vec![record.clone()],
        };

        let mut reloaded = parse_markup(PAGE).unwrap();
        engine.restore(&mut reloaded, &page);
        let once = to_markup(&reloaded);
        let again = engine.restore(&mut reloaded, &page);
        assert_eq!(again.applied, vec![record.id]);
        assert_eq!(to_markup(&reloaded), once);
        assert_eq!(engine.decorator().decorations(&reloaded, record.id).len(), 1);
    }

    #[test]
    fn test_remove_restores_markup() {
        let engine = OverlayEngine::default();
        let mut doc = parse_markup(PAGE).unwrap();
        let before = to_markup(&doc);
        let selection = Range::new(
            BoundaryPoint::new(find_text(&doc, "Hello "), 2),
            BoundaryPoint::new(find_text(&doc, "Third paragraph here"), 5),
        );
        let session = engine.begin_session(&doc, selection).unwrap();
        let record = engine
            .apply_style(&mut doc, session, &yellow(), None)
            .unwrap();

        assert_eq!(engine.remove(&mut doc, record.id), 3);
        assert_eq!(to_markup(&doc), before);
    }
}
