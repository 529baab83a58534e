//! Selection session
//!
//! Holds what the toolbar acts on: the selection as it was when the toolbar
//! opened. A session is created when a selection is released and consumed
//! by a style application; dismissing the toolbar drops it.

use uuid::Uuid;

use crate::anchor::AnchorCapture;
use crate::dom::Range;

/// Opaque handle of the toolbar instance a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolbarHandle(Uuid);

impl ToolbarHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for ToolbarHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Selection context captured at toolbar-open time
#[derive(Debug, Clone)]
pub struct SelectionSession {
    pub(super) selection: Range,
    pub(super) capture: AnchorCapture,
    pub(super) target: Option<Uuid>,
    pub(super) toolbar: ToolbarHandle,
}

impl SelectionSession {
    /// The raw selection
    pub fn selection(&self) -> &Range {
        &self.selection
    }

    /// Anchor and text snapshot of the selection
    pub fn capture(&self) -> &AnchorCapture {
        &self.capture
    }

    /// Identifier of the highlight the selection sits in, if any
    pub fn target(&self) -> Option<Uuid> {
        self.target
    }

    /// Whether applying a style edits an existing highlight
    pub fn is_edit(&self) -> bool {
        self.target.is_some()
    }

    /// Point the session at a known highlight
    pub fn with_target(mut self, id: Uuid) -> Self {
        self.target = Some(id);
        self
    }
}
