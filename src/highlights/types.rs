//! Highlight record types
//!
//! A page's highlights are stored as one [`PageRecord`] keyed by normalized
//! page URL. Records are edited through [`HighlightDelta`] values combined
//! by [`reduce`], never by mutating fields ad hoc.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchor::SelectionAnchor;
use crate::decoration::DecorationStyle;

/// A persisted highlight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    /// Stable identity, shared with the decoration elements
    pub id: Uuid,
    /// Snapshot of the highlighted text
    pub text: String,
    pub anchor: SelectionAnchor,
    /// Background color (CSS color value)
    pub color: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HighlightRecord {
    /// Create a new record with a fresh identifier
    pub fn new(text: impl Into<String>, anchor: SelectionAnchor, color: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            anchor,
            color: color.into(),
            bold: false,
            italic: false,
            note: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Decoration style for this record
    pub fn style(&self) -> DecorationStyle {
        DecorationStyle {
            color: self.color.clone(),
            bold: self.bold,
            italic: self.italic,
            note: self.note.clone(),
        }
    }
}

/// Highlights of one page, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub highlights: Vec<HighlightRecord>,
}

impl PageRecord {
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.highlights.iter().position(|h| h.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&HighlightRecord> {
        self.highlights.iter().find(|h| h.id == id)
    }
}

/// Notes view listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub count: usize,
}

/// One edit to a highlight record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HighlightDelta {
    ColorChange(String),
    BoldToggle,
    ItalicToggle,
    NoteChange(String),
}

/// Apply one delta, returning the edited record
///
/// `updated_at` becomes `now` unless that would move it backwards.
pub fn reduce(record: &HighlightRecord, delta: &HighlightDelta, now: DateTime<Utc>) -> HighlightRecord {
    let mut next = record.clone();
    match delta {
        HighlightDelta::ColorChange(color) => next.color = color.clone(),
        HighlightDelta::BoldToggle => next.bold = !next.bold,
        HighlightDelta::ItalicToggle => next.italic = !next.italic,
        HighlightDelta::NoteChange(note) => next.note = note.clone(),
    }
    next.updated_at = record.updated_at.max(now);
    next
}

/// Apply a sequence of deltas in order
pub fn reduce_all<'a>(
    record: &HighlightRecord,
    deltas: impl IntoIterator<Item = &'a HighlightDelta>,
    now: DateTime<Utc>,
) -> HighlightRecord {
    deltas
        .into_iter()
        .fold(record.clone(), |acc, delta| reduce(&acc, delta, now))
}

/// Toolbar payload: the style the user picked for the selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDelta {
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub note: Option<String>,
}

impl StyleDelta {
    /// Deltas taking `current` to the requested style
    pub fn to_deltas(&self, current: &HighlightRecord) -> Vec<HighlightDelta> {
        let mut deltas = Vec::new();
        if let Some(color) = &self.color {
            if *color != current.color {
                deltas.push(HighlightDelta::ColorChange(color.clone()));
            }
        }
        if self.bold.is_some_and(|bold| bold != current.bold) {
            deltas.push(HighlightDelta::BoldToggle);
        }
        if self.italic.is_some_and(|italic| italic != current.italic) {
            deltas.push(HighlightDelta::ItalicToggle);
        }
        if let Some(note) = &self.note {
            if *note != current.note {
                deltas.push(HighlightDelta::NoteChange(note.clone()));
            }
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::TextAnchorPoint;
    use chrono::Duration;

    fn record() -> HighlightRecord {
        let path = "/html[1]/body[1]/p[1]".parse().unwrap();
        let anchor = SelectionAnchor::new(
            TextAnchorPoint::new(path, 0, 0),
            TextAnchorPoint::new("/html[1]/body[1]/p[1]".parse().unwrap(), 0, 5),
        );
        HighlightRecord::new("Hello", anchor, "#ffff00")
    }

    #[test]
    fn test_reduce_fields() {
        let base = record();
        let now = base.updated_at + Duration::seconds(5);

        let colored = reduce(&base, &HighlightDelta::ColorChange("#ff0000".into()), now);
        assert_eq!(colored.color, "#ff0000");
        assert_eq!(colored.updated_at, now);
        assert_eq!(colored.created_at, base.created_at);

        let bold = reduce(&colored, &HighlightDelta::BoldToggle, now);
        assert!(bold.bold);
        assert!(!reduce(&bold, &HighlightDelta::BoldToggle, now).bold);

        let noted = reduce(&base, &HighlightDelta::NoteChange("see ch. 3".into()), now);
        assert_eq!(noted.note, "see ch. 3");
        assert_eq!(noted.id, base.id);
    }

    #[test]
    fn test_updated_at_never_decreases() {
        let base = record();
        let earlier = base.updated_at - Duration::hours(1);
        let edited = reduce(&base, &HighlightDelta::ItalicToggle, earlier);
        assert!(edited.italic);
        assert_eq!(edited.updated_at, base.updated_at);
    }

    #[test]
    fn test_style_delta_to_deltas() {
        let base = record();
        let delta = StyleDelta {
            color: Some("#ffff00".into()),
            bold: Some(true),
            italic: Some(false),
            note: Some("why".into()),
        };
        assert_eq!(
            delta.to_deltas(&base),
            vec![
                HighlightDelta::BoldToggle,
                HighlightDelta::NoteChange("why".into())
            ]
        );

        let edited = reduce_all(&base, &delta.to_deltas(&base), Utc::now());
        assert!(edited.bold);
        assert!(!edited.italic);
        assert_eq!(edited.note, "why");
        assert!(delta.to_deltas(&edited).is_empty());
    }

    #[test]
    fn test_record_wire_format() {
        let base = record();
        let json = serde_json::to_value(&base).unwrap();
        assert_eq!(json["id"], base.id.to_string());
        assert_eq!(json["anchor"]["start"]["xpath"], "/html[1]/body[1]/p[1]");
        assert_eq!(json["anchor"]["end"]["textIndex"], 0);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());

        let back: HighlightRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, base);
    }

    #[test]
    fn test_style_delta_from_partial_json() {
        let delta: StyleDelta = serde_json::from_str(r##"{"color":"#c8e6c9"}"##).unwrap();
        assert_eq!(delta.color.as_deref(), Some("#c8e6c9"));
        assert_eq!(delta.bold, None);
    }
}
