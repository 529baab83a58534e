//! Decoration markup settings

/// Configuration for decoration elements
#[derive(Debug, Clone)]
pub struct DecorationConfig {
    /// Tag name of the wrapper element
    pub element: String,
    /// CSS class put on every wrapper
    pub class_name: String,
    /// Attribute carrying the highlight identifier
    pub id_attribute: String,
    /// Attribute carrying the note text
    pub note_attribute: String,
    /// Whether to write the style as an inline `style` attribute
    pub include_inline_styles: bool,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            element: "span".to_string(),
            class_name: "inkmark-highlight".to_string(),
            id_attribute: "data-highlight-id".to_string(),
            note_attribute: "data-note".to_string(),
            include_inline_styles: true,
        }
    }
}

/// Visual style of one highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationStyle {
    /// Background color (CSS color value)
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub note: String,
}

impl Default for DecorationStyle {
    fn default() -> Self {
        Self {
            color: "#ffff00".to_string(), // Yellow
            bold: false,
            italic: false,
            note: String::new(),
        }
    }
}

impl DecorationStyle {
    /// Inline CSS declarations for this style
    pub fn inline_css(&self) -> String {
        let mut css = format!("background-color: {};", self.color);
        if self.bold {
            css.push_str(" font-weight: bold;");
        }
        if self.italic {
            css.push_str(" font-style: italic;");
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_css() {
        let style = DecorationStyle {
            color: "#c8e6c9".to_string(),
            bold: true,
            italic: true,
            note: String::new(),
        };
        assert_eq!(
            style.inline_css(),
            "background-color: #c8e6c9; font-weight: bold; font-style: italic;"
        );
        assert_eq!(
            DecorationStyle::default().inline_css(),
            "background-color: #ffff00;"
        );
    }
}
