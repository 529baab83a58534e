//! Markup sanitizing using lol_html for streaming HTML processing
//!
//! Pages submitted for rendering are stripped of active content before they
//! are parsed into a document tree and sent back with decorations.

use lol_html::{element, rewrite_str, RewriteStrSettings};

/// Errors during sanitizing
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(String),
}

fn is_script_url(value: &str) -> bool {
    value.trim().to_lowercase().starts_with("javascript:")
}

/// Remove scripts, styles, event handlers and `javascript:` URLs
pub fn sanitize_html(html: &str) -> Result<String, SanitizeError> {
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    let handlers: Vec<String> = el
                        .attributes()
                        .iter()
                        .map(|attr| attr.name())
                        .filter(|name| name.starts_with("on"))
                        .collect();
                    for name in handlers {
                        el.remove_attribute(&name);
                    }

                    for attr in ["href", "src", "action"] {
                        if el.get_attribute(attr).is_some_and(|v| is_script_url(&v)) {
                            el.remove_attribute(attr);
                        }
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| SanitizeError::Rewrite(e.to_string()))?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_and_style_removal() {
        let html = "<p>Hello</p><script>alert('xss')</script><style>p{}</style><p>World</p>";
        let result = sanitize_html(html).unwrap();

        assert_eq!(result, "<p>Hello</p><p>World</p>");
    }

    #[test]
    fn test_event_handlers() {
        let html = r#"<p onclick="alert('xss')" onpointerdown="x()" class="keep">Hello</p>"#;
        let result = sanitize_html(html).unwrap();

        assert_eq!(result, r#"<p class="keep">Hello</p>"#);
    }

    #[test]
    fn test_javascript_urls() {
        let html = r#"<a href=" JavaScript:alert(1)">x</a><a href="/ok">y</a>"#;
        let result = sanitize_html(html).unwrap();

        assert!(!result.contains("JavaScript"));
        assert!(result.contains(r#"href="/ok""#));
    }

    #[test]
    fn test_plain_markup_untouched() {
        let html = "<div><p>Hello <b>big</b> world</p></div>";
        assert_eq!(sanitize_html(html).unwrap(), html);
    }
}
