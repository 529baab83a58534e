//! Page URL normalization

use url::Url;

/// Canonical storage key for a page: the URL without its fragment
pub fn normalize_page_url(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    url.set_fragment(None);
    Ok(url.to_string())
}
