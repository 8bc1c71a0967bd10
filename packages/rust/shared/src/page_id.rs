//! Notion page identifiers and URL parsing.
//!
//! Manifest lines are Notion share URLs such as
//! `https://www.notion.so/acme/Roadmap-0123456789abcdef0123456789abcdef?pvs=4`.
//! The trailing 32 hex characters are the page id, which the API expects in
//! dashed 8-4-4-4-12 form.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Matches a Notion page URL on `notion.so` or `notion.site` and captures the
/// 32-hex-digit id immediately before the optional query or fragment.
static NOTION_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?:www\.)?notion\.(?:so|site)/(?:[^/]+/)*[^?#]*?([0-9a-f]{32})(?:[?#].*)?$",
    )
    .expect("notion url regex")
});

// ---------------------------------------------------------------------------
// PageId
// ---------------------------------------------------------------------------

/// Canonical Notion page identifier. Displays as lowercase 8-4-4-4-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub Uuid);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for PageId {
    type Err = uuid::Error;

    /// Accepts both the dashed and the compact 32-character form.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::try_parse(s)?))
    }
}

// ---------------------------------------------------------------------------
// URL extraction
// ---------------------------------------------------------------------------

/// Extract the page id from a Notion URL.
///
/// Returns `None` for anything that is not a Notion page URL; callers treat
/// that as "not a document reference" rather than an error.
pub fn extract_page_id(url: &str) -> Option<PageId> {
    let caps = NOTION_URL_RE.captures(url)?;
    Uuid::try_parse(&caps[1]).ok().map(PageId)
}

/// Whether `url` is a Notion page URL that [`extract_page_id`] accepts.
pub fn is_valid_notion_url(url: &str) -> bool {
    NOTION_URL_RE.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "0123456789abcdef0123456789abcdef";
    const DASHED: &str = "01234567-89ab-cdef-0123-456789abcdef";

    #[test]
    fn extracts_from_slug_url() {
        let url = format!("https://www.notion.so/acme/Roadmap-{HEX}");
        let id = extract_page_id(&url).expect("valid url");
        assert_eq!(id.to_string(), DASHED);
    }

    #[test]
    fn extracts_from_bare_id_url() {
        let url = format!("https://notion.so/{HEX}");
        assert_eq!(extract_page_id(&url).unwrap().to_string(), DASHED);
    }

    #[test]
    fn ignores_query_and_fragment() {
        let url = format!("https://acme.notion.site/Page-{HEX}?pvs=4#section");
        // Subdomain hosts other than www are not accepted.
        assert!(extract_page_id(&url).is_none());

        let url = format!("https://notion.site/Page-{HEX}?pvs=4#section");
        assert_eq!(extract_page_id(&url).unwrap().to_string(), DASHED);

        let url = format!("http://www.notion.so/a/b/c/Deep-Page-{HEX}#frag");
        assert_eq!(extract_page_id(&url).unwrap().to_string(), DASHED);
    }

    #[test]
    fn uppercase_is_folded_to_lowercase() {
        let url = format!("HTTPS://WWW.NOTION.SO/Page-{}", HEX.to_uppercase());
        assert_eq!(extract_page_id(&url).unwrap().to_string(), DASHED);
    }

    #[test]
    fn takes_trailing_32_hex_digits() {
        // More than 32 hex chars in the slug: the last 32 win.
        let url = format!("https://notion.so/ff{HEX}");
        assert_eq!(extract_page_id(&url).unwrap().to_string(), DASHED);
    }

    #[test]
    fn rejects_non_notion_urls() {
        assert!(extract_page_id(&format!("https://example.com/{HEX}")).is_none());
        assert!(extract_page_id(&format!("ftp://notion.so/{HEX}")).is_none());
        assert!(extract_page_id("https://notion.so/too-short-0123abcd").is_none());
        assert!(extract_page_id("not a url at all").is_none());
        assert!(extract_page_id("").is_none());
        assert!(!is_valid_notion_url("https://notion.com/whatever"));
    }

    #[test]
    fn page_id_parses_both_forms() {
        let compact: PageId = HEX.parse().unwrap();
        let dashed: PageId = DASHED.parse().unwrap();
        assert_eq!(compact, dashed);
        assert!("xyz".parse::<PageId>().is_err());
    }
}
