//! Shared helpers for the regex-driven HTML scanners.
//!
//! These operate on raw tag text, not a parsed DOM; attribute extraction
//! tolerates either quote style, unquoted values, and arbitrary attribute
//! order inside the tag.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    /// One `name="value"` pair inside a tag, with double-quoted,
    /// single-quoted, and unquoted value forms.
    static ref TAG_ATTR: Regex = Regex::new(
        r#"(?i)([a-z][a-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#
    )
    .expect("Invalid attribute regex");
}

/// Returns the value of `name` inside `tag`, or `None` when absent.
///
/// The first occurrence wins; the name comparison is case-insensitive.
pub(crate) fn attr(tag: &str, name: &str) -> Option<String> {
    for caps in TAG_ATTR.captures_iter(tag) {
        if caps[1].eq_ignore_ascii_case(name) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim().to_owned());
            return value;
        }
    }
    None
}

/// Resolves `href` against `base`, absolutizing relative references.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|resolved| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_handles_quote_styles_and_order() {
        let tag = r#"<meta content="https://cdn.example.com/og.png" property='og:image'>"#;
        assert_eq!(attr(tag, "property").as_deref(), Some("og:image"));
        assert_eq!(
            attr(tag, "content").as_deref(),
            Some("https://cdn.example.com/og.png")
        );

        let unquoted = "<img src=/logo.png class=site-logo>";
        assert_eq!(attr(unquoted, "src").as_deref(), Some("/logo.png"));
        assert_eq!(attr(unquoted, "class").as_deref(), Some("site-logo"));
    }

    #[test]
    fn attr_is_case_insensitive_and_misses_cleanly() {
        let tag = r#"<IMG SRC="/a.png">"#;
        assert_eq!(attr(tag, "src").as_deref(), Some("/a.png"));
        assert_eq!(attr(tag, "alt"), None);
    }

    #[test]
    fn resolve_joins_relative_and_keeps_absolute() {
        let base = Url::parse("https://example.com/pages/about").unwrap();
        assert_eq!(
            resolve(&base, "/static/logo.svg").as_deref(),
            Some("https://example.com/static/logo.svg")
        );
        assert_eq!(
            resolve(&base, "img/logo.png").as_deref(),
            Some("https://example.com/pages/img/logo.png")
        );
        assert_eq!(
            resolve(&base, "https://cdn.example.net/l.png").as_deref(),
            Some("https://cdn.example.net/l.png")
        );
        assert_eq!(resolve(&base, "   "), None);
    }
}
