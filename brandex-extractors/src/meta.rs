//! Logo, name, and description extraction from document metadata.

use brandex_core::error::Result;
use brandex_core::fetcher::RenderedPage;
use brandex_core::strategy::{Contribution, ExtractionStrategy};
use brandex_core::types::Logo;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::scan::{attr, resolve};

const NAME: &str = "meta_tags";

/// JSON-LD organization logos are the most explicit signal a page gives.
const SCORE_JSON_LD: u32 = 95;
const SCORE_OG_IMAGE: u32 = 90;
const SCORE_TWITTER_IMAGE: u32 = 85;

lazy_static! {
    static ref META_TAG: Regex = Regex::new(r"(?i)<meta\b[^>]*>").expect("Invalid meta tag regex");
    static ref JSON_LD: Regex = Regex::new(
        r#"(?is)<script\b[^>]*application/ld\+json[^>]*>(.*?)</script>"#
    )
    .expect("Invalid JSON-LD script regex");
}

/// Reads `og:image`, `twitter:image`, and JSON-LD `logo` fields, plus the
/// site name and description the same tags carry.
///
/// Social-card images are not always logos, but they are what the site
/// chose to represent itself with, so they rank above scraped `<img>`
/// candidates and below an explicit JSON-LD organization logo.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaTagLogo;

impl ExtractionStrategy for MetaTagLogo {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extract(&self, page: &RenderedPage) -> Result<Contribution> {
        let base = Url::parse(&page.final_url)?;
        let mut contribution = Contribution::default();

        for tag in META_TAG.find_iter(&page.html) {
            let tag = tag.as_str();
            let Some(key) = attr(tag, "property").or_else(|| attr(tag, "name")) else {
                continue;
            };
            match key.to_ascii_lowercase().as_str() {
                "og:image" => push_logo(&mut contribution, &base, tag, SCORE_OG_IMAGE),
                "twitter:image" => push_logo(&mut contribution, &base, tag, SCORE_TWITTER_IMAGE),
                "og:site_name" => {
                    if contribution.name.is_none() {
                        contribution.name = attr(tag, "content").filter(|c| !c.is_empty());
                    }
                }
                "description" | "og:description" => {
                    if contribution.description.is_none() {
                        contribution.description = attr(tag, "content").filter(|c| !c.is_empty());
                    }
                }
                _ => {}
            }
        }

        for block in JSON_LD.captures_iter(&page.html) {
            match serde_json::from_str::<Value>(&block[1]) {
                Ok(data) => walk_json_ld(&data, &base, &mut contribution),
                Err(error) => {
                    debug!(%error, "skipping malformed JSON-LD block");
                }
            }
        }

        debug!(
            strategy = NAME,
            logos = contribution.logos.len(),
            named = contribution.name.is_some(),
            "metadata scan complete"
        );
        Ok(contribution)
    }
}

fn push_logo(contribution: &mut Contribution, base: &Url, tag: &str, score: u32) {
    if let Some(content) = attr(tag, "content") {
        if let Some(url) = resolve(base, &content) {
            contribution.logos.push(Logo {
                url,
                alt: None,
                source: NAME.to_owned(),
                score,
            });
        }
    }
}

/// Collects `logo` and `name` fields from a JSON-LD document, descending
/// into arrays and `@graph` children.
fn walk_json_ld(data: &Value, base: &Url, contribution: &mut Contribution) {
    match data {
        Value::Array(items) => {
            for item in items {
                walk_json_ld(item, base, contribution);
            }
        }
        Value::Object(map) => {
            if let Some(url) = map.get("logo").and_then(logo_url).and_then(|raw| resolve(base, raw))
            {
                contribution.logos.push(Logo {
                    url,
                    alt: None,
                    source: NAME.to_owned(),
                    score: SCORE_JSON_LD,
                });
            }
            if contribution.name.is_none() {
                if let Some(name) = map.get("name").and_then(Value::as_str) {
                    if !name.is_empty() {
                        contribution.name = Some(name.to_owned());
                    }
                }
            }
            if let Some(graph) = map.get("@graph") {
                walk_json_ld(graph, base, contribution);
            }
        }
        _ => {}
    }
}

/// A JSON-LD logo is either a bare URL string or an ImageObject.
fn logo_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(url) => Some(url.as_str()),
        Value::Object(map) => map.get("url").and_then(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> RenderedPage {
        RenderedPage::new(html, "https://example.com/")
    }

    #[test]
    fn og_image_and_site_metadata_are_collected() {
        let page = page(concat!(
            r#"<meta property="og:image" content="/static/card.png">"#,
            r#"<meta property="og:site_name" content="Example Inc">"#,
            r#"<meta name="description" content="We make examples.">"#,
        ));

        let contribution = MetaTagLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 1);
        assert_eq!(contribution.logos[0].url, "https://example.com/static/card.png");
        assert_eq!(contribution.logos[0].score, SCORE_OG_IMAGE);
        assert_eq!(contribution.logos[0].source, "meta_tags");
        assert_eq!(contribution.name.as_deref(), Some("Example Inc"));
        assert_eq!(contribution.description.as_deref(), Some("We make examples."));
    }

    #[test]
    fn twitter_image_scores_below_og() {
        let page = page(concat!(
            r#"<meta name="twitter:image" content="https://cdn.example.com/tw.png">"#,
            r#"<meta property="og:image" content="https://cdn.example.com/og.png">"#,
        ));

        let contribution = MetaTagLogo.extract(&page).unwrap();

        let scores: Vec<u32> = contribution.logos.iter().map(|l| l.score).collect();
        assert!(scores.contains(&SCORE_OG_IMAGE));
        assert!(scores.contains(&SCORE_TWITTER_IMAGE));
        assert!(SCORE_OG_IMAGE > SCORE_TWITTER_IMAGE);
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let page = page(r#"<meta content="/og.png" property="og:image" />"#);

        let contribution = MetaTagLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos[0].url, "https://example.com/og.png");
    }

    #[test]
    fn json_ld_logo_string_form() {
        let page = page(
            r#"<script type="application/ld+json">
            {"@type": "Organization", "name": "Example Inc", "logo": "https://example.com/logo.png"}
            </script>"#,
        );

        let contribution = MetaTagLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 1);
        assert_eq!(contribution.logos[0].score, SCORE_JSON_LD);
        assert_eq!(contribution.name.as_deref(), Some("Example Inc"));
    }

    #[test]
    fn json_ld_image_object_and_graph_forms() {
        let page = page(
            r#"<script type="application/ld+json">
            {"@graph": [
                {"@type": "WebSite", "name": "Example"},
                {"@type": "Organization", "logo": {"@type": "ImageObject", "url": "/logo.svg"}}
            ]}
            </script>"#,
        );

        let contribution = MetaTagLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 1);
        assert_eq!(contribution.logos[0].url, "https://example.com/logo.svg");
    }

    #[test]
    fn malformed_json_ld_is_skipped() {
        let page = page(r#"<script type="application/ld+json">{not json at all</script>"#);

        let contribution = MetaTagLogo.extract(&page).unwrap();

        assert!(contribution.is_empty());
    }

    #[test]
    fn pages_without_metadata_contribute_nothing() {
        let page = page("<html><body><p>hello</p></body></html>");

        let contribution = MetaTagLogo.extract(&page).unwrap();

        assert!(contribution.is_empty());
    }
}
