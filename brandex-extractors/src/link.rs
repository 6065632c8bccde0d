//! Icon extraction from `<link>` elements.

use brandex_core::error::Result;
use brandex_core::fetcher::RenderedPage;
use brandex_core::strategy::{Contribution, ExtractionStrategy};
use brandex_core::types::Logo;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::scan::{attr, resolve};

const NAME: &str = "link_icons";

/// Touch icons are served at larger sizes than favicons.
const SCORE_TOUCH_ICON: u32 = 50;
const SCORE_FAVICON: u32 = 40;
const SCORE_DEFAULT_FAVICON: u32 = 20;

lazy_static! {
    static ref LINK_TAG: Regex = Regex::new(r"(?i)<link\b[^>]*>").expect("Invalid link tag regex");
}

/// Collects declared icons, falling back to the conventional
/// `/favicon.ico` location when the page declares none.
///
/// Icons are last-resort logo candidates; their scores keep them below
/// anything found in metadata or the document body. The default-location
/// fallback is emitted without checking that the file exists, matching the
/// candidates-only contract of this layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkIconLogo;

impl ExtractionStrategy for LinkIconLogo {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extract(&self, page: &RenderedPage) -> Result<Contribution> {
        let base = Url::parse(&page.final_url)?;
        let mut contribution = Contribution::default();

        for tag in LINK_TAG.find_iter(&page.html) {
            let tag = tag.as_str();
            let Some(rel) = attr(tag, "rel") else {
                continue;
            };
            let rel = rel.to_ascii_lowercase();
            let score = if rel.contains("apple-touch-icon") {
                SCORE_TOUCH_ICON
            } else if rel.split_whitespace().any(|token| token == "icon") {
                SCORE_FAVICON
            } else {
                continue;
            };
            let Some(href) = attr(tag, "href") else {
                continue;
            };
            if let Some(url) = resolve(&base, &href) {
                contribution.logos.push(Logo {
                    url,
                    alt: None,
                    source: NAME.to_owned(),
                    score,
                });
            }
        }

        if contribution.logos.is_empty() {
            if let Some(url) = resolve(&base, "/favicon.ico") {
                contribution.logos.push(Logo {
                    url,
                    alt: None,
                    source: NAME.to_owned(),
                    score: SCORE_DEFAULT_FAVICON,
                });
            }
        }

        debug!(strategy = NAME, icons = contribution.logos.len(), "link scan complete");
        Ok(contribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> RenderedPage {
        RenderedPage::new(html, "https://example.com/")
    }

    #[test]
    fn touch_icon_outranks_favicon() {
        let page = page(concat!(
            r#"<link rel="icon" href="/favicon-32.png" sizes="32x32">"#,
            r#"<link rel="apple-touch-icon" href="/touch-180.png">"#,
        ));

        let contribution = LinkIconLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 2);
        let touch = contribution
            .logos
            .iter()
            .find(|l| l.url.ends_with("touch-180.png"))
            .unwrap();
        assert_eq!(touch.score, SCORE_TOUCH_ICON);
        let favicon = contribution
            .logos
            .iter()
            .find(|l| l.url.ends_with("favicon-32.png"))
            .unwrap();
        assert_eq!(favicon.score, SCORE_FAVICON);
    }

    #[test]
    fn shortcut_icon_rel_is_matched_by_token() {
        let page = page(r#"<link rel="shortcut icon" href="favicon.ico">"#);

        let contribution = LinkIconLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 1);
        assert_eq!(contribution.logos[0].url, "https://example.com/favicon.ico");
        assert_eq!(contribution.logos[0].score, SCORE_FAVICON);
    }

    #[test]
    fn precomposed_touch_icon_is_recognized() {
        let page = page(r#"<link rel="apple-touch-icon-precomposed" href="/touch.png">"#);

        let contribution = LinkIconLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos[0].score, SCORE_TOUCH_ICON);
    }

    #[test]
    fn default_favicon_is_the_fallback() {
        let page = page(r#"<link rel="stylesheet" href="/main.css">"#);

        let contribution = LinkIconLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 1);
        assert_eq!(contribution.logos[0].url, "https://example.com/favicon.ico");
        assert_eq!(contribution.logos[0].score, SCORE_DEFAULT_FAVICON);
    }

    #[test]
    fn declared_icons_suppress_the_fallback() {
        let page = page(r#"<link rel="icon" href="/fav.svg">"#);

        let contribution = LinkIconLogo.extract(&page).unwrap();

        assert_eq!(contribution.logos.len(), 1);
        assert_eq!(contribution.logos[0].url, "https://example.com/fav.svg");
    }
}
