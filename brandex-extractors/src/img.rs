//! Logo extraction from `<img>` elements.

use brandex_core::error::Result;
use brandex_core::fetcher::RenderedPage;
use brandex_core::strategy::{Contribution, ExtractionStrategy};
use brandex_core::types::Logo;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::scan::{attr, resolve};

const NAME: &str = "img_tags";

/// Substrings that mark an image as logo-like when found in its class, id,
/// alt text, or source path.
const LOGO_MARKERS: [&str; 4] = ["logo", "brand", "header-image", "site-logo"];

lazy_static! {
    static ref IMG_TAG: Regex = Regex::new(r"(?i)<img\b[^>]*>").expect("Invalid img tag regex");
}

/// Finds `<img>` elements whose attributes mention a logo marker and
/// resolves their sources against the page URL.
///
/// Where the marker appears decides the score: an author labelling the
/// element (`class`/`id`) is a stronger signal than alt text, which in turn
/// beats the marker merely appearing somewhere in the file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImgTagLogo;

impl ExtractionStrategy for ImgTagLogo {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extract(&self, page: &RenderedPage) -> Result<Contribution> {
        let base = Url::parse(&page.final_url)?;
        let mut contribution = Contribution::default();

        for tag in IMG_TAG.find_iter(&page.html) {
            let tag = tag.as_str();
            let Some(src) = attr(tag, "src") else {
                continue;
            };
            let alt = attr(tag, "alt");
            let Some(score) = marker_score(tag, &src, alt.as_deref()) else {
                continue;
            };
            if let Some(url) = resolve(&base, &src) {
                contribution.logos.push(Logo {
                    url,
                    alt: alt.filter(|a| !a.is_empty()),
                    source: NAME.to_owned(),
                    score,
                });
            }
        }

        debug!(strategy = NAME, logos = contribution.logos.len(), "img scan complete");
        Ok(contribution)
    }
}

fn marker_score(tag: &str, src: &str, alt: Option<&str>) -> Option<u32> {
    let class = attr(tag, "class").unwrap_or_default().to_lowercase();
    let id = attr(tag, "id").unwrap_or_default().to_lowercase();
    let alt = alt.unwrap_or_default().to_lowercase();
    let src = src.to_lowercase();

    for marker in LOGO_MARKERS {
        if class.contains(marker) {
            return Some(80);
        }
        if id.contains(marker) {
            return Some(78);
        }
        if alt.contains(marker) {
            return Some(70);
        }
        if src.contains(marker) {
            return Some(60);
        }
    }
    None
}
