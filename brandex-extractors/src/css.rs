//! Color extraction from embedded CSS and inline styles.

use brandex_core::error::Result;
use brandex_core::fetcher::RenderedPage;
use brandex_core::strategy::{normalize_hex, ColorSample, Contribution, ExtractionStrategy};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::scan::attr;

/// Inline styles on brand-adjacent elements are a deliberate authoring
/// choice, so their colors weigh heavier than the stylesheet pool.
const WEIGHT_STYLESHEET: u32 = 1;
const WEIGHT_INLINE: u32 = 3;

/// Elements whose inline styles are read as brand signals.
const BRAND_ELEMENTS: [&str; 3] = ["header", "nav", "footer"];

/// Class/id substrings that mark any other element as brand-adjacent.
const BRAND_MARKERS: [&str; 6] = ["header", "nav", "footer", "brand", "logo", "site-title"];

lazy_static! {
    static ref STYLE_BLOCK: Regex =
        Regex::new(r"(?is)<style\b[^>]*>(.*?)</style>").expect("Invalid style block regex");
    static ref STYLED_TAG: Regex =
        Regex::new(r"(?i)<([a-z][a-z0-9]*)\b[^>]*>").expect("Invalid styled tag regex");
    static ref HEX_COLOR: Regex =
        Regex::new(r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("Invalid hex color regex");
    static ref RGB_COLOR: Regex =
        Regex::new(r"rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)")
            .expect("Invalid rgb color regex");
}

/// Parses `#rgb`/`#rrggbb` literals and `rgb(r, g, b)` tuples out of raw
/// CSS text, normalizing everything into `#rrggbb` samples.
fn collect_colors(css: &str, weight: u32, out: &mut Vec<ColorSample>) {
    for m in HEX_COLOR.find_iter(css) {
        if let Some(hex) = normalize_hex(m.as_str()) {
            out.push(ColorSample::new(hex, weight));
        }
    }
    for caps in RGB_COLOR.captures_iter(css) {
        let channels = (
            caps[1].parse::<u8>(),
            caps[2].parse::<u8>(),
            caps[3].parse::<u8>(),
        );
        if let (Ok(r), Ok(g), Ok(b)) = channels {
            out.push(ColorSample::new(format!("#{r:02x}{g:02x}{b:02x}"), weight));
        }
    }
}

/// Reads every color literal inside the page's `<style>` blocks.
///
/// External stylesheets are not fetched; the rendered document is the only
/// input this layer sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct StylesheetColors;

impl ExtractionStrategy for StylesheetColors {
    fn name(&self) -> &'static str {
        "stylesheet_colors"
    }

    fn extract(&self, page: &RenderedPage) -> Result<Contribution> {
        let mut contribution = Contribution::default();
        for block in STYLE_BLOCK.captures_iter(&page.html) {
            collect_colors(&block[1], WEIGHT_STYLESHEET, &mut contribution.color_samples);
        }
        debug!(
            strategy = self.name(),
            samples = contribution.color_samples.len(),
            "stylesheet scan complete"
        );
        Ok(contribution)
    }
}

/// Reads color literals from `style=` attributes, but only on elements
/// that plausibly carry brand styling: structural chrome (`header`, `nav`,
/// `footer`) and anything whose class or id names a brand marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleColors;

impl ExtractionStrategy for InlineStyleColors {
    fn name(&self) -> &'static str {
        "inline_style_colors"
    }

    fn extract(&self, page: &RenderedPage) -> Result<Contribution> {
        let mut contribution = Contribution::default();
        for caps in STYLED_TAG.captures_iter(&page.html) {
            let tag = &caps[0];
            let Some(style) = attr(tag, "style") else {
                continue;
            };
            if !is_brand_element(&caps[1].to_ascii_lowercase(), tag) {
                continue;
            }
            collect_colors(&style, WEIGHT_INLINE, &mut contribution.color_samples);
        }
        debug!(
            strategy = self.name(),
            samples = contribution.color_samples.len(),
            "inline style scan complete"
        );
        Ok(contribution)
    }
}

fn is_brand_element(element: &str, tag: &str) -> bool {
    if BRAND_ELEMENTS.contains(&element) {
        return true;
    }
    let class = attr(tag, "class").unwrap_or_default().to_lowercase();
    let id = attr(tag, "id").unwrap_or_default().to_lowercase();
    BRAND_MARKERS
        .iter()
        .any(|marker| class.contains(marker) || id.contains(marker))
}
