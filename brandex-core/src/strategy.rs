//! Extraction strategies and result ranking.
//!
//! A strategy inspects one rendered page and contributes whatever brand
//! signals it recognizes. Strategies are independent: one failing never
//! stops the others, it only marks the run as degraded. Ranking then
//! merges every contribution into the final logo and palette ordering.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::fetcher::RenderedPage;
use crate::types::{BrandColor, ColorRole, Logo};

/// One color observation with how strongly the page suggested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSample {
    /// Normalized `#rrggbb` form, see [`normalize_hex`].
    pub hex: String,
    pub weight: u32,
}

impl ColorSample {
    pub fn new(hex: impl Into<String>, weight: u32) -> Self {
        Self {
            hex: hex.into(),
            weight,
        }
    }
}

/// What a single strategy found on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    pub logos: Vec<Logo>,
    pub color_samples: Vec<ColorSample>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Contribution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logos.is_empty()
            && self.color_samples.is_empty()
            && self.name.is_none()
            && self.description.is_none()
    }

    /// Folds another contribution into this one. Logos and color samples
    /// accumulate; for name and description the first finding wins, so
    /// strategy order decides which source takes precedence.
    pub fn absorb(&mut self, other: Contribution) {
        self.logos.extend(other.logos);
        self.color_samples.extend(other.color_samples);
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.description.is_none() {
            self.description = other.description;
        }
    }
}

/// A single way of reading brand signals out of a page.
pub trait ExtractionStrategy: Send + Sync {
    /// Stable identifier, used in logs and degraded-step reporting.
    fn name(&self) -> &'static str;

    /// Inspects the page. Finding nothing is `Ok` with an empty
    /// contribution; `Err` means the strategy itself broke.
    fn extract(&self, page: &RenderedPage) -> Result<Contribution>;
}

/// Merged output of an extraction pass.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub contribution: Contribution,
    /// Names of strategies that failed on this page.
    pub degraded_steps: Vec<String>,
}

/// Runs every strategy against the page and merges what they found.
///
/// A failing strategy is logged and recorded in `degraded_steps`; its
/// error never reaches the caller.
pub fn run_all(strategies: &[Arc<dyn ExtractionStrategy>], page: &RenderedPage) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    for strategy in strategies {
        match strategy.extract(page) {
            Ok(found) => report.contribution.absorb(found),
            Err(error) => {
                warn!(
                    strategy = strategy.name(),
                    url = %page.final_url,
                    %error,
                    "extraction strategy failed"
                );
                report.degraded_steps.push(strategy.name().to_owned());
            }
        }
    }
    report
}

/// Normalizes a CSS hex color to lowercase `#rrggbb`.
///
/// Accepts 3- or 6-digit forms with or without the leading `#`. Anything
/// else, including 4- and 8-digit alpha forms, is rejected.
#[must_use]
pub fn normalize_hex(raw: &str) -> Option<String> {
    let digits = raw.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => digits.to_owned(),
        _ => return None,
    };
    Some(format!("#{}", expanded.to_ascii_lowercase()))
}

/// Relative luminance of a normalized `#rrggbb` color, in `0.0..=1.0`.
fn luminance(hex: &str) -> f64 {
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_or(0.0, f64::from)
    };
    let (r, g, b) = (channel(1..3), channel(3..5), channel(5..7));
    (0.2126 * r + 0.7152 * g + 0.0722 * b) / 255.0
}

const MAX_BRAND_COLORS: usize = 3;
const NEAR_WHITE_LUMINANCE: f64 = 0.95;
const NEAR_BLACK_LUMINANCE: f64 = 0.05;

/// Merges color samples into the final palette.
///
/// Samples run through [`normalize_hex`] first, so the same color pools
/// its weight across notations and anything that is not a parseable hex
/// color is dropped rather than trusted from a custom strategy. Near-white
/// and near-black colors are dropped as page chrome rather than brand. The
/// three heaviest survivors become primary, secondary and accent; ties
/// break by hex so the palette is stable across runs.
#[must_use]
pub fn rank_colors(samples: &[ColorSample]) -> Vec<BrandColor> {
    let mut pooled: HashMap<String, u32> = HashMap::new();
    for sample in samples {
        let Some(hex) = normalize_hex(&sample.hex) else {
            continue;
        };
        *pooled.entry(hex).or_default() += sample.weight;
    }

    let mut ranked: Vec<(String, u32)> = pooled
        .into_iter()
        .filter(|(hex, _)| {
            let lum = luminance(hex);
            lum <= NEAR_WHITE_LUMINANCE && lum >= NEAR_BLACK_LUMINANCE
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(MAX_BRAND_COLORS)
        .zip([ColorRole::Primary, ColorRole::Secondary, ColorRole::Accent])
        .map(|((hex, weight), role)| BrandColor { hex, role, weight })
        .collect()
}

/// Deduplicates and orders logo candidates.
///
/// The same URL reported by several strategies keeps its best score.
/// Ordering is score-descending with URL as the tiebreak.
#[must_use]
pub fn rank_logos(candidates: &[Logo]) -> Vec<Logo> {
    let mut best: HashMap<&str, &Logo> = HashMap::new();
    for logo in candidates {
        best.entry(logo.url.as_str())
            .and_modify(|kept| {
                if logo.score > kept.score {
                    *kept = logo;
                }
            })
            .or_insert(logo);
    }

    let mut ranked: Vec<Logo> = best.into_values().cloned().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.url.cmp(&b.url)));
    ranked
}
