//! Brandex Extraction Strategies
//!
//! Default implementations of `brandex_core::ExtractionStrategy`: regex-driven
//! scanners over rendered HTML that contribute logo candidates, color samples,
//! and site name/description. Each strategy is independent; the pipeline runs
//! them all and merges their contributions, so a page that defeats one scanner
//! still gets results from the others.
//!
//! # Strategies
//!
//! - [`MetaTagLogo`] — OpenGraph/Twitter images and JSON-LD organization logos
//! - [`ImgTagLogo`] — `<img>` elements that look like logos
//! - [`LinkIconLogo`] — touch icons and favicons, with the default
//!   `/favicon.ico` fallback
//! - [`StylesheetColors`] — color literals in `<style>` blocks
//! - [`InlineStyleColors`] — color literals in `style=` attributes on
//!   brand-adjacent elements
//!
//! # Example
//!
//! ```rust,no_run
//! use brandex_core::prelude::*;
//! use brandex_extractors::default_strategies;
//!
//! # async fn example() -> Result<()> {
//! let pipeline = Pipeline::in_memory(PipelineConfig::default(), default_strategies()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow common patterns that are acceptable in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_self)]

use std::sync::Arc;

use brandex_core::ExtractionStrategy;

// Re-export brandex-core
pub use brandex_core;

mod css;
mod img;
mod link;
mod meta;
mod scan;

pub use css::{InlineStyleColors, StylesheetColors};
pub use img::ImgTagLogo;
pub use link::LinkIconLogo;
pub use meta::MetaTagLogo;

/// The full default strategy set, in contribution-priority order.
///
/// Order matters for name/description: the first strategy to produce one
/// wins. Logo and color ranking is score/weight based and does not depend
/// on this order.
pub fn default_strategies() -> Vec<Arc<dyn ExtractionStrategy>> {
    vec![
        Arc::new(MetaTagLogo),
        Arc::new(ImgTagLogo),
        Arc::new(LinkIconLogo),
        Arc::new(StylesheetColors),
        Arc::new(InlineStyleColors),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_covers_every_strategy_once() {
        let names: Vec<&str> = default_strategies().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "meta_tags",
                "img_tags",
                "link_icons",
                "stylesheet_colors",
                "inline_style_colors",
            ]
        );
    }
}
