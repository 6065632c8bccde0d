//! Page rendering abstraction.
//!
//! The fetcher does not care how a page turns into content. The default
//! implementation is the plain HTTP [`HttpRenderer`](super::HttpRenderer);
//! a browser-based renderer implements the same trait when JavaScript-heavy
//! sites need real rendering.

use async_trait::async_trait;

use crate::error::Result;

/// A rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Page markup after rendering.
    pub html: String,
    /// Where the navigation actually landed after redirects.
    pub final_url: String,
    /// HTTP status of the final response.
    pub status: u16,
    /// Base64-encoded screenshot, when the renderer can produce one. The
    /// HTTP renderer never does; a browser renderer may.
    pub snapshot: Option<String>,
}

impl RenderedPage {
    /// A page with just markup and a landing URL, status 200.
    pub fn new(html: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            final_url: final_url.into(),
            status: 200,
            snapshot: None,
        }
    }
}

/// Renders one target URL into its content.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigates to `url` and returns the rendered page.
    ///
    /// Implementations classify their own failures: invalid targets as
    /// validation errors, network trouble as network errors, upstream
    /// refusals by status.
    async fn render(&self, url: &str) -> Result<RenderedPage>;

    /// Releases any OS resources held across requests (browser sessions,
    /// pooled sockets). Idempotent; implementations that hold nothing keep
    /// the no-op default.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
