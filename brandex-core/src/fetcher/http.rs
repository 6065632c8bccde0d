//! Plain HTTP implementation of [`PageRenderer`].
//!
//! Fetches page markup with `reqwest`: no script execution, no screenshot.
//! Bodies are streamed against a hard size cap and user agents rotate
//! per request so targets see a browser-shaped client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::error::config::{ConfigValidationError, ValidationResult};
use crate::error::{Error, NetworkError, Result};

use super::renderer::{PageRenderer, RenderedPage};

/// Default ceiling on rendered page size: 5 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// Rendering configuration shared by renderer implementations.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Overall budget for one navigation, including the body read.
    pub navigation_timeout: Duration,
    /// TCP connect budget.
    pub connect_timeout: Duration,
    /// Hard cap on response body size in bytes.
    pub max_body_bytes: usize,
    /// User agents rotated across requests. Empty falls back to the
    /// built-in rotation.
    pub user_agents: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agents: default_user_agents(),
        }
    }
}

impl RenderConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first fatal problem found: a zero timeout or a body cap
    /// too small to hold a real page.
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        if self.navigation_timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "navigation_timeout",
                "must be greater than zero",
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "connect_timeout",
                "must be greater than zero",
            ));
        }
        if self.max_body_bytes < 1024 {
            return Err(ConfigValidationError::too_low(
                "max_body_bytes",
                self.max_body_bytes,
                1024,
            ));
        }

        let mut warnings = Vec::new();
        if self.navigation_timeout > Duration::from_secs(120) {
            warnings.push(format!(
                "navigation_timeout of {:?} lets one slow target occupy a fetch slot for minutes",
                self.navigation_timeout
            ));
        }
        if self.user_agents.is_empty() {
            warnings.push("user_agents is empty, falling back to the built-in rotation".to_owned());
        }
        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// HTTP page renderer with body streaming and user-agent rotation.
#[derive(Debug)]
pub struct HttpRenderer {
    client: Client,
    config: RenderConfig,
    next_agent: AtomicUsize,
}

impl HttpRenderer {
    /// Creates a renderer from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(mut config: RenderConfig) -> Result<Self> {
        if config.user_agents.is_empty() {
            config.user_agents = default_user_agents();
        }

        let client = Client::builder()
            .timeout(config.navigation_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            next_agent: AtomicUsize::new(0),
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn next_user_agent(&self) -> &str {
        let turn = self.next_agent.fetch_add(1, Ordering::Relaxed);
        &self.config.user_agents[turn % self.config.user_agents.len()]
    }

    /// Streams the response body, refusing anything over the size cap.
    async fn read_limited(&self, response: Response) -> Result<Vec<u8>> {
        let cap = self.config.max_body_bytes;

        if let Some(content_length) = response.content_length() {
            if content_length > cap as u64 {
                warn!(
                    content_length,
                    cap, "page body over the size cap (Content-Length check)"
                );
                return Err(NetworkError::BodyTooLarge { limit: cap }.into());
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let capacity = response
            .content_length()
            .map_or(64 * 1024, |len| std::cmp::min(len as usize, cap));

        let mut stream = response.bytes_stream();
        let mut body = Vec::with_capacity(capacity);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(NetworkError::from)?;
            if body.len().saturating_add(chunk.len()) > cap {
                warn!(
                    received = body.len() + chunk.len(),
                    cap, "page body over the size cap while streaming"
                );
                return Err(NetworkError::BodyTooLarge { limit: cap }.into());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let target = Url::parse(url)?;
        match target.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::validation(format!(
                    "unsupported URL scheme '{other}'"
                )));
            }
        }

        let agent = self.next_user_agent().to_owned();
        debug!(url, agent = %agent, "rendering page");

        let response = self
            .client
            .get(target)
            .header(USER_AGENT, agent)
            .send()
            .await
            .map_err(Error::from)?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            return Err(status_error(status, &final_url, retry_after));
        }

        let body = self.read_limited(response).await?;
        let html = String::from_utf8_lossy(&body).into_owned();
        debug!(
            url = %final_url,
            status = status.as_u16(),
            bytes = html.len(),
            "page rendered"
        );

        Ok(RenderedPage {
            html,
            final_url,
            status: status.as_u16(),
            snapshot: None,
        })
    }
}

/// Reads a `Retry-After` header in its delay-seconds form.
///
/// The HTTP-date form is rare on rate-limit responses and is ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Maps a non-success status from the target into the error taxonomy.
fn status_error(status: StatusCode, url: &str, retry_after: Option<Duration>) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(
                url,
                retry_after_seconds = retry_after.map(|d| d.as_secs()),
                "target is rate limiting us"
            );
            Error::rate_limited(format!("{url} answered 429"), retry_after)
        }
        StatusCode::GATEWAY_TIMEOUT => {
            warn!(url, "target gateway timed out");
            NetworkError::Timeout.into()
        }
        _ => {
            let message = status
                .canonical_reason()
                .unwrap_or("upstream failure")
                .to_owned();
            if status.is_server_error() {
                warn!(url, status = status.as_u16(), "target answered with a server error");
            } else {
                debug!(url, status = status.as_u16(), "target refused the request");
            }
            NetworkError::RequestFailed {
                status: status.as_u16(),
                message,
            }
            .into()
        }
    }
}
