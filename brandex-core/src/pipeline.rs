//! The extraction pipeline.
//!
//! [`Pipeline`] owns one configured instance of every resilience component
//! and sequences them per request: rate limit check, cache lookup, guarded
//! fetch, extraction strategies, assembly, best-effort cache write. Every
//! failure leaves [`Pipeline::extract`] as a classified [`ErrorReport`]
//! carrying the request's trace id; raw errors never reach the caller.
//!
//! # Example
//!
//! ```rust
//! use brandex_core::config::PipelineConfig;
//! use brandex_core::pipeline::Pipeline;
//! use brandex_core::types::ExtractRequest;
//!
//! # async fn example() -> Result<(), brandex_core::error::Error> {
//! let pipeline = Pipeline::in_memory(PipelineConfig::default(), vec![]).await?;
//!
//! let response = pipeline
//!     .extract(ExtractRequest::new("https://example.com", "203.0.113.9"))
//!     .await;
//! for (name, value) in response.rate_headers() {
//!     println!("{name}: {value}");
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::cache::Cache;
use crate::circuit_breaker::{BreakerRegistry, CircuitBreakerConfig};
use crate::config::PipelineConfig;
use crate::error::{Error, ErrorCategory, ErrorReport, Result};
use crate::fetcher::{HttpRenderer, PageRenderer, RenderedPage, RetryingFetcher};
use crate::rate_limiter::{RateLimitDecision, RateLimiter};
use crate::store::{KeyValueStore, MemoryStore, SlidingWindowStore};
use crate::strategy::{rank_colors, rank_logos, run_all, ExtractionReport, ExtractionStrategy};
use crate::time::epoch_seconds_f64;
use crate::types::{BrandIdentity, ExtractRequest};

/// Header carrying the request trace identifier across the boundary.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Registry name of the breaker guarding the page renderer.
pub const RENDERER_DEPENDENCY: &str = "renderer";

/// Cache namespace for extraction results.
const EXTRACT_NAMESPACE: &str = "extract";

/// The boundary-ready outcome of one extraction request.
///
/// The rate decision rides beside the outcome so transport adapters can
/// attach the `X-Rate-Limit-*` trio to successes and failures alike.
#[derive(Debug)]
pub struct PipelineResponse {
    /// Trace identifier, taken from the request or freshly generated.
    pub request_id: String,
    /// Rate accounting for this client. `None` only when the request was
    /// answered before the limiter was consulted.
    pub rate: Option<RateLimitDecision>,
    /// The extracted identity, or a classified failure ready to serialize.
    pub outcome: std::result::Result<BrandIdentity, Box<ErrorReport>>,
}

impl PipelineResponse {
    /// Transport status for this response: 200, or the report's status.
    #[must_use]
    pub fn transport_status(&self) -> u16 {
        match &self.outcome {
            Ok(_) => 200,
            Err(report) => report.status,
        }
    }

    /// Rate limit headers to attach to the transport response.
    #[must_use]
    pub fn rate_headers(&self) -> Vec<(&'static str, String)> {
        self.rate
            .as_ref()
            .map(|decision| decision.to_headers().to_vec())
            .unwrap_or_default()
    }
}

/// Orchestrates one extraction request end to end.
///
/// Construction wires the resilience components around injected seams (the
/// backing stores, the renderer, the breaker registry) so deployments and
/// tests choose the implementations; [`Pipeline::in_memory`] assembles the
/// all-defaults in-process variant.
pub struct Pipeline {
    cache: Cache,
    limiter: RateLimiter,
    fetcher: RetryingFetcher,
    registry: Arc<BreakerRegistry>,
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    config: PipelineConfig,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("cache", &self.cache)
            .field("strategies", &self.strategies.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Wires a pipeline from its component seams.
    ///
    /// The renderer's breaker is taken from `registry` under
    /// [`RENDERER_DEPENDENCY`], creating it with the renderer preset when
    /// the registry has no entry yet.
    pub async fn new(
        config: PipelineConfig,
        kv_store: Arc<dyn KeyValueStore>,
        window_store: Arc<dyn SlidingWindowStore>,
        renderer: Arc<dyn PageRenderer>,
        registry: Arc<BreakerRegistry>,
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
    ) -> Self {
        let cache = Cache::connect(kv_store, config.cache.clone()).await;
        let limiter = RateLimiter::new(window_store, config.rate_limiter.clone());
        let breaker =
            registry.get_or_create(RENDERER_DEPENDENCY, CircuitBreakerConfig::renderer());
        let fetcher = RetryingFetcher::new(renderer, breaker, config.fetcher.clone());
        Self {
            cache,
            limiter,
            fetcher,
            registry,
            strategies,
            config,
        }
    }

    /// Assembles a fully in-process pipeline: memory-backed stores, the
    /// reqwest-based [`HttpRenderer`], and a registry carrying the default
    /// breakers.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed from
    /// `config.render`.
    pub async fn in_memory(
        config: PipelineConfig,
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
    ) -> Result<Self> {
        let renderer = Arc::new(HttpRenderer::new(config.render.clone())?);
        Ok(Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            renderer,
            Arc::new(BreakerRegistry::with_defaults()),
            strategies,
        )
        .await)
    }

    /// The breaker registry this pipeline reports and records against.
    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Releases long-lived renderer resources. Call once at process
    /// shutdown; the default HTTP renderer holds nothing, but a browser
    /// renderer keeps sessions that must not leak.
    pub async fn shutdown(&self) -> Result<()> {
        self.fetcher.close().await
    }

    /// Runs one extraction request end to end.
    ///
    /// Never returns a raw error: every failure is classified into an
    /// [`ErrorReport`] tagged with the request's trace id and logged at a
    /// severity matching its status. The overall deadline from
    /// [`PipelineConfig::request_deadline`] covers everything after the
    /// rate limit check; the request's cancellation token, when present,
    /// aborts the same span of work.
    #[instrument(
        name = "pipeline_extract",
        skip(self, request),
        fields(
            url = %request.url,
            client = %request.client_identity,
            request_id = tracing::field::Empty,
        )
    )]
    pub async fn extract(&self, request: ExtractRequest) -> PipelineResponse {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("request_id", request_id.as_str());

        let decision = self.limiter.check(&request.client_identity).await;
        if !decision.allowed {
            let report = ErrorReport::new(
                "Rate limit exceeded, please retry later",
                ErrorCategory::RateLimit,
                429,
            )
            .with_trace_id(request_id.as_str())
            .with_field("limit", json!(decision.limit))
            .with_field("remaining", json!(decision.remaining))
            .with_field("reset_at", json!(decision.reset_at_seconds()));
            report.log();
            return PipelineResponse {
                request_id,
                rate: Some(decision),
                outcome: Err(Box::new(report)),
            };
        }

        let cancel = request.cancel.clone().unwrap_or_default();
        let deadline = self.config.request_deadline;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::cancelled("request cancelled by caller")),
            fetched = tokio::time::timeout(deadline, self.run(&request.url)) => match fetched {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::timeout(format!(
                    "request exceeded {deadline:?} deadline"
                ))),
            },
        };

        let outcome = outcome.map_err(|error| {
            let report = ErrorReport::classify(&error)
                .with_field("url", json!(request.url))
                .with_trace_id(request_id.as_str());
            report.log();
            Box::new(report)
        });

        PipelineResponse {
            request_id,
            rate: Some(decision),
            outcome,
        }
    }

    /// Clears every cached extraction result.
    ///
    /// Guarded by the configured admin secret; deployments without one have
    /// this operation disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when no admin secret is configured
    /// or `supplied_secret` does not match.
    pub async fn clear_cache(&self, supplied_secret: &str) -> Result<bool> {
        let Some(secret) = &self.config.admin_secret else {
            return Err(Error::authentication("Cache clear is not enabled"));
        };
        if !secret.matches(supplied_secret) {
            warn!("cache clear rejected, bad admin token");
            return Err(Error::authentication("Invalid or missing admin token"));
        }
        info!("clearing extraction cache");
        Ok(self.cache.clear_all().await)
    }

    /// The fallible stretch of one request: everything between the rate
    /// limit check and classification.
    async fn run(&self, raw_url: &str) -> Result<BrandIdentity> {
        let target = normalize_target(raw_url)?;
        let key = Cache::make_key(EXTRACT_NAMESPACE, &json!({ "url": target }));

        if let Some(value) = self.cache.get(&key).await {
            match serde_json::from_value::<BrandIdentity>(value) {
                Ok(mut identity) => {
                    identity.from_cache = true;
                    debug!(url = %target, "serving extraction from cache");
                    return Ok(identity);
                }
                Err(error) => {
                    warn!(url = %target, %error, "cached extraction failed to decode, refetching");
                }
            }
        }

        let page = self.fetcher.fetch(&target).await?;
        let report = run_all(&self.strategies, &page);
        let identity = assemble(&target, &page, report);

        match serde_json::to_value(&identity) {
            Ok(value) => {
                if !self.cache.set(&key, &value).await {
                    debug!(url = %target, "extraction result not cached");
                }
            }
            Err(error) => {
                warn!(url = %target, %error, "extraction result failed to serialize for cache");
            }
        }
        Ok(identity)
    }
}

fn assemble(url: &str, page: &RenderedPage, report: ExtractionReport) -> BrandIdentity {
    let ExtractionReport {
        contribution,
        degraded_steps,
    } = report;
    BrandIdentity {
        url: url.to_owned(),
        final_url: (page.final_url != url).then(|| page.final_url.clone()),
        name: contribution.name,
        description: contribution.description,
        logos: rank_logos(&contribution.logos),
        colors: rank_colors(&contribution.color_samples),
        fetched_at: epoch_seconds_f64(),
        from_cache: false,
        degraded_steps,
    }
}

/// Validates and canonicalizes the target URL.
///
/// A bare domain is upgraded to https. Beyond that, only absolute
/// http/https URLs with a host are accepted; anything else is a validation
/// failure answered before any fetch is attempted.
fn normalize_target(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("URL cannot be empty"));
    }
    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{trimmed}"))?,
        Err(error) => return Err(error.into()),
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::validation(format!(
            "URL scheme must be http or https, got {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(Error::validation("URL must include a host"));
    }
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::fetcher::FetcherConfig;
    use crate::rate_limiter::RateLimiterConfig;
    use crate::retry_strategy::RetryConfig;
    use crate::secret::SecretString;
    use crate::strategy::Contribution;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    enum Script {
        Html(&'static str),
        FailConnect,
        Hang,
    }

    struct ScriptedRenderer {
        script: Script,
        calls: AtomicU32,
    }

    impl ScriptedRenderer {
        fn html(html: &'static str) -> Arc<Self> {
            Arc::new(Self {
                script: Script::Html(html),
                calls: AtomicU32::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                script: Script::FailConnect,
                calls: AtomicU32::new(0),
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                script: Script::Hang,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageRenderer for ScriptedRenderer {
        async fn render(&self, url: &str) -> Result<RenderedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Html(html) => Ok(RenderedPage::new(html, url)),
                Script::FailConnect => {
                    Err(NetworkError::ConnectionFailed("connection refused".to_owned()).into())
                }
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(RenderedPage::new("", url))
                }
            }
        }
    }

    struct Canned;

    impl ExtractionStrategy for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn extract(&self, _page: &RenderedPage) -> Result<Contribution> {
            Ok(Contribution {
                name: Some("Example Inc".to_owned()),
                ..Contribution::default()
            })
        }
    }

    struct Broken;

    impl ExtractionStrategy for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn extract(&self, _page: &RenderedPage) -> Result<Contribution> {
            Err(Error::parse("no selectors matched"))
        }
    }

    struct DeadStore;

    #[async_trait]
    impl KeyValueStore for DeadStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::storage("store offline"))
        }

        async fn set_ex(&self, _key: &str, _ttl: Duration, _value: &str) -> Result<()> {
            Err(Error::storage("store offline"))
        }

        async fn delete(&self, _key: &str) -> Result<bool> {
            Err(Error::storage("store offline"))
        }

        async fn clear_all(&self) -> Result<()> {
            Err(Error::storage("store offline"))
        }
    }

    fn fast_fetch() -> FetcherConfig {
        FetcherConfig {
            retry: RetryConfig {
                max_retries: 0,
                base_delay_ms: 1,
                jitter_factor: 0.0,
                ..RetryConfig::default()
            },
            attempt_timeout: Duration::from_secs(5),
        }
    }

    async fn pipeline(renderer: Arc<dyn PageRenderer>, config: PipelineConfig) -> Pipeline {
        Pipeline::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            renderer,
            Arc::new(BreakerRegistry::with_defaults()),
            vec![Arc::new(Canned)],
        )
        .await
    }

    fn request(url: &str) -> ExtractRequest {
        ExtractRequest::new(url, "test-client")
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let renderer = ScriptedRenderer::html("<html><title>Example</title></html>");
        let pipeline = pipeline(renderer.clone(), PipelineConfig::default()).await;

        let first = pipeline.extract(request("https://example.com")).await;
        let identity = first.outcome.unwrap();
        assert!(!identity.from_cache);
        assert_eq!(identity.name.as_deref(), Some("Example Inc"));

        let second = pipeline.extract(request("https://example.com")).await;
        let identity = second.outcome.unwrap();
        assert!(identity.from_cache);
        assert_eq!(identity.name.as_deref(), Some("Example Inc"));
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn rate_limited_request_carries_the_header_trio() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let config = PipelineConfig {
            rate_limiter: RateLimiterConfig::new(1, Duration::from_secs(60)),
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(renderer.clone(), config).await;

        let first = pipeline.extract(request("https://example.com")).await;
        assert_eq!(first.transport_status(), 200);

        let second = pipeline.extract(request("https://example.com")).await;
        assert_eq!(second.transport_status(), 429);
        let headers = second.rate_headers();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[1], ("X-Rate-Limit-Remaining", "0".to_string()));
        let report = second.outcome.unwrap_err();
        assert_eq!(report.category, ErrorCategory::RateLimit);
        assert_eq!(report.trace_id.as_deref(), Some(second.request_id.as_str()));
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_before_fetching() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let pipeline = pipeline(renderer.clone(), PipelineConfig::default()).await;

        let empty = pipeline.extract(request("   ")).await;
        assert_eq!(empty.transport_status(), 400);
        assert_eq!(empty.outcome.unwrap_err().message, "URL cannot be empty");

        let hostless = pipeline.extract(request("http://")).await;
        assert_eq!(hostless.transport_status(), 400);

        let ftp = pipeline.extract(request("ftp://example.com/logo.png")).await;
        assert_eq!(ftp.transport_status(), 400);
        assert!(ftp.outcome.unwrap_err().message.contains("http or https"));

        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn bare_domains_are_upgraded_and_fetched() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let pipeline = pipeline(renderer.clone(), PipelineConfig::default()).await;

        let response = pipeline.extract(request("example.com")).await;

        let identity = response.outcome.unwrap();
        assert_eq!(identity.url, "https://example.com/");
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn connect_failure_classifies_as_bad_gateway() {
        let renderer = ScriptedRenderer::failing();
        let config = PipelineConfig {
            fetcher: fast_fetch(),
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(renderer, config).await;

        let response = pipeline.extract(request("https://unreachable.test")).await;

        assert_eq!(response.transport_status(), 502);
        let report = response.outcome.unwrap_err();
        assert_eq!(report.category, ErrorCategory::Network);
        assert_eq!(
            report.trace_id.as_deref(),
            Some(response.request_id.as_str())
        );
    }

    #[tokio::test]
    async fn failing_strategy_degrades_the_result_instead_of_failing_it() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let pipeline = Pipeline::new(
            PipelineConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            renderer,
            Arc::new(BreakerRegistry::with_defaults()),
            vec![Arc::new(Broken), Arc::new(Canned)],
        )
        .await;

        let response = pipeline.extract(request("https://example.com")).await;

        let identity = response.outcome.unwrap();
        assert_eq!(identity.degraded_steps, vec!["broken".to_owned()]);
        assert_eq!(identity.name.as_deref(), Some("Example Inc"));
    }

    #[tokio::test]
    async fn unreachable_cache_store_degrades_to_fetching() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let pipeline = Pipeline::new(
            PipelineConfig::default(),
            Arc::new(DeadStore),
            Arc::new(MemoryStore::new()),
            renderer.clone(),
            Arc::new(BreakerRegistry::with_defaults()),
            vec![Arc::new(Canned)],
        )
        .await;

        let first = pipeline.extract(request("https://example.com")).await;
        assert!(first.outcome.is_ok());
        let second = pipeline.extract(request("https://example.com")).await;
        assert!(!second.outcome.unwrap().from_cache);
        assert_eq!(renderer.calls(), 2);
    }

    #[tokio::test]
    async fn clear_cache_requires_the_admin_secret() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let no_secret = pipeline(renderer.clone(), PipelineConfig::default()).await;
        let err = no_secret.clear_cache("anything").await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication error: Cache clear is not enabled");

        let config = PipelineConfig {
            admin_secret: Some(SecretString::new("t0ps3cret")),
            ..PipelineConfig::default()
        };
        let guarded = pipeline(renderer, config).await;
        assert!(guarded.clear_cache("wrong").await.is_err());
        assert!(guarded.clear_cache("t0ps3cret").await.unwrap());
    }

    #[tokio::test]
    async fn cleared_cache_forces_a_refetch() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let config = PipelineConfig {
            admin_secret: Some(SecretString::new("t0ps3cret")),
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(renderer.clone(), config).await;

        pipeline
            .extract(request("https://example.com"))
            .await
            .outcome
            .unwrap();
        assert!(pipeline.clear_cache("t0ps3cret").await.unwrap());

        let after = pipeline.extract(request("https://example.com")).await;
        assert!(!after.outcome.unwrap().from_cache);
        assert_eq!(renderer.calls(), 2);
    }

    #[tokio::test]
    async fn overall_deadline_caps_a_hanging_fetch() {
        let renderer = ScriptedRenderer::hanging();
        let config = PipelineConfig {
            fetcher: fast_fetch(),
            request_deadline: Duration::from_millis(50),
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(renderer, config).await;

        let response = pipeline.extract(request("https://slow.test")).await;

        assert_eq!(response.transport_status(), 504);
        assert_eq!(response.outcome.unwrap_err().message, "Request timed out");
    }

    #[tokio::test]
    async fn pre_cancelled_request_never_reaches_the_renderer() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let pipeline = pipeline(renderer.clone(), PipelineConfig::default()).await;

        let token = CancellationToken::new();
        token.cancel();
        let mut req = request("https://example.com");
        req.cancel = Some(token);

        let response = pipeline.extract(req).await;

        assert_eq!(response.transport_status(), 500);
        assert_eq!(response.outcome.unwrap_err().message, "Request was cancelled");
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn request_id_is_preserved_when_supplied_and_generated_otherwise() {
        let renderer = ScriptedRenderer::html("<html></html>");
        let pipeline = pipeline(renderer, PipelineConfig::default()).await;

        let mut req = request("https://example.com");
        req.request_id = Some("req-42".to_owned());
        let supplied = pipeline.extract(req).await;
        assert_eq!(supplied.request_id, "req-42");

        let generated = pipeline.extract(request("https://example.com")).await;
        assert!(Uuid::parse_str(&generated.request_id).is_ok());
    }

    #[tokio::test]
    async fn open_breaker_short_circuits_requests() {
        let renderer = ScriptedRenderer::failing();
        let config = PipelineConfig {
            fetcher: fast_fetch(),
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(renderer.clone(), config).await;

        // Renderer preset opens after five consecutive failures.
        for _ in 0..5 {
            let response = pipeline.extract(request("https://unreachable.test")).await;
            assert_eq!(response.transport_status(), 502);
        }

        let rejected = pipeline.extract(request("https://unreachable.test")).await;
        assert_eq!(rejected.transport_status(), 503);
        assert_eq!(
            rejected.outcome.unwrap_err().category,
            ErrorCategory::ExternalService
        );
        assert_eq!(renderer.calls(), 5);
    }

    #[test]
    fn normalize_target_canonicalizes_and_validates() {
        assert_eq!(
            normalize_target(" https://example.com ").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_target("example.com").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_target("http://example.com/about?x=1").unwrap(),
            "http://example.com/about?x=1"
        );
        assert!(normalize_target("").is_err());
        assert!(normalize_target("not a url").is_err());
        assert!(normalize_target("file:///etc/passwd").is_err());
    }
}
