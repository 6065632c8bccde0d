//! Failure-path integration tests.
//!
//! The pipeline's resilience promises only show up under failure: backing
//! stores that are down, a renderer that keeps refusing connections, a
//! strategy that panics on its input. Each scenario here injects one of
//! those through the pipeline's seams and checks that the request shrinks
//! instead of breaking.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brandex::prelude::*;
use brandex_core::error::NetworkError;
use brandex_core::fetcher::FetcherConfig;
use brandex_core::pipeline::RENDERER_DEPENDENCY;
use brandex_core::store::WindowSnapshot;
use brandex_core::strategy::Contribution;
use brandex_extractors::MetaTagLogo;

const BRANDED_PAGE: &str = r#"<html><head>
    <meta property="og:site_name" content="Acme Rockets">
    <meta property="og:image" content="https://cdn.acme.test/logo.png">
</head><body></body></html>"#;

/// Renderer that refuses the first `failures` connections, then serves a
/// fixed page.
struct FlakyRenderer {
    failures: u32,
    calls: AtomicU32,
}

impl FlakyRenderer {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for FlakyRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(NetworkError::ConnectionFailed("connection refused".to_owned()).into());
        }
        Ok(RenderedPage::new(BRANDED_PAGE, url))
    }
}

/// Store that answers every call with a storage error.
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

#[async_trait]
impl SlidingWindowStore for DeadStore {
    async fn record(
        &self,
        _key: &str,
        _now_ms: i64,
        _window: Duration,
        _limit: u32,
    ) -> Result<WindowSnapshot> {
        Err(Error::storage("store offline"))
    }
}

/// One renderer attempt per request, so breaker accounting is exact.
fn no_retry_config() -> PipelineConfig {
    PipelineConfig {
        fetcher: FetcherConfig {
            retry: RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
            ..FetcherConfig::default()
        },
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn requests_succeed_with_every_backing_store_down() {
    let renderer = FlakyRenderer::new(0);
    let pipeline = Pipeline::new(
        no_retry_config(),
        Arc::new(DeadStore),
        Arc::new(DeadStore),
        renderer.clone(),
        Arc::new(BreakerRegistry::with_defaults()),
        vec![Arc::new(MetaTagLogo)],
    )
    .await;

    let first = pipeline
        .extract(ExtractRequest::new("https://acme.test", "198.51.100.7"))
        .await;

    // The limiter fails open and says so.
    let rate = first.rate.as_ref().expect("limiter was consulted");
    assert!(rate.allowed);
    assert!(rate.degraded);
    assert_eq!(rate.remaining, 0);

    let identity = first.outcome.expect("extraction succeeds without stores");
    assert_eq!(identity.name.as_deref(), Some("Acme Rockets"));
    assert!(!identity.from_cache);

    // With the cache disabled, the same request fetches again.
    let second = pipeline
        .extract(ExtractRequest::new("https://acme.test", "198.51.100.7"))
        .await;
    assert!(!second.outcome.expect("second extraction succeeds").from_cache);
    assert_eq!(renderer.calls(), 2);
}

#[tokio::test]
async fn breaker_opens_after_repeated_failures_and_recovers() {
    let renderer = FlakyRenderer::new(2);
    let registry = Arc::new(BreakerRegistry::new());
    registry.get_or_create(
        RENDERER_DEPENDENCY,
        CircuitBreakerConfig {
            failure_threshold: 2,
            recovery_timeout: Duration::from_millis(200),
            success_threshold: 1,
            ..CircuitBreakerConfig::default()
        },
    );
    let pipeline = Pipeline::new(
        no_retry_config(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        renderer.clone(),
        registry.clone(),
        vec![Arc::new(MetaTagLogo)],
    )
    .await;
    let request = ExtractRequest::new("https://acme.test", "local");

    // Two connection failures trip the breaker.
    for _ in 0..2 {
        let response = pipeline.extract(request.clone()).await;
        assert_eq!(response.transport_status(), 502);
        let report = response.outcome.expect_err("connection failure surfaces");
        assert_eq!(report.category, ErrorCategory::Network);
    }
    let breaker = registry.get(RENDERER_DEPENDENCY).expect("renderer breaker");
    assert_eq!(breaker.state(), CircuitState::Open);

    // While open, requests fail fast without touching the renderer.
    let rejected = pipeline.extract(request.clone()).await;
    assert_eq!(rejected.transport_status(), 503);
    let report = rejected.outcome.expect_err("open breaker rejects");
    assert_eq!(report.category, ErrorCategory::ExternalService);
    assert_eq!(renderer.calls(), 2);

    // After the recovery timeout, the half-open probe succeeds and closes
    // the circuit.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let recovered = pipeline.extract(request).await;
    let identity = recovered.outcome.expect("probe succeeds");
    assert_eq!(identity.name.as_deref(), Some("Acme Rockets"));
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(renderer.calls(), 3);
}

#[tokio::test]
async fn a_failing_strategy_degrades_the_result_instead_of_the_request() {
    struct Broken;

    impl ExtractionStrategy for Broken {
        fn name(&self) -> &'static str {
            "broken_scanner"
        }

        fn extract(&self, _page: &RenderedPage) -> Result<Contribution> {
            Err(Error::parse("scanner blew up"))
        }
    }

    let pipeline = Pipeline::new(
        no_retry_config(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        FlakyRenderer::new(0),
        Arc::new(BreakerRegistry::with_defaults()),
        vec![Arc::new(Broken), Arc::new(MetaTagLogo)],
    )
    .await;

    let response = pipeline
        .extract(ExtractRequest::new("https://acme.test", "local"))
        .await;

    let identity = response.outcome.expect("request survives the bad strategy");
    assert_eq!(identity.degraded_steps, vec!["broken_scanner".to_string()]);
    assert_eq!(identity.name.as_deref(), Some("Acme Rockets"));
    assert_eq!(identity.logos.len(), 1);
    assert_eq!(identity.logos[0].url, "https://cdn.acme.test/logo.png");
}
