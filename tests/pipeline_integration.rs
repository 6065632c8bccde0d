//! End-to-end pipeline tests over a real HTTP server.
//!
//! These exercise the full stack as a deployment would run it: the
//! reqwest-backed renderer against a wiremock server, the default
//! extraction strategies over realistic markup, and the cache and rate
//! limiter wired in between.

use std::time::Duration;

use brandex::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LANDING_PAGE: &str = r##"<!doctype html>
<html>
<head>
    <meta property="og:site_name" content="Acme Rockets">
    <meta property="og:description" content="Rocket-powered everything since 1949.">
    <meta property="og:image" content="/assets/acme-logo.png">
    <link rel="icon" href="/favicon-32.png">
    <link rel="stylesheet" href="/styles/site.css">
    <style>
        .header { background-color: #c0261d; color: #ffffff; }
        .cta { background: #c0261d; border-color: #1a1a6e; }
    </style>
</head>
<body>
    <header class="header" style="color: #c0261d">
        <img class="site-logo" src="/assets/acme-mark.svg" alt="Acme Rockets">
    </header>
    <main>
        <button class="cta" style="background-color: #00ff00">Launch</button>
    </main>
</body>
</html>"##;

async fn serve_landing_page(expect: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING_PAGE))
        .expect(expect)
        .mount(&server)
        .await;
    server
}

async fn pipeline_for(config: PipelineConfig) -> Pipeline {
    Pipeline::in_memory(config, default_strategies())
        .await
        .expect("pipeline construction")
}

#[tokio::test]
async fn extracts_a_full_identity_from_a_live_page() {
    let server = serve_landing_page(1).await;
    let pipeline = pipeline_for(PipelineConfig::default()).await;

    let response = pipeline
        .extract(ExtractRequest::new(server.uri(), "198.51.100.7"))
        .await;

    assert!(!response.request_id.is_empty());
    assert_eq!(response.transport_status(), 200);
    let identity = response.outcome.expect("extraction succeeds");

    assert_eq!(identity.name.as_deref(), Some("Acme Rockets"));
    assert_eq!(
        identity.description.as_deref(),
        Some("Rocket-powered everything since 1949.")
    );
    assert!(!identity.from_cache);
    assert!(identity.degraded_steps.is_empty());
    assert!(identity.fetched_at > 0.0);

    // Metadata beats body images beats icons; one candidate per URL.
    let base = server.uri();
    assert!(identity.logos.len() >= 3);
    assert_eq!(identity.logos[0].url, format!("{base}/assets/acme-logo.png"));
    assert_eq!(identity.logos[0].source, "meta_tags");
    assert_eq!(identity.logos[1].url, format!("{base}/assets/acme-mark.svg"));
    assert_eq!(identity.logos[1].source, "img_tags");
    assert!(identity
        .logos
        .iter()
        .any(|logo| logo.url == format!("{base}/favicon-32.png")));
    for pair in identity.logos.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // #ffffff is near-white and must be dropped, and the button's #00ff00
    // sits on a non-brand element so its inline style is never read. That
    // leaves #c0261d (stylesheet twice, header inline once) over #1a1a6e.
    assert_eq!(identity.colors.len(), 2);
    assert_eq!(identity.colors[0].hex, "#c0261d");
    assert_eq!(identity.colors[0].role, ColorRole::Primary);
    assert_eq!(identity.colors[1].hex, "#1a1a6e");
    assert_eq!(identity.colors[1].role, ColorRole::Secondary);
    assert!(identity.colors[0].weight > identity.colors[1].weight);
}

#[tokio::test]
async fn second_request_is_served_from_cache_without_refetching() {
    let server = serve_landing_page(1).await;
    let pipeline = pipeline_for(PipelineConfig::default()).await;
    let request = ExtractRequest::new(server.uri(), "198.51.100.7");

    let first = pipeline.extract(request.clone()).await;
    let first = first.outcome.expect("first extraction succeeds");
    assert!(!first.from_cache);

    let second = pipeline.extract(request).await;
    let second = second.outcome.expect("cached extraction succeeds");
    assert!(second.from_cache);
    assert_eq!(second.name, first.name);
    assert_eq!(second.logos, first.logos);

    // The mock's expect(1) verifies on drop that no second fetch happened.
}

#[tokio::test]
async fn over_limit_requests_get_429_with_rate_headers() {
    let server = serve_landing_page(1).await;
    let config = PipelineConfig {
        rate_limiter: RateLimiterConfig {
            limit: 1,
            window: Duration::from_secs(3600),
            ..RateLimiterConfig::default()
        },
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_for(config).await;

    let allowed = pipeline
        .extract(ExtractRequest::new(server.uri(), "198.51.100.7"))
        .await;
    assert!(allowed.outcome.is_ok());

    let rejected = pipeline
        .extract(ExtractRequest::new(server.uri(), "198.51.100.7"))
        .await;
    assert_eq!(rejected.transport_status(), 429);
    let report = rejected
        .outcome
        .as_ref()
        .expect_err("second request is rejected");
    assert_eq!(report.category, ErrorCategory::RateLimit);

    let headers = rejected.rate_headers();
    assert_eq!(headers.len(), 3);
    assert_eq!(headers[0], ("X-Rate-Limit-Limit", "1".to_string()));
    assert_eq!(headers[1], ("X-Rate-Limit-Remaining", "0".to_string()));

    // A different caller still gets through on the shared pipeline.
    let other = pipeline
        .extract(ExtractRequest::new(server.uri(), "203.0.113.20"))
        .await;
    assert!(other.outcome.is_ok());
}

#[tokio::test]
async fn rejects_non_http_targets_before_any_fetch() {
    let pipeline = pipeline_for(PipelineConfig::default()).await;

    let response = pipeline
        .extract(ExtractRequest::new("ftp://example.com/file", "local"))
        .await;

    assert_eq!(response.transport_status(), 400);
    let report = response.outcome.expect_err("bad scheme is rejected");
    assert_eq!(report.category, ErrorCategory::Validation);
}

#[tokio::test]
async fn cancelled_requests_stop_without_a_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LANDING_PAGE)
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    let pipeline = pipeline_for(PipelineConfig::default()).await;

    let cancel = CancellationToken::new();
    let mut request = ExtractRequest::new(server.uri(), "local");
    request.cancel = Some(cancel.clone());

    let handle = tokio::spawn(async move { pipeline.extract(request).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let response = handle.await.expect("task completes");
    let report = response.outcome.expect_err("cancelled request fails");
    assert!(report.message.to_lowercase().contains("cancel"));
}

#[tokio::test]
async fn admin_cache_clear_forces_a_refetch() {
    let server = serve_landing_page(2).await;
    let config = PipelineConfig {
        admin_secret: Some(SecretString::new("t0ps3cret")),
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_for(config).await;
    let request = ExtractRequest::new(server.uri(), "local");

    let first = pipeline.extract(request.clone()).await;
    assert!(first.outcome.is_ok());

    assert!(pipeline.clear_cache("wrong-token").await.is_err());
    assert!(pipeline.clear_cache("t0ps3cret").await.expect("clear succeeds"));

    let second = pipeline.extract(request).await;
    let second = second.outcome.expect("refetched extraction succeeds");
    assert!(!second.from_cache);
}
