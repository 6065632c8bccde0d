//! Dependency health monitoring.
//!
//! [`HealthMonitor`] probes each external dependency (backing store,
//! renderer, vision capability) and caches the results. Probes run on
//! [`HealthMonitor::refresh`]; [`HealthMonitor::system_health`] is a
//! non-blocking read that reports cached results, downgrading anything
//! older than the staleness threshold to [`HealthStatus::Unknown`].
//! Circuit breaker states ride along in every report so one payload shows
//! both "is the dependency reachable" and "are we currently calling it".

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::circuit_breaker::BreakerRegistry;
use crate::error::config::{ConfigValidationError, ValidationResult};
use crate::fetcher::PageRenderer;
use crate::store::{store_timeout, KeyValueStore};
use crate::time::{epoch_millis, epoch_seconds_f64};

/// Cached check results older than this report as Unknown.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(300);

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const PROBE_KEY: &str = "health:probe";
const PROBE_TTL: Duration = Duration::from_secs(60);

const STORE_COMPONENT: &str = "store";
const RENDERER_COMPONENT: &str = "renderer";
const VISION_COMPONENT: &str = "vision";

/// Status of a single checked component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    /// Not checked yet, not applicable, or the last check went stale.
    Unknown,
}

/// Outcome of one component check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    /// Probe round-trip time, when the check measures one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Epoch seconds of the check.
    pub checked_at: f64,
}

impl ComponentHealth {
    fn healthy(latency_ms: Option<u64>, detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms,
            detail: Some(detail.into()),
            checked_at: epoch_seconds_f64(),
        }
    }

    fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            detail: Some(detail.into()),
            checked_at: epoch_seconds_f64(),
        }
    }

    fn unknown(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unknown,
            latency_ms: None,
            detail: Some(detail.into()),
            checked_at: epoch_seconds_f64(),
        }
    }
}

/// Serializable view of one circuit breaker for health payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerHealth {
    pub name: String,
    /// `closed`, `open` or `half_open`.
    pub state: String,
    pub failure_count: u32,
}

/// Aggregate status over all components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Healthy,
    Degraded,
}

/// Full health report: per-component checks plus breaker states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Names of components currently [`HealthStatus::Unhealthy`].
    pub unhealthy: Vec<String>,
    pub components: BTreeMap<String, ComponentHealth>,
    pub breakers: Vec<BreakerHealth>,
    pub checked_at: f64,
}

/// Health monitoring configuration.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Age after which a cached check reports Unknown.
    pub staleness: Duration,
    /// Budget for one probe round-trip.
    pub probe_timeout: Duration,
    /// URL the renderer check fetches. `None` downgrades the renderer
    /// check to a capability check (renderer constructed or not).
    pub probe_url: Option<String>,
    /// Whether a vision-model credential is configured for this deployment.
    pub vision_configured: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            staleness: DEFAULT_STALENESS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probe_url: None,
            vision_configured: false,
        }
    }
}

impl HealthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first fatal problem found.
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        if self.staleness.is_zero() {
            return Err(ConfigValidationError::invalid(
                "staleness",
                "must be greater than zero",
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "probe_timeout",
                "must be greater than zero",
            ));
        }

        let mut warnings = Vec::new();
        if self.probe_timeout > self.staleness {
            warnings.push(format!(
                "probe_timeout {:?} exceeds staleness {:?}, checks go stale while probing",
                self.probe_timeout, self.staleness
            ));
        }
        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// Probes dependencies and serves cached health reports.
pub struct HealthMonitor {
    store: Arc<dyn KeyValueStore>,
    renderer: Option<Arc<dyn PageRenderer>>,
    registry: Arc<BreakerRegistry>,
    config: HealthConfig,
    checks: Mutex<BTreeMap<&'static str, ComponentHealth>>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.config)
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl HealthMonitor {
    /// Creates a monitor over the given store and breaker registry.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        registry: Arc<BreakerRegistry>,
        config: HealthConfig,
    ) -> Self {
        Self {
            store,
            renderer: None,
            registry,
            config,
            checks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Attaches a renderer so the renderer check can report on it.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Runs every probe and caches the results.
    pub async fn refresh(&self) {
        let store = self.check_store().await;
        let renderer = self.check_renderer().await;
        let vision = self.check_vision();

        if store.status == HealthStatus::Unhealthy {
            warn!(detail = store.detail.as_deref(), "store health probe failed");
        }
        debug!(
            store = ?store.status,
            renderer = ?renderer.status,
            vision = ?vision.status,
            "health probes completed"
        );

        let mut checks = self.checks.lock().await;
        checks.insert(STORE_COMPONENT, store);
        checks.insert(RENDERER_COMPONENT, renderer);
        checks.insert(VISION_COMPONENT, vision);
    }

    /// Round-trips a nonce through the backing store.
    async fn check_store(&self) -> ComponentHealth {
        let nonce = format!("probe-{}", epoch_millis());
        let started = Instant::now();

        let round_trip = store_timeout(self.config.probe_timeout, "health probe", async {
            self.store.set_ex(PROBE_KEY, PROBE_TTL, &nonce).await?;
            self.store.get(PROBE_KEY).await
        })
        .await;

        let latency = elapsed_ms(started);
        match round_trip {
            Ok(Some(value)) if value == nonce => {
                ComponentHealth::healthy(Some(latency), "probe round-trip ok")
            }
            Ok(_) => ComponentHealth::unhealthy("probe value did not round-trip"),
            Err(error) => ComponentHealth::unhealthy(error.to_string()),
        }
    }

    /// Fetches the probe URL when one is configured, otherwise reports
    /// capability only.
    async fn check_renderer(&self) -> ComponentHealth {
        let Some(renderer) = &self.renderer else {
            return ComponentHealth::unknown("no renderer configured");
        };
        let Some(probe_url) = &self.config.probe_url else {
            return ComponentHealth::healthy(None, "renderer ready (no probe URL configured)");
        };

        let started = Instant::now();
        match tokio::time::timeout(self.config.probe_timeout, renderer.render(probe_url)).await {
            Ok(Ok(page)) => ComponentHealth::healthy(
                Some(elapsed_ms(started)),
                format!("probe fetch returned status {}", page.status),
            ),
            Ok(Err(error)) => ComponentHealth::unhealthy(format!("probe fetch failed: {error}")),
            Err(_) => ComponentHealth::unhealthy(format!(
                "probe fetch exceeded {:?}",
                self.config.probe_timeout
            )),
        }
    }

    fn check_vision(&self) -> ComponentHealth {
        if self.config.vision_configured {
            ComponentHealth::healthy(None, "vision credential configured")
        } else {
            ComponentHealth::unknown("vision credential not configured")
        }
    }

    /// Builds a report from cached checks without probing anything.
    ///
    /// Components never checked, or checked longer than the staleness
    /// threshold ago, report [`HealthStatus::Unknown`]. Only components
    /// positively [`HealthStatus::Unhealthy`] degrade the system status.
    pub async fn system_health(&self) -> SystemHealth {
        let now = epoch_seconds_f64();
        let max_age = self.config.staleness.as_secs_f64();

        let checks = self.checks.lock().await;
        let mut components = BTreeMap::new();
        for name in [STORE_COMPONENT, RENDERER_COMPONENT, VISION_COMPONENT] {
            let health = match checks.get(name) {
                None => ComponentHealth::unknown("not yet checked"),
                Some(check) if now - check.checked_at > max_age => {
                    ComponentHealth::unknown(format!(
                        "last check {:.0}s ago exceeds staleness threshold",
                        now - check.checked_at
                    ))
                }
                Some(check) => check.clone(),
            };
            components.insert(name.to_owned(), health);
        }
        drop(checks);

        let unhealthy: Vec<String> = components
            .iter()
            .filter(|(_, health)| health.status == HealthStatus::Unhealthy)
            .map(|(name, _)| name.clone())
            .collect();
        let status = if unhealthy.is_empty() {
            SystemStatus::Healthy
        } else {
            SystemStatus::Degraded
        };

        let breakers = self
            .registry
            .snapshot()
            .into_iter()
            .map(|snap| BreakerHealth {
                name: snap.name,
                state: snap.state.as_str().to_owned(),
                failure_count: snap.failure_count,
            })
            .collect();

        SystemHealth {
            status,
            unhealthy,
            components,
            breakers,
            checked_at: now,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
