//! Circuit breaker for failing dependencies.
//!
//! Every outbound dependency (page renderer, vision provider, backing
//! store) sits behind a breaker. Once a dependency fails repeatedly the
//! breaker opens and rejects calls up front, which keeps request latency
//! flat during an outage and gives the dependency room to recover.
//!
//! # States
//!
//! - **Closed**: calls flow normally, consecutive failures are counted
//! - **Open**: calls are rejected immediately with [`Error::CircuitOpen`]
//! - **HalfOpen**: after `recovery_timeout`, trial calls probe the
//!   dependency
//!
//! # State Transitions
//!
//! ```text
//! ┌─────────┐  failure_count >= threshold   ┌──────┐
//! │ Closed  │ ───────────────────────────▶  │ Open │
//! └─────────┘                               └──────┘
//!      ▲                                        │
//!      │ success_threshold probes succeed       │ recovery_timeout elapsed
//!      │                                        ▼
//!      │                                  ┌──────────┐
//!      └────────────────────────────────  │ HalfOpen │ ── probe fails ──▶ Open
//!                                         └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use brandex_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> brandex_core::error::Result<()> {
//! let breaker = CircuitBreaker::new("vision", CircuitBreakerConfig::vision());
//!
//! let outcome: brandex_core::error::Result<String> = breaker
//!     .call(async {
//!         // talk to the dependency here
//!         Ok("description".to_string())
//!     })
//!     .await;
//! # outcome.map(|_| ())
//! # }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{ConfigValidationError, Error, Result, ValidationResult};
use crate::time::epoch_millis;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// Normal operation. Consecutive failures are counted and the circuit
    /// opens when they reach the threshold.
    Closed = 0,

    /// Rejecting calls without attempting them. After `recovery_timeout`
    /// elapses the circuit moves to [`CircuitState::HalfOpen`].
    Open = 1,

    /// Probing for recovery. Enough consecutive successes close the
    /// circuit; a single failure reopens it.
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            // Unknown values read as Closed, the permissive default.
            _ => CircuitState::Closed,
        }
    }

    /// Snake-case name, as exposed by health reporting.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens. Default: 5.
    pub failure_threshold: u32,

    /// Time spent Open before HalfOpen probing begins. Default: 30 s.
    pub recovery_timeout: Duration,

    /// Consecutive HalfOpen successes required to close. Default: 2.
    pub success_threshold: u32,

    /// Deadline for one protected call made through [`CircuitBreaker::call`].
    /// Default: 10 s.
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a configuration with the given failure threshold and
    /// recovery timeout, other fields at their defaults.
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            ..Self::default()
        }
    }

    /// Sets the number of successful probes needed to close the circuit.
    #[must_use]
    pub fn with_success_threshold(mut self, success_threshold: u32) -> Self {
        self.success_threshold = success_threshold;
        self
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Preset for the AI vision provider: trips fast, probes after a
    /// minute. Vision calls are expensive, so hammering a failing provider
    /// costs real money as well as latency.
    pub fn vision() -> Self {
        Self::new(3, Duration::from_secs(60))
    }

    /// Preset for the backing store: trips fast, probes after 30 seconds.
    pub fn store() -> Self {
        Self::new(3, Duration::from_secs(30))
    }

    /// Preset for the page renderer: tolerates more failures, waits two
    /// minutes before probing, and allows slow renders.
    pub fn renderer() -> Self {
        Self::new(5, Duration::from_secs(120)).with_call_timeout(Duration::from_secs(30))
    }

    /// Validates the circuit breaker configuration.
    ///
    /// # Validation Rules
    ///
    /// - `failure_threshold` must be > 0
    /// - `success_threshold` must be > 0
    /// - `call_timeout` must be greater than zero
    /// - a `recovery_timeout` under a second draws a warning
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let mut warnings = Vec::new();

        if self.failure_threshold == 0 {
            return Err(ConfigValidationError::invalid(
                "failure_threshold",
                "failure_threshold must be greater than 0",
            ));
        }

        if self.success_threshold == 0 {
            return Err(ConfigValidationError::invalid(
                "success_threshold",
                "success_threshold must be greater than 0",
            ));
        }

        if self.call_timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "call_timeout",
                "call_timeout must be greater than zero",
            ));
        }

        if self.recovery_timeout < Duration::from_secs(1) {
            warnings.push(format!(
                "recovery_timeout {:?} is very short, the circuit will flap",
                self.recovery_timeout
            ));
        }

        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// Circuit breaker events for observability.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit changed state.
    StateChanged {
        /// The previous state.
        from: CircuitState,
        /// The new state.
        to: CircuitState,
    },

    /// A call was rejected because the circuit is open.
    CallRejected {
        /// Time until the next HalfOpen probe window.
        retry_in: Duration,
    },

    /// A failure was recorded.
    FailureRecorded {
        /// Consecutive failure count after recording.
        count: u32,
    },

    /// A success was recorded while probing in HalfOpen.
    SuccessRecorded {
        /// Consecutive success count after recording.
        count: u32,
    },
}

/// Point-in-time view of one breaker, for health reporting.
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    /// The breaker's dependency name.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures counted in Closed state.
    pub failure_count: u32,
}

/// Circuit breaker guarding one named dependency.
///
/// All state lives in atomics, so a breaker is shared across tasks without
/// a lock. Use [`CircuitBreaker::call`] to protect a future, or the
/// [`allow_request`](CircuitBreaker::allow_request) /
/// [`record_success`](CircuitBreaker::record_success) /
/// [`record_failure`](CircuitBreaker::record_failure) triple when the
/// caller manages attempts itself, the way the retrying fetcher does.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: Cow<'static, str>,
    /// Current state, stored as u8 for atomic access.
    state: AtomicU8,
    /// Consecutive failures in Closed state.
    failure_count: AtomicU32,
    /// Consecutive successes in HalfOpen state.
    success_count: AtomicU32,
    /// When the circuit last opened, milliseconds since epoch.
    opened_at: AtomicI64,
    config: CircuitBreakerConfig,
    event_tx: Option<mpsc::UnboundedSender<CircuitBreakerEvent>>,
}

impl CircuitBreaker {
    /// Creates a breaker for the named dependency.
    pub fn new(name: impl Into<Cow<'static, str>>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            state: AtomicU8::new(CircuitState::Closed as u8),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            opened_at: AtomicI64::new(0),
            config,
            event_tx: None,
        }
    }

    /// Creates a breaker that reports transitions on an event channel.
    pub fn with_events(
        name: impl Into<Cow<'static, str>>,
        config: CircuitBreakerConfig,
        event_tx: mpsc::UnboundedSender<CircuitBreakerEvent>,
    ) -> Self {
        Self {
            event_tx: Some(event_tx),
            ..Self::new(name, config)
        }
    }

    /// The dependency this breaker guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks whether a call may be attempted.
    ///
    /// Returns [`Error::CircuitOpen`] carrying the time until the next
    /// probe window when the circuit is open. In Open state with
    /// `recovery_timeout` elapsed, the circuit moves to HalfOpen and the
    /// call is allowed as a probe.
    pub fn allow_request(&self) -> Result<()> {
        match self.state() {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let opened_at = self.opened_at.load(Ordering::Acquire);
                let elapsed_ms = (epoch_millis() - opened_at).max(0);
                let recovery_ms =
                    i64::try_from(self.config.recovery_timeout.as_millis()).unwrap_or(i64::MAX);

                if elapsed_ms >= recovery_ms {
                    if self.transition_to(CircuitState::Open, CircuitState::HalfOpen) {
                        info!(
                            breaker = %self.name,
                            elapsed_ms,
                            "recovery timeout elapsed, probing in half-open"
                        );
                    }
                    Ok(())
                } else {
                    let retry_in = Duration::from_millis(
                        u64::try_from(recovery_ms - elapsed_ms).unwrap_or(u64::MAX),
                    );
                    debug!(
                        breaker = %self.name,
                        retry_in_ms = retry_in.as_millis(),
                        "circuit open, rejecting call"
                    );
                    self.emit_event(CircuitBreakerEvent::CallRejected { retry_in });
                    Err(Error::circuit_open(self.name.clone(), Some(retry_in)))
                }
            }
            CircuitState::HalfOpen => {
                debug!(breaker = %self.name, "half-open, allowing probe call");
                Ok(())
            }
        }
    }

    /// Records a successful call.
    ///
    /// In Closed state this clears the consecutive-failure count. In
    /// HalfOpen it counts toward `success_threshold`, closing the circuit
    /// when reached. In Open state it has no effect.
    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                let count = self.success_count.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(
                    breaker = %self.name,
                    success_count = count,
                    threshold = self.config.success_threshold,
                    "probe succeeded"
                );
                self.emit_event(CircuitBreakerEvent::SuccessRecorded { count });

                if count >= self.config.success_threshold
                    && self.transition_to(CircuitState::HalfOpen, CircuitState::Closed)
                {
                    info!(breaker = %self.name, "dependency recovered, closing circuit");
                    self.failure_count.store(0, Ordering::Release);
                    self.success_count.store(0, Ordering::Release);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call.
    ///
    /// In Closed state this counts toward `failure_threshold`, opening the
    /// circuit when reached. In HalfOpen a single failure reopens the
    /// circuit. In Open state it has no effect.
    pub fn record_failure(&self) {
        match self.state() {
            CircuitState::Closed => {
                let count = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(
                    breaker = %self.name,
                    failure_count = count,
                    threshold = self.config.failure_threshold,
                    "failure recorded"
                );
                self.emit_event(CircuitBreakerEvent::FailureRecorded { count });

                if count >= self.config.failure_threshold {
                    // Set before the swap so a racing allow_request never
                    // sees Open with a stale timestamp.
                    self.opened_at.store(epoch_millis(), Ordering::Release);
                    if self.transition_to(CircuitState::Closed, CircuitState::Open) {
                        warn!(
                            breaker = %self.name,
                            failure_count = count,
                            "failure threshold reached, opening circuit"
                        );
                    }
                }
            }
            CircuitState::HalfOpen => {
                self.opened_at.store(epoch_millis(), Ordering::Release);
                if self.transition_to(CircuitState::HalfOpen, CircuitState::Open) {
                    warn!(breaker = %self.name, "probe failed, reopening circuit");
                }
                self.success_count.store(0, Ordering::Release);
            }
            CircuitState::Open => {}
        }
    }

    /// Runs `fut` under this breaker with the configured call deadline.
    ///
    /// An open circuit rejects without polling the future. A call that
    /// outlives `call_timeout` is recorded as a failure and surfaces as
    /// [`Error::Timeout`]. Every other outcome records what it is.
    pub async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.allow_request()?;

        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record_failure();
                Err(error)
            }
            Err(_) => {
                self.record_failure();
                Err(Error::timeout(format!(
                    "{} call exceeded {:?}",
                    self.name, self.config.call_timeout
                )))
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Consecutive failures counted in Closed state.
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// Consecutive successes counted in HalfOpen state.
    pub fn success_count(&self) -> u32 {
        self.success_count.load(Ordering::Acquire)
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Point-in-time view for health reporting.
    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            name: self.name.to_string(),
            state: self.state(),
            failure_count: self.failure_count(),
        }
    }

    /// Forces the breaker back to Closed, clearing all counters. Operator
    /// escape hatch.
    pub fn reset(&self) {
        let old_state = self.state();
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
        self.failure_count.store(0, Ordering::Release);
        self.success_count.store(0, Ordering::Release);
        self.opened_at.store(0, Ordering::Release);

        if old_state != CircuitState::Closed {
            info!(breaker = %self.name, from = %old_state, "breaker manually reset");
            self.emit_event(CircuitBreakerEvent::StateChanged {
                from: old_state,
                to: CircuitState::Closed,
            });
        }
    }

    /// Moves `from` to `to` if no other task got there first. Exactly one
    /// of the racing callers wins, so each transition logs and emits once.
    fn transition_to(&self, from: CircuitState, to: CircuitState) -> bool {
        if self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        debug!(
            breaker = %self.name,
            from = %from,
            to = %to,
            "circuit state transition"
        );
        self.emit_event(CircuitBreakerEvent::StateChanged { from, to });
        true
    }

    fn emit_event(&self, event: CircuitBreakerEvent) {
        if let Some(ref tx) = self.event_tx {
            // A dropped receiver is not the breaker's problem.
            let _ = tx.send(event);
        }
    }
}

/// Shared set of breakers, one per dependency name.
///
/// The registry hands out `Arc` handles so the pipeline, health reporting,
/// and admin surfaces all observe the same breaker state.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the standard dependency
    /// breakers: `vision`, `store`, and `renderer`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.get_or_create("vision", CircuitBreakerConfig::vision());
        registry.get_or_create("store", CircuitBreakerConfig::store());
        registry.get_or_create("renderer", CircuitBreakerConfig::renderer());
        registry
    }

    /// Returns the breaker registered under `name`, creating it with
    /// `config` on first use. The config is ignored when the breaker
    /// already exists.
    pub fn get_or_create(&self, name: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name.to_string(), config)))
            .clone()
    }

    /// Returns the breaker registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| Arc::clone(&entry))
    }

    /// Snapshots every registered breaker, sorted by name for stable
    /// health output.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> = self
            .breakers
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Resets every registered breaker to Closed.
    pub fn reset_all(&self) {
        for entry in &self.breakers {
            entry.value().reset();
        }
    }
}
