//! Device Polling
//!
//! One poll cycle fetches a device's telemetry, retrying on failure, and hands
//! the flattened samples to the [`MetricsRegistry`].
//!
//! # Retry Protocol
//!
//! 1. Without a live session, one is opened through the [`SessionFactory`];
//!    if that fails the cycle ends and the next tick starts over
//! 2. The fetch is attempted up to [`MAX_ATTEMPTS`] times, sleeping
//!    [`RETRY_DELAY`] between attempts (not after the last one)
//! 3. An auth-expired failure additionally sleeps [`REAUTH_DELAY`] and
//!    re-authenticates the existing session before the next attempt. A failed
//!    re-authentication is logged and the attempts continue
//! 4. The first success ends the loop; exhaustion logs the last error and
//!    emits no metrics
//!
//! Every device call (connect, fetch, re-authenticate) is bounded by
//! [`DEVICE_CALL_TIMEOUT`]; a call that runs over counts as a failed attempt.
//!
//! Nothing in here returns an error to the scheduler: every terminal failure
//! is logged and reported as a [`PollOutcome`].

use crate::config::DeviceConfig;
use crate::device::{DeviceClient, SessionFactory};
use crate::error::{ExporterError, Result};
use crate::flatten::{flatten, Payload};
use crate::metrics::MetricsRegistry;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};

/// Fetch attempts per poll cycle
pub const MAX_ATTEMPTS: u32 = 5;

/// Pause between two fetch attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Pause before re-authenticating an expired session
pub const REAUTH_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on a single device call
pub const DEVICE_CALL_TIMEOUT: Duration = Duration::from_secs(10);

async fn with_deadline<T>(operation: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(DEVICE_CALL_TIMEOUT, call).await {
        Ok(result) => result,
        Err(_) => Err(ExporterError::Timeout(format!(
            "{} did not finish within {}s",
            operation,
            DEVICE_CALL_TIMEOUT.as_secs()
        ))),
    }
}

/// A configured device and its (lazily opened) session
pub struct Device {
    pub config: DeviceConfig,
    session: Mutex<Option<Arc<dyn DeviceClient>>>,
    poll_slot: Arc<Semaphore>,
}

impl Device {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
            poll_slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn address(&self) -> &str {
        &self.config.ip_address
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Return the live session, opening one if there is none yet
    pub async fn session(&self, factory: &dyn SessionFactory) -> Result<Arc<dyn DeviceClient>> {
        let mut session = self.session.lock().await;
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }

        let client = with_deadline("connect", factory.connect(&self.config)).await?;
        *session = Some(client.clone());
        Ok(client)
    }

    /// Claim the device's single poll slot; `None` while a poll is in flight
    pub fn try_begin_poll(&self) -> Option<OwnedSemaphorePermit> {
        self.poll_slot.clone().try_acquire_owned().ok()
    }
}

/// Bookkeeping of one poll cycle's attempts
#[derive(Debug, Default)]
pub struct RetryState {
    pub attempts_used: u32,
    pub last_error: Option<ExporterError>,
}

/// How a poll cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Telemetry was fetched and this many samples were recorded
    Collected { samples: usize },
    /// No session could be opened
    NoSession,
    /// Every attempt failed
    Exhausted,
}

/// Fetch telemetry from `client`, retrying per the protocol above.
///
/// Returns the first successful payload, or the last error once all
/// attempts are used.
pub async fn fetch_with_retry(device_name: &str, client: &dyn DeviceClient) -> Result<Payload> {
    let mut state = RetryState::default();

    while state.attempts_used < MAX_ATTEMPTS {
        state.attempts_used += 1;
        let attempt = state.attempts_used;

        let err = match with_deadline("fetch", client.fetch_telemetry()).await {
            Ok(payload) => return Ok(payload),
            Err(e) => e,
        };

        error!(device = %device_name, attempt, error = %err, "Error getting telemetry");
        let auth_expired = err.is_auth_expired();
        state.last_error = Some(err);

        if attempt == MAX_ATTEMPTS {
            break;
        }

        if auth_expired {
            info!(device = %device_name, "Session expired, trying to re-authenticate");
            tokio::time::sleep(REAUTH_DELAY).await;
            if let Err(e) = with_deadline("re-authenticate", client.reauthenticate()).await {
                error!(device = %device_name, error = %e, "Failed to re-authenticate");
            }
        }

        tokio::time::sleep(RETRY_DELAY).await;
    }

    Err(state.last_error.unwrap_or_else(|| {
        ExporterError::DeviceApi("No fetch attempt was made".to_string())
    }))
}

/// Run one poll cycle for `device` and record its telemetry.
pub async fn poll_device(
    device: &Device,
    factory: &dyn SessionFactory,
    metrics: &MetricsRegistry,
) -> PollOutcome {
    let client = match device.session(factory).await {
        Ok(client) => client,
        Err(e) => {
            error!(device = %device.name(), error = %e, "Failed to open device session");
            metrics.record_poll(&device.config, false);
            return PollOutcome::NoSession;
        }
    };

    let payload = match fetch_with_retry(device.name(), client.as_ref()).await {
        Ok(payload) => payload,
        Err(e) => {
            error!(
                device = %device.name(),
                attempts = MAX_ATTEMPTS,
                error = %e,
                "Giving up on telemetry for this cycle"
            );
            metrics.record_poll(&device.config, false);
            return PollOutcome::Exhausted;
        }
    };

    info!(device = %device.name(), "Successfully received metrics");

    let mut samples = 0;
    for sample in flatten(&payload) {
        match metrics.handle(&device.config, &sample) {
            Ok(()) => samples += 1,
            Err(e) => warn!(
                device = %device.name(),
                field = %sample.field_path,
                error = %e,
                "Failed to record sample"
            ),
        }
    }

    metrics.record_poll(&device.config, true);
    PollOutcome::Collected { samples }
}
