//! Poll Scheduling
//!
//! Every tick spawns one independent task per device. Ticks never wait for
//! polls to finish, so a slow or failing device cannot hold up the others. A
//! device whose previous poll is still running is skipped for that tick.

use crate::device::SessionFactory;
use crate::metrics::MetricsRegistry;
use crate::poll::{poll_device, Device, PollOutcome};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

/// State shared by every poll task
#[derive(Clone)]
pub struct PollContext {
    pub factory: Arc<dyn SessionFactory>,
    pub metrics: MetricsRegistry,
}

/// Start one poll task for every device that is not already being polled.
pub fn dispatch(devices: &[Arc<Device>], ctx: &PollContext) -> Vec<JoinHandle<PollOutcome>> {
    let mut handles = Vec::with_capacity(devices.len());

    for device in devices {
        let Some(permit) = device.try_begin_poll() else {
            debug!(device = %device.name(), "Previous poll still running, skipping tick");
            continue;
        };

        let device = device.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            let outcome = poll_device(&device, ctx.factory.as_ref(), &ctx.metrics).await;
            drop(permit);
            outcome
        }));
    }

    handles
}

/// Open a session to every device up front. Failures are only logged; the
/// poll loop retries them on its next tick.
pub async fn establish_sessions(devices: &[Arc<Device>], factory: &dyn SessionFactory) {
    let results = join_all(devices.iter().map(|device| device.session(factory))).await;

    for (device, result) in devices.iter().zip(results) {
        if let Err(e) = result {
            warn!(device = %device.name(), error = %e, "Failed to open device session");
        }
    }
}

/// Poll all devices every `period`. Runs until the task is dropped.
pub async fn run(devices: Vec<Arc<Device>>, ctx: PollContext, period: Duration) {
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;
        debug!("Dispatching polls for {} devices", devices.len());
        dispatch(&devices, &ctx);
    }
}
