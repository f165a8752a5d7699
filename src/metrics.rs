//! Prometheus Metrics Registry
//!
//! Device telemetry is exported as one gauge per device and field. The set of
//! fields is only known once a device answers, so gauges are created lazily on
//! the first sample and updated in place afterwards.
//!
//! # Metric Naming
//!
//! - Telemetry gauges: `<prefix>_<field_path>`, e.g. `tapo_current_power`
//! - Constant labels on every telemetry gauge: `device` (configured name) and
//!   `ip_address`
//! - Exporter self-metrics:
//!   - `<prefix>_device_up` - 1 if the device's latest poll produced telemetry
//!   - `<prefix>_exporter_poll_failures_total` - poll cycles that produced nothing
//!
//! # Concurrency
//!
//! Many poll tasks report at the same time, for different devices and for
//! overlapping cycles of the same device. Lookups of existing gauges take a
//! shared lock; creation takes the exclusive lock and re-checks, so at most one
//! gauge is ever registered per [`MetricKey`].

use crate::config::DeviceConfig;
use crate::error::Result;
use crate::flatten::TelemetrySample;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Identity of one telemetry gauge: device address and full metric name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub address: String,
    pub metric_name: String,
}

/// Registry of device telemetry gauges
///
/// Cheap to clone; clones share the same gauges and Prometheus registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    prefix: Arc<str>,
    gauges: Arc<RwLock<HashMap<MetricKey, Gauge>>>,
    devices_up: Arc<RwLock<HashSet<String>>>,

    pub device_up: Arc<GaugeVec>,
    pub poll_failures: Arc<IntCounterVec>,
}

impl MetricsRegistry {
    pub fn new(prefix: &str) -> Result<Self> {
        let registry = Registry::new();

        let device_up = GaugeVec::new(
            Opts::new(
                "device_up",
                "Whether the latest poll of the device produced telemetry (1=yes, 0=no)",
            )
            .namespace(prefix),
            &["device", "ip_address"],
        )?;

        let poll_failures = IntCounterVec::new(
            Opts::new(
                "exporter_poll_failures_total",
                "Poll cycles that ended without telemetry",
            )
            .namespace(prefix),
            &["device", "ip_address"],
        )?;

        registry.register(Box::new(device_up.clone()))?;
        registry.register(Box::new(poll_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            prefix: Arc::from(prefix),
            gauges: Arc::new(RwLock::new(HashMap::new())),
            devices_up: Arc::new(RwLock::new(HashSet::new())),
            device_up: Arc::new(device_up),
            poll_failures: Arc::new(poll_failures),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full metric name for a flattened field path
    pub fn metric_name(&self, field_path: &str) -> String {
        sanitize_metric_name(&format!("{}_{}", self.prefix, field_path))
    }

    /// Record one sample for `device`, creating its gauge on first use.
    pub fn handle(&self, device: &DeviceConfig, sample: &TelemetrySample) -> Result<()> {
        let key = MetricKey {
            address: device.ip_address.clone(),
            metric_name: self.metric_name(&sample.field_path),
        };

        let existing = self
            .gauges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        if let Some(gauge) = existing {
            debug!(
                metric = %key.metric_name,
                value = sample.value,
                device = %device.name,
                ip_address = %device.ip_address,
                "Updating metric"
            );
            gauge.set(sample.value);
            return Ok(());
        }

        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        // Another task may have created it while we waited for the write lock
        if let Some(gauge) = gauges.get(&key) {
            gauge.set(sample.value);
            return Ok(());
        }

        debug!(
            metric = %key.metric_name,
            device = %device.name,
            ip_address = %device.ip_address,
            "Adding new metric"
        );
        let gauge = Gauge::with_opts(
            // Help must be identical for every series sharing the sanitized name
            Opts::new(
                key.metric_name.clone(),
                format!("Device telemetry {}", key.metric_name),
            )
            .const_label("device", device.name.clone())
            .const_label("ip_address", device.ip_address.clone()),
        )?;
        self.registry.register(Box::new(gauge.clone()))?;
        gauge.set(sample.value);
        gauges.insert(key, gauge);

        Ok(())
    }

    /// Current value of a telemetry gauge, if it exists
    pub fn value(&self, address: &str, field_path: &str) -> Option<f64> {
        let key = MetricKey {
            address: address.to_string(),
            metric_name: self.metric_name(field_path),
        };
        self.gauges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .map(Gauge::get)
    }

    /// Number of telemetry gauges created so far
    pub fn len(&self) -> usize {
        self.gauges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the outcome of a poll cycle for `device`
    pub fn record_poll(&self, device: &DeviceConfig, success: bool) {
        let labels = [device.name.as_str(), device.ip_address.as_str()];
        let mut devices_up = self
            .devices_up
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if success {
            self.device_up.with_label_values(&labels).set(1.0);
            devices_up.insert(device.ip_address.clone());
        } else {
            self.device_up.with_label_values(&labels).set(0.0);
            self.poll_failures.with_label_values(&labels).inc();
            devices_up.remove(&device.ip_address);
        }
    }

    /// Whether any device's latest poll produced telemetry
    pub fn any_device_up(&self) -> bool {
        !self
            .devices_up
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Replace characters Prometheus does not accept in metric names with `_`.
pub fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .enumerate()
        .map(|(i, c)| match c {
            'a'..='z' | 'A'..='Z' | '_' | ':' => c,
            '0'..='9' if i > 0 => c,
            _ => '_',
        })
        .collect()
}
