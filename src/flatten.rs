//! Telemetry Flattening
//!
//! Devices answer with a JSON object whose fields are numbers, arrays of
//! numbers (possibly nested) or values we cannot turn into a gauge. This
//! module turns such a payload into flat `(field_path, value)` samples.
//!
//! # Naming
//!
//! - A number under `field` becomes `field`
//! - The element at index `i` of a sequence under `field` becomes `field_i`,
//!   recursively, so `[[1, 2]]` under `x` yields `x_0_0` and `x_0_1`
//! - Strings, booleans, nulls and nested objects are dropped without error
//!
//! Payload fields are kept in a `BTreeMap`, so the samples of a given payload
//! always come out in the same order.

use std::collections::BTreeMap;

/// One telemetry value as reported by a device
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Number(f64),
    Sequence(Vec<TelemetryValue>),
    /// Anything that cannot be exported as a gauge
    Other,
}

/// Top-level telemetry response: field name to value
pub type Payload = BTreeMap<String, TelemetryValue>;

/// A single named scalar produced by [`flatten`]
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub field_path: String,
    pub value: f64,
}

impl TelemetrySample {
    pub fn new(field_path: impl Into<String>, value: f64) -> Self {
        Self {
            field_path: field_path.into(),
            value,
        }
    }
}

impl From<serde_json::Value> for TelemetryValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Other, Self::Number),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            _ => Self::Other,
        }
    }
}

impl From<f64> for TelemetryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<TelemetryValue>> From<Vec<T>> for TelemetryValue {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Build a [`Payload`] from a JSON object.
pub fn payload_from_json(object: serde_json::Map<String, serde_json::Value>) -> Payload {
    object
        .into_iter()
        .map(|(field, value)| (field, TelemetryValue::from(value)))
        .collect()
}

/// Lazily flatten `payload` into scalar samples.
pub fn flatten(payload: &Payload) -> Flatten<'_> {
    Flatten {
        fields: payload.iter(),
        pending: Vec::new(),
    }
}

/// Iterator returned by [`flatten`]
///
/// Walks the payload depth-first. `pending` holds the values still to visit
/// inside the current top-level field, last element first.
pub struct Flatten<'a> {
    fields: std::collections::btree_map::Iter<'a, String, TelemetryValue>,
    pending: Vec<(String, &'a TelemetryValue)>,
}

impl Iterator for Flatten<'_> {
    type Item = TelemetrySample;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (path, value) = match self.pending.pop() {
                Some(entry) => entry,
                None => {
                    let (field, value) = self.fields.next()?;
                    (field.clone(), value)
                }
            };

            match value {
                TelemetryValue::Number(v) => return Some(TelemetrySample::new(path, *v)),
                TelemetryValue::Sequence(items) => {
                    self.pending.extend(
                        items
                            .iter()
                            .enumerate()
                            .rev()
                            .map(|(index, item)| (format!("{}_{}", path, index), item)),
                    );
                }
                TelemetryValue::Other => {}
            }
        }
    }
}
