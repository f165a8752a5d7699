//! Flattening tests
//!
//! Tests that verify how device payloads become named scalar samples.

use serde_json::json;
use tapo_exporter::flatten::{flatten, payload_from_json, Payload, TelemetrySample, TelemetryValue};

/// Build a payload from a JSON object literal
fn payload(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(object) => payload_from_json(object),
        other => panic!("expected an object, got {}", other),
    }
}

fn samples(payload: &Payload) -> Vec<(String, f64)> {
    flatten(payload)
        .map(|TelemetrySample { field_path, value }| (field_path, value))
        .collect()
}

#[test]
fn test_single_number() {
    // Given: A payload with one numeric field
    let payload = payload(json!({"a": 1.0}));

    // Then: Exactly one sample with the field name
    assert_eq!(samples(&payload), vec![("a".to_string(), 1.0)]);
}

#[test]
fn test_array_is_indexed_from_zero() {
    let payload = payload(json!({"a": [1.0, 2.0, 3.0]}));

    assert_eq!(
        samples(&payload),
        vec![
            ("a_0".to_string(), 1.0),
            ("a_1".to_string(), 2.0),
            ("a_2".to_string(), 3.0),
        ]
    );
}

#[test]
fn test_non_numeric_fields_are_dropped() {
    // Given: A payload mixing text and numbers
    let payload = payload(json!({"a": "text", "b": 2.0}));

    // Then: Only the numeric field survives
    assert_eq!(samples(&payload), vec![("b".to_string(), 2.0)]);
}

#[test]
fn test_booleans_nulls_and_objects_are_dropped() {
    let payload = payload(json!({
        "on": true,
        "missing": null,
        "nested": {"inner": 4.0},
        "kept": 1
    }));

    assert_eq!(samples(&payload), vec![("kept".to_string(), 1.0)]);
}

#[test]
fn test_array_elements_that_are_not_numbers_keep_their_index() {
    // Given: An array with a hole in the middle
    let payload = payload(json!({"a": [1.0, "x", 3.0]}));

    // Then: Surviving elements keep their original position in the name
    assert_eq!(
        samples(&payload),
        vec![("a_0".to_string(), 1.0), ("a_2".to_string(), 3.0)]
    );
}

#[test]
fn test_nested_arrays_recurse() {
    let payload = payload(json!({"m": [[1, 2], [3]]}));

    assert_eq!(
        samples(&payload),
        vec![
            ("m_0_0".to_string(), 1.0),
            ("m_0_1".to_string(), 2.0),
            ("m_1_0".to_string(), 3.0),
        ]
    );
}

#[test]
fn test_empty_payload_and_empty_array() {
    assert!(samples(&Payload::new()).is_empty());
    assert!(samples(&payload(json!({"a": []}))).is_empty());
}

#[test]
fn test_energy_usage_response_shape() {
    // Given: A typical smart-plug energy usage response
    let payload = payload(json!({
        "today_runtime": 306,
        "month_runtime": 12120,
        "today_energy": 154,
        "month_energy": 6502,
        "local_time": "2024-05-01 12:00:00",
        "current_power": 48530,
        "past24h": [10, 20]
    }));

    // When: Flattening
    let names: Vec<String> = samples(&payload).into_iter().map(|(name, _)| name).collect();

    // Then: Every numeric field is present and the timestamp string is not
    for expected in [
        "today_runtime",
        "month_runtime",
        "today_energy",
        "month_energy",
        "current_power",
        "past24h_0",
        "past24h_1",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    assert!(!names.iter().any(|n| n == "local_time"));
    assert_eq!(names.len(), 7);
}

#[test]
fn test_flatten_is_lazy() {
    // Given: A large payload
    let mut payload = Payload::new();
    payload.insert(
        "big".to_string(),
        TelemetryValue::Sequence((0..10_000).map(|i| TelemetryValue::Number(i as f64)).collect()),
    );

    // When: Taking only the first sample
    let first = flatten(&payload).next();

    // Then: It is produced without walking the rest
    assert_eq!(first, Some(TelemetrySample::new("big_0", 0.0)));
}
