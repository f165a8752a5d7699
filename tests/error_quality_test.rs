//! Error message quality tests
//!
//! Tests that verify error messages are helpful and distinguishable.

use tapo_exporter::error::ExporterError;

#[test]
fn test_auth_error_message_clarity() {
    // Given: An authentication error
    let error = ExporterError::Auth("Invalid password".to_string());

    // When: Converting to string
    let message = format!("{}", error);

    // Then: Message should clearly indicate authentication issue
    assert!(message.contains("Authentication failed"));
    assert!(message.contains("Invalid password"));
}

#[test]
fn test_device_api_error_message_clarity() {
    let error = ExporterError::DeviceApi("Method not found".to_string());
    let message = format!("{}", error);

    assert!(message.contains("Device API error"));
    assert!(message.contains("Method not found"));
}

#[test]
fn test_timeout_error_message_clarity() {
    // Given: A device call that ran over its deadline
    let error = ExporterError::Timeout("fetch did not finish within 10s".to_string());

    // When: Converting to string
    let message = format!("{}", error);

    // Then: Message should say the call timed out and which one
    assert!(message.contains("timed out"));
    assert!(message.contains("fetch"));
}

#[test]
fn test_json_error_message_clarity() {
    let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let error = ExporterError::Json(json_err);

    assert!(format!("{}", error).contains("JSON error"));
}

#[test]
fn test_metrics_error_converts_from_prometheus() {
    // Given: A prometheus error, as returned for invalid metric names
    let error: ExporterError = prometheus::Error::Msg("bad name".to_string()).into();

    // Then: It is reported as a metrics error
    let message = format!("{}", error);
    assert!(message.starts_with("Metrics error"));
    assert!(message.contains("bad name"));
}

#[test]
fn test_only_auth_expired_is_classified_as_auth_expired() {
    // Given: One error of each kind
    let expired = ExporterError::AuthExpired("403".to_string());
    let others = [
        ExporterError::Auth("rejected".to_string()),
        ExporterError::DeviceApi("403 in the text does not count".to_string()),
        ExporterError::Config("x".to_string()),
        ExporterError::Timeout("x".to_string()),
    ];

    // Then: Classification relies on the variant, not on the message text
    assert!(expired.is_auth_expired());
    for error in &others {
        assert!(!error.is_auth_expired(), "{} misclassified", error);
    }
}

#[test]
fn test_error_messages_are_distinguishable() {
    // Given: Different error types
    let auth_err = format!("{}", ExporterError::Auth("test".to_string()));
    let expired_err = format!("{}", ExporterError::AuthExpired("test".to_string()));
    let api_err = format!("{}", ExporterError::DeviceApi("test".to_string()));
    let config_err = format!("{}", ExporterError::Config("test".to_string()));
    let timeout_err = format!("{}", ExporterError::Timeout("test".to_string()));

    // Then: Each should have a unique prefix
    assert!(auth_err.starts_with("Authentication failed"));
    assert!(expired_err.starts_with("Authorization expired"));
    assert!(api_err.starts_with("Device API error"));
    assert!(config_err.starts_with("Configuration error"));
    assert!(timeout_err.starts_with("Device call timed out"));

    assert_ne!(auth_err, expired_err);
    assert_ne!(api_err, config_err);
    assert_ne!(config_err, timeout_err);
}

#[test]
fn test_error_debug_format() {
    let error = ExporterError::Auth("Invalid credentials".to_string());
    let debug_message = format!("{:?}", error);

    assert!(debug_message.contains("Auth"));
    assert!(debug_message.contains("Invalid credentials"));
}
