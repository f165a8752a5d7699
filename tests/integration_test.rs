use tapo_exporter::config::Config;

#[test]
fn test_config_load() {
    // This assumes config/devices.json exists relative to where cargo test is run
    let config_res = Config::load("config/devices.json");
    assert!(config_res.is_ok(), "Failed to load example device list");

    let config = config_res.unwrap();
    assert_eq!(config.devices.len(), 2);
    assert_eq!(config.server.port, 8086);
    assert_eq!(config.polling.interval_seconds, 3);
    assert_eq!(config.polling.metric_prefix, "tapo");
}
