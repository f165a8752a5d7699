//! Tapo Sessions
//!
//! A session is a [`PlugEnergyMonitoringHandler`] from the `tapo` crate. The
//! crate performs the device handshake when the session is opened and again
//! on `refresh_session`; telemetry is the plug's energy usage report.

use crate::config::{Credentials, DeviceConfig};
use crate::device::client::{DeviceClient, SessionFactory};
use crate::error::{ExporterError, Result};
use crate::flatten::{payload_from_json, Payload};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tapo::{ApiClient, PlugEnergyMonitoringHandler, TapoResponseError};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Opens Tapo sessions with one shared account
pub struct TapoSessionFactory {
    credentials: Arc<Credentials>,
}

impl TapoSessionFactory {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

#[async_trait]
impl SessionFactory for TapoSessionFactory {
    async fn connect(&self, device: &DeviceConfig) -> Result<Arc<dyn DeviceClient>> {
        info!(device = %device.name, ip_address = %device.ip_address, "Opening Tapo session");

        let handler = ApiClient::new(
            self.credentials.username.clone(),
            self.credentials.password.expose_secret(),
        )
        .p110(device.ip_address.clone())
        .await
        .map_err(classify)?;

        Ok(Arc::new(TapoDeviceClient::new(handler)))
    }
}

/// Session with one energy-monitoring plug
///
/// Fetches share the handler; a refresh takes it exclusively.
pub struct TapoDeviceClient {
    handler: RwLock<PlugEnergyMonitoringHandler>,
}

impl TapoDeviceClient {
    pub fn new(handler: PlugEnergyMonitoringHandler) -> Self {
        Self {
            handler: RwLock::new(handler),
        }
    }
}

#[async_trait]
impl DeviceClient for TapoDeviceClient {
    async fn fetch_telemetry(&self) -> Result<Payload> {
        let usage = self
            .handler
            .read()
            .await
            .get_energy_usage()
            .await
            .map_err(classify)?;

        match serde_json::to_value(usage)? {
            serde_json::Value::Object(object) => Ok(payload_from_json(object)),
            other => Err(ExporterError::DeviceApi(format!(
                "energy usage serialized to {} instead of an object",
                json_kind(&other)
            ))),
        }
    }

    async fn reauthenticate(&self) -> Result<()> {
        self.handler
            .write()
            .await
            .refresh_session()
            .await
            .map_err(classify)?;
        debug!("Tapo session refreshed");
        Ok(())
    }
}

/// Map a `tapo` error onto the exporter's taxonomy.
///
/// A timed out session or a request the device answers with HTTP 403 means
/// the handshake has to be redone.
pub fn classify(err: tapo::Error) -> ExporterError {
    let message = err.to_string();

    let expired = match &err {
        tapo::Error::Tapo(TapoResponseError::SessionTimeout) => true,
        tapo::Error::Tapo(TapoResponseError::Unauthorized { .. }) => {
            return ExporterError::Auth(message)
        }
        tapo::Error::Http(e) => e.status().is_some_and(|status| status.as_u16() == 403),
        // Handshake failures only carry their status in the text
        _ => message.contains("403"),
    };

    if expired {
        ExporterError::AuthExpired(message)
    } else {
        ExporterError::DeviceApi(message)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
