//! Device Client
//!
//! The poll loop talks to devices through two small traits:
//!
//! - [`DeviceClient`] - a live session: fetch telemetry, re-authenticate
//! - [`SessionFactory`] - opens a new authenticated session for a device
//!
//! [`TapoSessionFactory`](crate::device::TapoSessionFactory) implements them
//! for Tapo smart plugs.
//!
//! # Example
//!
//! ```no_run
//! use secrecy::SecretString;
//! use tapo_exporter::config::{Credentials, DeviceConfig};
//! use tapo_exporter::device::{DeviceClient, SessionFactory, TapoSessionFactory};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let credentials = Credentials {
//!     username: "me@example.com".to_string(),
//!     password: SecretString::from("secret"),
//! };
//! let factory = TapoSessionFactory::new(credentials);
//! let device = DeviceConfig {
//!     name: "Kitchen".to_string(),
//!     ip_address: "192.168.1.20".to_string(),
//! };
//!
//! let session = factory.connect(&device).await?;
//! let payload = session.fetch_telemetry().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::DeviceConfig;
use crate::error::Result;
use crate::flatten::Payload;
use async_trait::async_trait;
use std::sync::Arc;

/// An established session with one device
///
/// Errors that mean the session's authorization has lapsed must be reported
/// as [`ExporterError::AuthExpired`](crate::error::ExporterError::AuthExpired).
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Fetch the device's current telemetry
    async fn fetch_telemetry(&self) -> Result<Payload>;

    /// Refresh the session's authorization in place
    async fn reauthenticate(&self) -> Result<()>;
}

/// Opens authenticated sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn connect(&self, device: &DeviceConfig) -> Result<Arc<dyn DeviceClient>>;
}
