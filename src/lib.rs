//! Tapo Energy Prometheus Exporter
//!
//! Polls a fixed set of Tapo smart plugs for their energy usage and exposes
//! every numeric field as a Prometheus gauge.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    Tapo protocol     ┌────────────────────┐
//! │  Device A   │ ◄─────────────────►  │      Exporter      │
//! └─────────────┘  handshake + HTTP    │                    │
//! ┌─────────────┐                      │  ┌──────────────┐  │      HTTP      ┌────────────┐
//! │  Device B   │ ◄─────────────────►  │  │  Scheduler   │  │ ◄────────────► │ Prometheus │
//! └─────────────┘                      │  └──────┬───────┘  │   /metrics     └────────────┘
//!                                      │  poll ─ flatten ─  │
//!                                      │  ┌──────▼───────┐  │
//!                                      │  │   Registry   │  │
//!                                      │  └──────────────┘  │
//!                                      └────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`device`] - Device client traits and the Tapo implementation
//! - [`poll`] - Per-device poll cycle with retries and re-authentication
//! - [`flatten`] - Turns nested telemetry into named scalar samples
//! - [`metrics`] - Lazily created per-device gauges
//! - [`scheduler`] - Periodic, concurrent poll dispatch
//! - [`server`] - HTTP server and wiring
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use secrecy::SecretString;
//! use tapo_exporter::{config::{Config, Credentials}, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/devices.json")?;
//!     let credentials = Credentials {
//!         username: "me@example.com".to_string(),
//!         password: SecretString::from("secret"),
//!     };
//!     server::start(config, credentials).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod flatten;
pub mod metrics;
pub mod poll;
pub mod scheduler;
pub mod server;
