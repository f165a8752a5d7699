use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Device API error: {0}")]
    DeviceApi(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Authorization expired: {0}")]
    AuthExpired(String),

    #[error("Device call timed out: {0}")]
    Timeout(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ExporterError {
    /// Whether the device rejected the request because its session is no
    /// longer authorized. The poll loop re-authenticates on these.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ExporterError::AuthExpired(_))
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
