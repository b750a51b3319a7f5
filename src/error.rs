use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error type.
///
/// Only configuration problems are fatal, and those are raised before the
/// Router exists (see `Config::from_env`). Everything here is recoverable:
/// the update loop logs the error and moves on to the next event.
#[derive(Error, Debug)]
pub enum GatewayError {
    // ===== Transport Errors =====
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    // ===== Configuration Errors =====
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        GatewayError::Config(msg.into())
    }

    /// Log this error with the appropriate level
    pub fn log(&self) {
        match self {
            GatewayError::Transport(e) => {
                tracing::warn!(error = %e, "transport operation failed");
            }
            GatewayError::Config(msg) => {
                tracing::error!(error = %msg, "configuration error");
            }
        }
    }
}

/// Errors produced by the transport adapter.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Bot API answered `ok: false`. `code` is the API's own error code
    /// (HTTP-status-shaped), `description` its human-readable reason.
    #[error("api rejected call: {description} (code {code})")]
    Api { code: i64, description: String },

    /// The API reported success but omitted the result payload.
    #[error("api response had no result payload")]
    EmptyResult,
}
