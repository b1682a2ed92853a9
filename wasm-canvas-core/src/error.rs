//! Error types for loading and configuration
use thiserror::Error;

/// Why a load session ended early
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Missing WebAssembly support or graphics context below the required level
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("instantiation failed: {0}")]
    Instantiation(String),

    /// The page refused the runtime configuration or the companion script
    #[error("host error: {0}")]
    Host(String),

    #[error("runtime configuration was replaced by another load session")]
    Superseded,
}

impl LoadError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSS value for {field}: {value:?}")]
    InvalidCssValue { field: &'static str, value: String },

    #[error("unknown graphics capability level: {0:?}")]
    UnknownCapability(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("WasmCanvas can only be mounted once")]
pub struct AlreadyMounted;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = LoadError::fetch("game.wasm", "404 Not Found");
        assert_eq!(err.to_string(), "failed to fetch game.wasm: 404 Not Found");
    }
}
