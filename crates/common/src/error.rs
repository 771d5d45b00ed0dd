//! Error types for Relay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API key not configured for {backend}: set {env_var}")]
    MissingCredential {
        backend: String,
        env_var: &'static str,
    },

    #[error("Upstream API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelayError {
    /// HTTP status this error maps to at the API boundary.
    pub fn status(&self) -> u16 {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::InvalidRequest(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_env_var() {
        let err = RelayError::MissingCredential {
            backend: "nvidia".into(),
            env_var: "NVIDIA_API_KEY",
        };
        assert!(err.to_string().contains("NVIDIA_API_KEY"));
    }

    #[test]
    fn status_mapping() {
        let upstream = RelayError::Upstream {
            status: 429,
            body: String::new(),
        };
        assert_eq!(upstream.status(), 429);
        assert_eq!(RelayError::InvalidRequest("x".into()).status(), 400);
        assert_eq!(RelayError::Config("x".into()).status(), 500);
    }
}
