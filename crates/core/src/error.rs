//! Error types for the Beacon core crate.

use thiserror::Error;

/// Top-level error type for all Beacon core operations.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sync error: {0}")]
    Sync(String),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("unknown message kind: {0}")]
    UnknownMessageKind(String),

    #[error("connector {provider} does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: String,
    },

    #[error("invalid tenant scope: {0}")]
    InvalidTenantScope(String),
}

/// A convenience Result alias that defaults to [`BeaconError`].
pub type Result<T> = std::result::Result<T, BeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = BeaconError::Config("missing field".into());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BeaconError::from(io_err);
        assert!(matches!(err, BeaconError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn unknown_message_kind_display() {
        let err = BeaconError::UnknownMessageKind("BellRang".into());
        assert_eq!(err.to_string(), "unknown message kind: BellRang");
    }

    #[test]
    fn unsupported_capability_display() {
        let err = BeaconError::UnsupportedCapability {
            provider: "wonde".into(),
            capability: "TimetableSync".into(),
        };
        assert_eq!(
            err.to_string(),
            "connector wonde does not support TimetableSync"
        );
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(BeaconError::Sync("timeout".into()));
        assert!(err.is_err());
    }
}
