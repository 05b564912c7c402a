//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_and_messages() {
        let io: StoreError = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert!(matches!(io, StoreError::Io(_)));
        assert!(io.to_string().starts_with("IO error:"));

        let parse: StoreError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(parse, StoreError::Serialization(_)));

        assert_eq!(
            StoreError::Config("not a file path: /".into()).to_string(),
            "Configuration error: not a file path: /"
        );
    }
}
