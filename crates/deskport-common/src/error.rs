//! Error types for DeskPort

use thiserror::Error;

/// Main error type for DeskPort
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Datastore error: {0}")]
    Datastore(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Target account not found: {0}")]
    TargetAccountNotFound(String),

    #[error("Account '{0}' has no conversations matching the export filters")]
    EmptyExport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for DeskPort
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error must abort a whole run rather than a single record.
    ///
    /// Fatal errors escape to the transaction boundary and roll back every
    /// write made in the run. Everything else is caught at the record level
    /// and accumulated into the import report.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::Snapshot(_)
                | Error::Connection(_)
                | Error::TargetAccountNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Snapshot("truncated".to_string()).is_fatal());
        assert!(Error::Connection("broken pipe".to_string()).is_fatal());
        assert!(Error::TargetAccountNotFound("Acme".to_string()).is_fatal());
        assert!(!Error::Datastore("duplicate key".to_string()).is_fatal());
        assert!(!Error::Validation("missing email".to_string()).is_fatal());
    }
}
