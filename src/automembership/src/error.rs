//! Error types for automatic membership

use thiserror::Error;

/// Failures reported by the directory collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Walking the real membership graph failed
    #[error("Failed to traverse membership of '{0}': {1}")]
    Traversal(String, String),

    /// Backend failure not tied to a single identity
    #[error("Directory error: {0}")]
    Backend(String),
}

/// Failures reported by the content-store query boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The statement could not be parsed
    #[error("Failed to parse statement: {0}")]
    Parse(String),

    /// A `$name` placeholder has no matching binding
    #[error("Missing binding: ${0}")]
    MissingBinding(String),

    /// The statement parsed but could not be executed
    #[error("Failed to execute statement: {0}")]
    Execution(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value in the auto-membership mapping
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Malformed JSON
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed provenance values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvenanceError {
    /// Provenance value is empty
    #[error("Provenance value cannot be empty")]
    Empty,
}

/// Automatic membership errors surfaced to callers
#[derive(Debug, Error)]
pub enum AutoMembershipError {
    /// Reverse enumeration could not build or run its query
    #[error("Failed to retrieve members of auto-membership group '{group}': {source}")]
    Enumeration {
        /// Id of the group whose members were requested
        group: String,
        #[source]
        source: QueryError,
    },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for automatic membership operations
pub type Result<T> = std::result::Result<T, AutoMembershipError>;
