use thiserror::Error;

/// The error taxonomy shared by every layer of the indexing pipeline.
///
/// Each variant maps to one of the error kinds of the ingestion design:
/// parse/IO failures are local-recovery (the walker or scan just skips the
/// row), backend/model failures gate a flag flip, and config/schema failures
/// are surfaced to the caller.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An analyzer could not parse a source file. The walker logs and continues.
    #[error("parse failure in {file_path}: {reason}")]
    ParseFailure { file_path: String, reason: String },

    /// A file could not be read from disk.
    #[error("I/O failure reading {path}: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A Graph, Relational, or Vector store operation failed.
    #[error("backend failure ({backend}): {reason}")]
    BackendFailure { backend: String, reason: String },

    /// An LLM chat or embedding call failed or returned an empty result.
    #[error("model failure ({service}): {reason}")]
    ModelFailure { service: String, reason: String },

    /// An internal invariant was violated (e.g. vector count != row count).
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Missing or invalid configuration (model name, space prefix, ...).
    #[error("config failure: {0}")]
    ConfigFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn parse_failure(file_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            file_path: file_path.into(),
            reason: reason.into(),
        }
    }

    pub fn io_failure(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    pub fn backend(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendFailure {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        Self::BackendFailure {
            backend: "storage".to_string(),
            reason: reason.into(),
        }
    }

    pub fn model(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelFailure {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn embedding(reason: impl Into<String>) -> Self {
        Self::ModelFailure {
            service: "embedding".to_string(),
            reason: reason.into(),
        }
    }

    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigFailure(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::BackendFailure { .. })
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::ParseFailure { .. })
    }

    /// Maps this error onto the CLI exit-code scheme: 0 success (not
    /// represented here), 2 bad input, 3 backend unavailable, 4 partial
    /// failure. Anything else collapses to a generic non-zero failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput(_) | Self::ConfigFailure(_) => 2,
            Self::BackendFailure { .. } => 3,
            Self::ParseFailure { .. } | Self::SchemaViolation(_) | Self::ModelFailure { .. } => 4,
            _ => 1,
        }
    }
}
