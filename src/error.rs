use thiserror::Error;

/// Canonical error enum for the crate.
///
/// Variants are the taxonomy the stores and engines surface to callers:
/// `AgentNotFound` and `Validation` are fatal to the requested operation,
/// `CorruptDocument` is surfaced rather than silently defaulted (defaulting
/// on corruption risks destroying data on the next write-back), and
/// `TemplateVariable` is recoverable at the interaction layer.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// No agent registered under the given name.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// A write violated a structural constraint (self-relationship,
    /// duplicate pair, out-of-range score). Rejected, never coerced.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A personality document exists but cannot be parsed.
    #[error("corrupt personality document for {agent}: {detail}")]
    CorruptDocument { agent: String, detail: String },

    /// A `{placeholder}` in a template has no matching variable.
    #[error("missing template variable: {0}")]
    TemplateVariable(String),

    /// SQLite / rusqlite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all for internal failures (lock poisoning and the like).
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Internal(String),
}

impl PersonaError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn corrupt_document(agent: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::CorruptDocument {
            agent: agent.into(),
            detail: detail.to_string(),
        }
    }
}

/// All store and engine operations return this type.
pub type Result<T> = std::result::Result<T, PersonaError>;
