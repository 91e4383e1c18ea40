//! Errors crossing the port boundary.

/// Failure of a SQLite-backed repository call.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// `operation` names the repository method, for log correlation.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A stored value could not be decoded (timestamps, slot names, roles).
    #[error("Stored data is corrupt: {0}")]
    Serialization(String),

    /// A write was refused by a uniqueness or quantity rule.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure talking to the narrator model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// The request never produced an HTTP response (connect error, timeout).
    #[error("LLM unreachable: {0}")]
    Transport(String),

    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A response arrived but could not be used.
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Client errors are final, except request timeout (408) and rate limiting (429).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::InvalidResponse(_) => true,
            Self::Status { status, .. } => {
                matches!(status, 408 | 429) || !(400..500).contains(status)
            }
        }
    }
}
