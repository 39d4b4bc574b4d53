use thiserror::Error;

/// Failure taxonomy for a single tool invocation.
///
/// Every tool execution boundary converts one of these into the flat
/// `{success: false, error}` envelope; nothing escapes dispatch as a panic
/// or raw driver error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("invalid `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error("{0}")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("upstream service failure: {0}")]
    Upstream(String),
}

impl ToolError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id} not found"))
    }

    /// Stable kind string used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::Upstream(_) => "upstream",
        }
    }

    /// Message safe to place in the result envelope. Storage details stay in
    /// the logs so driver text and connection strings never reach callers.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { .. } | Self::NotFound(_) => self.to_string(),
            Self::Storage(_) => "the storage backend could not complete the operation".to_string(),
            Self::Upstream(_) => "an upstream service failed to respond".to_string(),
        }
    }
}
