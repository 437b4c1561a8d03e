use std::fmt;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    LlmError(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    InvalidRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::LlmError(msg) => write!(f, "LLM error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl AppError {
    /// Message safe to return to a client. Internal failures (database, LLM)
    /// are collapsed to a generic message; the full detail stays in the logs.
    pub fn client_message(&self) -> &str {
        match self {
            AppError::DatabaseError(_) => "Internal server error",
            AppError::LlmError(_) => "Error generating response",
            AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::InvalidRequest(msg) => msg,
        }
    }
}

impl std::error::Error for AppError {}
