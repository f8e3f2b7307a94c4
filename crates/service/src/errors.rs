use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed client input; safe to echo back.
    #[error("validation error: {0}")]
    Validation(String),
    /// Anything else; the message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn internal(msg: impl Into<String>) -> Self { Self::Internal(msg.into()) }

    pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}
