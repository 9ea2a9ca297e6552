//! Text-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, TextId};

/// Errors returned by text command and query handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("Text not found: {0}")]
    NotFound(TextId),

    #[error("User already follows this text")]
    AlreadyFollowing,

    #[error("User does not follow this text")]
    NotFollowing,

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl TextError {
    pub fn not_found(id: TextId) -> Self {
        TextError::NotFound(id)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TextError::NotFound(_) => ErrorCode::TextNotFound,
            TextError::AlreadyFollowing => ErrorCode::AlreadyFollowing,
            TextError::NotFollowing => ErrorCode::NotFollowing,
            TextError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            TextError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for TextError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::AlreadyFollowing => TextError::AlreadyFollowing,
            ErrorCode::NotFollowing => TextError::NotFollowing,
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                TextError::ValidationFailed {
                    field: err.details.get("field").cloned().unwrap_or_default(),
                    message: err.message,
                }
            }
            _ => TextError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_conflicts_keep_their_code() {
        let err: TextError = DomainError::new(ErrorCode::AlreadyFollowing, "dup").into();
        assert_eq!(err, TextError::AlreadyFollowing);
        assert_eq!(err.code(), ErrorCode::AlreadyFollowing);
    }

    #[test]
    fn storage_failures_become_infrastructure() {
        let err: TextError = DomainError::database("connection reset").into();
        assert!(matches!(err, TextError::Infrastructure(_)));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }
}
