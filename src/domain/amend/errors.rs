//! Amend-specific error types.

use thiserror::Error;

use crate::domain::foundation::{AmendId, DomainError, ErrorCode, TextId};

/// Errors returned by amendment command and query handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmendError {
    #[error("Amend not found: {0}")]
    NotFound(AmendId),

    #[error("Text not found: {0}")]
    TextNotFound(TextId),

    #[error("Amend is closed")]
    Closed,

    #[error("Amendment does not change the text")]
    EmptyAmendment,

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl AmendError {
    pub fn not_found(id: AmendId) -> Self {
        AmendError::NotFound(id)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AmendError::NotFound(_) => ErrorCode::AmendNotFound,
            AmendError::TextNotFound(_) => ErrorCode::TextNotFound,
            AmendError::Closed => ErrorCode::AmendClosed,
            AmendError::EmptyAmendment => ErrorCode::EmptyAmendment,
            AmendError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            AmendError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for AmendError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::AmendClosed => AmendError::Closed,
            ErrorCode::EmptyAmendment => AmendError::EmptyAmendment,
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                AmendError::ValidationFailed {
                    field: err.details.get("field").cloned().unwrap_or_default(),
                    message: err.message,
                }
            }
            _ => AmendError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_amend_maps_to_closed() {
        let err: AmendError = DomainError::new(ErrorCode::AmendClosed, "closed").into();
        assert_eq!(err, AmendError::Closed);
        assert_eq!(err.code(), ErrorCode::AmendClosed);
    }

    #[test]
    fn validation_keeps_field_detail() {
        let err: AmendError = DomainError::validation("description", "too long").into();
        assert_eq!(
            err,
            AmendError::ValidationFailed {
                field: "description".to_string(),
                message: "too long".to_string()
            }
        );
    }
}
