//! Resolution store port - atomic write of one resolution.
//!
//! Accepting an amendment touches the text and any number of sibling
//! amendments. They are written together or not at all.

use async_trait::async_trait;

use crate::domain::amend::Amend;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::resolution::Resolution;
use crate::domain::text::Text;

/// All aggregates changed by one resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionChangeset<'a> {
    /// The patched text, if the body changed.
    pub text: Option<&'a Text>,
    /// Every amendment whose status or version changed.
    pub amends: &'a [Amend],
}

impl<'a> From<&'a Resolution> for ResolutionChangeset<'a> {
    fn from(resolution: &'a Resolution) -> Self {
        Self {
            text: resolution.text.as_ref(),
            amends: &resolution.amends,
        }
    }
}

/// Port for committing a resolution.
///
/// Implementations must ensure:
/// - every write of the changeset lands, or none does
/// - a failed commit leaves previously stored state untouched
/// - the commit is exclusive per text across processes: it only lands if
///   the stored text is still one patch behind the changeset's text and
///   every amendment in it is still open
#[async_trait]
pub trait ResolutionStore: Send + Sync {
    /// Writes the changeset atomically.
    ///
    /// # Errors
    ///
    /// - `TextNotFound` / `AmendNotFound` if an aggregate was never saved
    /// - `ConcurrentModification` if another writer got there first
    /// - `DatabaseError` on persistence failure
    async fn commit(&self, changeset: ResolutionChangeset<'_>) -> Result<(), DomainError>;
}

/// Error for a changeset built from state that has since moved on.
pub fn stale_changeset(what: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::ConcurrentModification,
        format!("{} changed since the resolution was computed", what),
    )
}
