//! ResolveAcceptanceHandler - Command handler accepting an amendment.
//!
//! Applies the amendment's patch to its text and cascades the outcome to
//! every other open amendment of the text. The whole read-compute-commit
//! runs inside the text's exclusive section, and every write of one
//! resolution goes through a single `ResolutionStore::commit`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use crate::application::TextLocks;
use crate::domain::amend::Amend;
use crate::domain::foundation::{
    AmendId, CommandMetadata, DomainError, ErrorCode, EventEnvelope, TextId, Timestamp,
};
use crate::domain::patch::PatchEngine;
use crate::domain::resolution::{resolve_acceptance, Resolution, ResolutionReport};
use crate::domain::text::Text;
use crate::ports::{
    AmendRepository, EventPublisher, ResolutionChangeset, ResolutionStore, TextRepository,
};

/// Command to accept an amendment.
#[derive(Debug, Clone)]
pub struct ResolveAcceptanceCommand {
    pub amend_id: AmendId,
}

/// Why a resolution did not happen.
///
/// A patch that no longer applies is not an error: it is reported as
/// `ResolutionOutcome::Conflicted` inside an `Ok` report.
#[derive(Debug, Clone, Error)]
pub enum ResolveAcceptanceError {
    #[error("Amend not found: {0}")]
    AmendNotFound(AmendId),

    #[error("Text not found: {0}")]
    TextNotFound(TextId),

    #[error("Amend {0} is already closed")]
    AlreadyClosed(AmendId),

    #[error("Storage error: {0}")]
    Storage(#[from] DomainError),

    #[error("Resolution timed out after {0:?}")]
    TimedOut(Duration),
}

impl ResolveAcceptanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveAcceptanceError::AmendNotFound(_) => ErrorCode::AmendNotFound,
            ResolveAcceptanceError::TextNotFound(_) => ErrorCode::TextNotFound,
            ResolveAcceptanceError::AlreadyClosed(_) => ErrorCode::AmendClosed,
            ResolveAcceptanceError::Storage(e) => e.code,
            ResolveAcceptanceError::TimedOut(_) => ErrorCode::Timeout,
        }
    }
}

/// Handler for accepting amendments.
pub struct ResolveAcceptanceHandler {
    texts: Arc<dyn TextRepository>,
    amends: Arc<dyn AmendRepository>,
    store: Arc<dyn ResolutionStore>,
    event_publisher: Arc<dyn EventPublisher>,
    locks: Arc<TextLocks>,
    engine: PatchEngine,
    timeout: Duration,
}

impl ResolveAcceptanceHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        texts: Arc<dyn TextRepository>,
        amends: Arc<dyn AmendRepository>,
        store: Arc<dyn ResolutionStore>,
        event_publisher: Arc<dyn EventPublisher>,
        locks: Arc<TextLocks>,
        engine: PatchEngine,
        timeout: Duration,
    ) -> Self {
        Self {
            texts,
            amends,
            store,
            event_publisher,
            locks,
            engine,
            timeout,
        }
    }

    #[instrument(
        name = "resolve_acceptance",
        skip(self, cmd, metadata),
        fields(amend_id = %cmd.amend_id, correlation_id = %metadata.correlation_id())
    )]
    pub async fn handle(
        &self,
        cmd: ResolveAcceptanceCommand,
        metadata: CommandMetadata,
    ) -> Result<ResolutionReport, ResolveAcceptanceError> {
        let text_id = self.locate(&cmd.amend_id).await?;
        let _guard = self.locks.lock(text_id).await;

        let resolution = self.with_timeout(self.resolve_locked(&cmd.amend_id)).await?;

        tracing::info!(
            text_id = %text_id,
            accepted = resolution.report.is_accepted(),
            text_version = resolution.report.text_version,
            closed_siblings = resolution.report.closed_siblings.len(),
            rebased_siblings = resolution.report.rebased_siblings.len(),
            "amend resolved"
        );

        self.publish(resolution.events, &metadata).await;
        Ok(resolution.report)
    }

    async fn resolve_locked(&self, amend_id: &AmendId) -> Result<Resolution, ResolveAcceptanceError> {
        let (text, amend) = self.load_open(amend_id).await?;
        self.commit_acceptance(text, amend, None).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Steps shared with FinishVoteHandler
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn locks(&self) -> &TextLocks {
        &self.locks
    }

    /// Finds which text an amendment belongs to, without writing anything.
    pub(crate) async fn locate(&self, amend_id: &AmendId) -> Result<TextId, ResolveAcceptanceError> {
        let amend = self
            .amends
            .find_by_id(amend_id)
            .await?
            .ok_or(ResolveAcceptanceError::AmendNotFound(*amend_id))?;
        if amend.is_closed() {
            return Err(ResolveAcceptanceError::AlreadyClosed(*amend_id));
        }
        Ok(*amend.text_id())
    }

    /// Loads an open amendment and its text. Call with the text lock held.
    pub(crate) async fn load_open(
        &self,
        amend_id: &AmendId,
    ) -> Result<(Text, Amend), ResolveAcceptanceError> {
        let amend = self
            .amends
            .find_by_id(amend_id)
            .await?
            .ok_or(ResolveAcceptanceError::AmendNotFound(*amend_id))?;
        if amend.is_closed() {
            return Err(ResolveAcceptanceError::AlreadyClosed(*amend_id));
        }
        let text = self
            .texts
            .find_by_id(amend.text_id())
            .await?
            .ok_or(ResolveAcceptanceError::TextNotFound(*amend.text_id()))?;
        Ok((text, amend))
    }

    /// Resolves and commits the acceptance of `amend`. Call with the text
    /// lock held.
    pub(crate) async fn commit_acceptance(
        &self,
        text: Text,
        amend: Amend,
        potential_votes: Option<u32>,
    ) -> Result<Resolution, ResolveAcceptanceError> {
        let siblings = self.amends.find_open_by_text(text.id()).await?;
        let resolution = resolve_acceptance(
            &self.engine,
            text,
            amend,
            siblings,
            Timestamp::now(),
            potential_votes,
        )?;

        self.store
            .commit(ResolutionChangeset::from(&resolution))
            .await?;
        Ok(resolution)
    }

    pub(crate) async fn commit(
        &self,
        changeset: ResolutionChangeset<'_>,
    ) -> Result<(), ResolveAcceptanceError> {
        Ok(self.store.commit(changeset).await?)
    }

    /// Runs the storage phase under the configured deadline. On expiry the
    /// future is dropped, so a commit that has not completed never lands.
    pub(crate) async fn with_timeout<T, F>(&self, work: F) -> Result<T, ResolveAcceptanceError>
    where
        F: Future<Output = Result<T, ResolveAcceptanceError>>,
    {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "resolution timed out");
                Err(ResolveAcceptanceError::TimedOut(self.timeout))
            }
        }
    }

    /// Publishes after commit. Failures are logged; the resolution stands.
    pub(crate) async fn publish(&self, events: Vec<EventEnvelope>, metadata: &CommandMetadata) {
        let events: Vec<EventEnvelope> = events.into_iter().map(|e| metadata.stamp(e)).collect();
        let count = events.len();
        if let Err(e) = self.event_publisher.publish_all(events).await {
            tracing::warn!(error = %e, events = count, "failed to publish resolution events");
        }
    }
}
