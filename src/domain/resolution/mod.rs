//! Resolution - accepting one amendment and cascading the outcome.
//!
//! Pure domain service: given a text, the amendment being accepted and the
//! other amendments on the same text, computes every state change and event
//! the acceptance implies. Persisting the result atomically and serializing
//! resolutions per text is the caller's job.

use serde::{Deserialize, Serialize};

use crate::domain::amend::{Amend, AmendRebased, AmendResult};
use crate::domain::foundation::{
    AmendId, DomainError, ErrorCode, EventEnvelope, EventId, SerializableDomainEvent, TextId,
    Timestamp,
};
use crate::domain::patch::{PatchConflict, PatchEngine};
use crate::domain::text::{Text, TextPatched};

/// What happened to the amendment being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The patch applied; `version` is the index it occupies in the text history.
    Accepted { version: u32 },
    /// The patch no longer applies to the current body.
    Conflicted { conflict: PatchConflict },
}

/// A sibling amendment closed because it no longer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingClosure {
    pub amend_id: AmendId,
    pub conflict: PatchConflict,
}

/// Summary returned to the caller of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub amend_id: AmendId,
    pub text_id: TextId,
    pub outcome: ResolutionOutcome,
    /// Text version after the resolution.
    pub text_version: u32,
    /// Siblings force-closed as conflicted, in creation order.
    pub closed_siblings: Vec<SiblingClosure>,
    /// Siblings that still apply and were moved to `text_version`.
    pub rebased_siblings: Vec<AmendId>,
}

impl ResolutionReport {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, ResolutionOutcome::Accepted { .. })
    }
}

/// Every change implied by one resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The patched text; `None` when the text is unchanged.
    pub text: Option<Text>,
    /// The resolved amendment first, then every changed sibling.
    pub amends: Vec<Amend>,
    /// Events to publish once the changes are stored.
    pub events: Vec<EventEnvelope>,
    pub report: ResolutionReport,
}

/// Resolves the acceptance of `primary` against `text`.
///
/// `siblings` may contain any amendments of the text; closed ones and
/// `primary` itself are ignored. Open siblings are re-evaluated in creation
/// order (ties broken by id) against the new body.
///
/// `potential_votes` is recorded on `primary` when the resolution concludes
/// a vote; direct resolutions pass `None`.
///
/// # Errors
///
/// - `AmendClosed` if `primary` is already closed
/// - `ValidationFailed` if `primary` belongs to another text
pub fn resolve_acceptance(
    engine: &PatchEngine,
    mut text: Text,
    mut primary: Amend,
    siblings: Vec<Amend>,
    now: Timestamp,
    potential_votes: Option<u32>,
) -> Result<Resolution, DomainError> {
    if primary.text_id() != text.id() {
        return Err(DomainError::validation(
            "text_id",
            "Amend does not belong to this text",
        ));
    }
    if primary.is_closed() {
        return Err(DomainError::new(
            ErrorCode::AmendClosed,
            format!("Amend is already {}", primary.status()),
        ));
    }

    let version_before = text.version();
    let applied = text
        .append_patch(engine, primary.patch().clone())
        .map(|_| ());

    if let Err(conflict) = applied {
        primary.conflict(now)?;
        if let Some(count) = potential_votes {
            primary.record_potential_votes(count);
        }
        let events = vec![AmendResult::of(&primary, false).to_envelope()];
        let report = ResolutionReport {
            amend_id: *primary.id(),
            text_id: *text.id(),
            outcome: ResolutionOutcome::Conflicted { conflict },
            text_version: version_before,
            closed_siblings: Vec::new(),
            rebased_siblings: Vec::new(),
        };
        return Ok(Resolution {
            text: None,
            amends: vec![primary],
            events,
            report,
        });
    }

    primary.accept(version_before, now)?;
    if let Some(count) = potential_votes {
        primary.record_potential_votes(count);
    }
    let new_version = text.version();

    let mut events = vec![
        TextPatched {
            event_id: EventId::new(),
            text_id: *text.id(),
            amend_id: *primary.id(),
            version: new_version,
            patched_at: now,
        }
        .to_envelope(),
        AmendResult::of(&primary, false).to_envelope(),
    ];

    let mut pending: Vec<Amend> = siblings
        .into_iter()
        .filter(|a| a.id() != primary.id() && a.text_id() == text.id() && !a.is_closed())
        .collect();
    pending.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));

    let mut closed_siblings = Vec::new();
    let mut rebased_siblings = Vec::new();
    for sibling in pending.iter_mut() {
        match engine.apply(text.body(), sibling.patch()) {
            Ok(_) => {
                let from_version = sibling.version();
                sibling.rebase(new_version)?;
                rebased_siblings.push(*sibling.id());
                events.push(
                    AmendRebased {
                        event_id: EventId::new(),
                        amend_id: *sibling.id(),
                        text_id: *text.id(),
                        from_version,
                        to_version: new_version,
                        rebased_at: now,
                    }
                    .to_envelope(),
                );
            }
            Err(conflict) => {
                sibling.conflict(now)?;
                sibling.record_potential_votes(text.followers_count());
                closed_siblings.push(SiblingClosure {
                    amend_id: *sibling.id(),
                    conflict,
                });
                events.push(AmendResult::of(sibling, true).to_envelope());
            }
        }
    }

    let report = ResolutionReport {
        amend_id: *primary.id(),
        text_id: *text.id(),
        outcome: ResolutionOutcome::Accepted {
            version: version_before,
        },
        text_version: new_version,
        closed_siblings,
        rebased_siblings,
    };

    let mut amends = Vec::with_capacity(pending.len() + 1);
    amends.push(primary);
    amends.extend(pending);

    Ok(Resolution {
        text: Some(text),
        amends,
        events,
        report,
    })
}
