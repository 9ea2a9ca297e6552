//! Amendment lifecycle status and vote values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Lifecycle status of an amendment.
///
/// ```text
/// Open ──► Accepted
///   ├───► Conflicted
///   └───► Refused
/// ```
///
/// Every status but `Open` is terminal: the amendment is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendStatus {
    #[default]
    Open,
    Accepted,
    Conflicted,
    Refused,
}

impl AmendStatus {
    pub fn is_closed(&self) -> bool {
        !matches!(self, AmendStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AmendStatus::Open => "open",
            AmendStatus::Accepted => "accepted",
            AmendStatus::Conflicted => "conflicted",
            AmendStatus::Refused => "refused",
        }
    }

    /// Moves to `target`. Only `Open` has outgoing transitions.
    pub fn transition_to(self, target: AmendStatus) -> Result<AmendStatus, DomainError> {
        if self == AmendStatus::Open && target.is_closed() {
            return Ok(target);
        }
        Err(DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot move amend from {} to {}", self, target),
        ))
    }
}

impl fmt::Display for AmendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(AmendStatus::Open),
            "accepted" => Ok(AmendStatus::Accepted),
            "conflicted" => Ok(AmendStatus::Conflicted),
            "refused" => Ok(AmendStatus::Refused),
            other => Err(format!("unknown amend status: {}", other)),
        }
    }
}

/// A participant's vote on an amendment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Up,
    Down,
    Indifferent,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
            Vote::Indifferent => "indifferent",
        }
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            "indifferent" => Ok(Vote::Indifferent),
            other => Err(format!("unknown vote: {}", other)),
        }
    }
}

/// Vote counts of an amendment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: u32,
    pub down: u32,
    pub indifferent: u32,
}

impl VoteTally {
    pub fn record(&mut self, vote: Vote) {
        match vote {
            Vote::Up => self.up += 1,
            Vote::Down => self.down += 1,
            Vote::Indifferent => self.indifferent += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.up + self.down + self.indifferent
    }

    /// Strict majority of up votes over down votes; indifference does not count.
    pub fn is_approved(&self) -> bool {
        self.up > self.down
    }
}

impl<'a> FromIterator<&'a Vote> for VoteTally {
    fn from_iter<I: IntoIterator<Item = &'a Vote>>(iter: I) -> Self {
        let mut tally = VoteTally::default();
        for vote in iter {
            tally.record(*vote);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AmendStatus; 4] = [
        AmendStatus::Open,
        AmendStatus::Accepted,
        AmendStatus::Conflicted,
        AmendStatus::Refused,
    ];

    #[test]
    fn only_open_is_not_closed() {
        for status in ALL {
            assert_eq!(status.is_closed(), status != AmendStatus::Open);
        }
    }

    #[test]
    fn closed_statuses_have_no_way_out() {
        for status in ALL.into_iter().filter(AmendStatus::is_closed) {
            for target in ALL {
                let err = status.transition_to(target).unwrap_err();
                assert_eq!(err.code, ErrorCode::InvalidStateTransition);
            }
        }
    }

    #[test]
    fn open_reaches_every_closed_status() {
        for target in ALL.into_iter().filter(AmendStatus::is_closed) {
            assert_eq!(AmendStatus::Open.transition_to(target).unwrap(), target);
        }
        assert!(AmendStatus::Open.transition_to(AmendStatus::Open).is_err());
    }

    #[test]
    fn status_parses_its_own_string_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<AmendStatus>(), Ok(status));
        }
        assert!("closed".parse::<AmendStatus>().is_err());
    }

    #[test]
    fn vote_parses_its_own_string_form() {
        for vote in [Vote::Up, Vote::Down, Vote::Indifferent] {
            assert_eq!(vote.as_str().parse::<Vote>(), Ok(vote));
        }
    }

    #[test]
    fn tally_ignores_indifference_for_approval() {
        let tally: VoteTally = [Vote::Up, Vote::Indifferent, Vote::Indifferent, Vote::Down]
            .iter()
            .collect();
        assert_eq!(tally.total(), 4);
        assert!(!tally.is_approved());

        let tally: VoteTally = [Vote::Up, Vote::Indifferent].iter().collect();
        assert!(tally.is_approved());
    }
}
