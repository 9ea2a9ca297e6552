//! UTC points in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A moment recorded by the domain: creation, vote closing, event time.
///
/// Serializes as an RFC 3339 string and orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps a value read back from storage.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Shifts by whole seconds; used to build ordered fixtures.
    #[cfg(test)]
    pub(crate) fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + chrono::Duration::seconds(secs))
    }
}
