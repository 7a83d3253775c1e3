//! Identifiers for scheduled work
//!
//! Every countdown run and every pending quiz completion is tagged with a
//! fresh `Id`. Alarms carry the id they were scheduled under, so an alarm
//! whose id no longer matches the live one is stale and gets dropped.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

/// A unique identifier for one run of scheduled work
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an identifier from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}
