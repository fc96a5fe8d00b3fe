//! Access-level vocabulary carried on `EpisodeOfCare.type[0].text`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// How much of a patient's record an episode of care exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// Full clinical history.
    FullAccess,
    /// Demographic profile plus a handful of the most recent visits.
    ProfileAndRecentVisitsAccess,
}

impl AccessLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::FullAccess => "FULL_ACCESS",
            AccessLevel::ProfileAndRecentVisitsAccess => "PROFILE_AND_RECENT_VISITS_ACCESS",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = CoreError;

    /// Matching is exact and case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_ACCESS" => Ok(AccessLevel::FullAccess),
            "PROFILE_AND_RECENT_VISITS_ACCESS" => Ok(AccessLevel::ProfileAndRecentVisitsAccess),
            other => Err(CoreError::unknown_access_level(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_markers() {
        assert_eq!(
            "FULL_ACCESS".parse::<AccessLevel>().unwrap(),
            AccessLevel::FullAccess
        );
        assert_eq!(
            "PROFILE_AND_RECENT_VISITS_ACCESS".parse::<AccessLevel>().unwrap(),
            AccessLevel::ProfileAndRecentVisitsAccess
        );
    }

    #[test]
    fn rejects_unknown_and_case_variants() {
        assert!("full_access".parse::<AccessLevel>().is_err());
        assert!(" FULL_ACCESS".parse::<AccessLevel>().is_err());
        assert!("".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn serializes_as_marker_text() {
        let json = serde_json::to_string(&AccessLevel::ProfileAndRecentVisitsAccess).unwrap();
        assert_eq!(json, "\"PROFILE_AND_RECENT_VISITS_ACCESS\"");
    }
}
