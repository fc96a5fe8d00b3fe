//! Patient link record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// An opaque, expiring reference to a patient.
///
/// Links are never updated after issue except for the `deleted` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientLink {
    pub id: Uuid,

    /// Durable patient identifier. Never exposed to link holders.
    pub patient_id: String,

    /// Public token, 256 random bits in unpadded base64url.
    pub opaque_id: String,

    #[serde(with = "time::serde::rfc3339")]
    pub expires: OffsetDateTime,

    #[serde(default)]
    pub deleted: bool,
}

impl PatientLink {
    /// Whether the link may be resolved at `now`. A link is still live at
    /// the exact instant it expires.
    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        !self.deleted && self.expires >= now
    }
}
