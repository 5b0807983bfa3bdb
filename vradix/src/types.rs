//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`UserId`]: User account identifier
//! - [`AnalysisId`]: Etymology analysis identifier
//! - [`WordOriginId`]: Canonical word record identifier
//! - [`CorrectionId`], [`BookmarkId`], [`ChallengeId`]
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

pub type UserId = Uuid;
pub type AnalysisId = Uuid;
pub type WordOriginId = Uuid;
pub type CorrectionId = Uuid;
pub type BookmarkId = Uuid;
pub type ChallengeId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
