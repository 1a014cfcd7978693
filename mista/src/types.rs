//! Common type definitions.
//!
//! Type aliases for entity IDs (UserId, ProviderId, etc.) plus small
//! utilities shared across the crate.

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type ProviderId = Uuid;
pub type SolutionId = Uuid;
pub type ContactRequestId = Uuid;
pub type ApplicationId = Uuid;
pub type TokenId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
