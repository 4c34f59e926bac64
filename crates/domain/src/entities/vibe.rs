//! Directed vibe records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CharacterRef;
use crate::types::{ActorRole, VibeType};

/// Stored vibe for one direction of a pair. Written once, never re-rolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeRecord {
    #[serde(rename = "dispositionType")]
    pub vibe: VibeType,
    pub created_at: DateTime<Utc>,
}

impl VibeRecord {
    pub fn new(vibe: VibeType, created_at: DateTime<Utc>) -> Self {
        Self { vibe, created_at }
    }
}

/// A vibe record together with its direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectedVibe {
    pub source_id: CharacterRef,
    pub target_id: CharacterRef,
    pub source_role: ActorRole,
    #[serde(rename = "dispositionType")]
    pub vibe: VibeType,
    pub created_at: DateTime<Utc>,
}

impl DirectedVibe {
    pub fn from_record(
        source_id: CharacterRef,
        target_id: CharacterRef,
        source_role: ActorRole,
        record: &VibeRecord,
    ) -> Self {
        Self {
            source_id,
            target_id,
            source_role,
            vibe: record.vibe,
            created_at: record.created_at,
        }
    }
}
