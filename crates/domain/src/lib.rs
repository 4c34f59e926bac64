//! # NPC Vibes Domain
//!
//! Pure relationship rules: first-sight vibes, connection levels, the
//! per-world ledger and its snapshot format. No I/O, no async, no randomness
//! (dice are injected by the engine).

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod types;
pub mod value_objects;

pub use aggregates::{
    CleanupReport, ConnectionMap, LedgerMetadata, VibeLedger, VibeMap, LEDGER_VERSION,
    REQUIRED_SNAPSHOT_KEYS,
};
pub use entities::{ConnectionRecord, DirectedVibe, InteractionEntry, NpcRegistryEntry, VibeRecord};
pub use error::DomainError;
pub use ids::{CharacterRef, SceneId, TokenId, UserId};
pub use types::{ActorRole, ConnectionLevel, ProgressionRequirements, VibeType};
pub use value_objects::{
    connection_advice, flavor_text, is_valid_transition, suggest_next_level, PairKey,
    ProgressionThresholds, RollValue, VibeRoll, VibeSettings, VibeStatistics, MAX_SIGHT_RANGE,
    MIN_SIGHT_RANGE, VIBE_DIE_SIZE,
};
