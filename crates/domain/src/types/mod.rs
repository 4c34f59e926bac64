//! # NPC Vibes Domain Types
//!
//! Shared vocabulary types that form the innermost layer of the hexagonal architecture.
//! These types are used by both the domain layer and the shared wire layer, serving as
//! the stable contract between them.
//!
//! ## Design Principles
//!
//! 1. **Pure data types** - No I/O, no async, no side effects
//! 2. **Stable API** - Changes here affect both domain and wire messages
//! 3. **Serializable** - All types derive Serialize/Deserialize

// First-sight reaction
mod vibe;
pub use vibe::VibeType;

// PC / NPC role category
mod role;
pub use role::ActorRole;

// Staged social closeness
mod connection;
pub use connection::{ConnectionLevel, ProgressionRequirements};
