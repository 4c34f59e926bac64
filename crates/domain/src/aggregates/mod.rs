//! Aggregate roots - domain objects that own their related data
//!
//! # Rustic DDD Principles
//!
//! | Java DDD Pattern | Rustic Equivalent |
//! |------------------|-------------------|
//! | Private fields + getters | Private fields + borrowing accessors |
//! | Aggregate root guards | Ownership (borrow checker enforces) |
//! | Repository per entity | One JSON document per world |
//!
//! The vibe ledger is the only aggregate: every vibe, connection, registry
//! entry and interaction log of a world lives inside it.

pub mod vibe_ledger;

pub use vibe_ledger::{
    CleanupReport, ConnectionMap, LedgerMetadata, VibeLedger, VibeMap, LEDGER_VERSION,
    REQUIRED_SNAPSHOT_KEYS,
};
