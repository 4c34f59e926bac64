//! In-memory state storage modules.
//!
//! - `RelationshipStore` - cached vibe ledger with coalesced persistence
//! - `ProcessedPairs` - session set of pairs already through first sight
//! - `SettingsStore` - cached world settings

pub mod processed_pairs;
pub mod relationships;
pub mod settings;

pub use processed_pairs::ProcessedPairs;
pub use relationships::{RelationshipStore, StoreError, LEDGER_KEY};
pub use settings::{SettingsStore, SETTINGS_KEY};
