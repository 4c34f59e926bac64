//! Entity records stored inside the vibe ledger

mod connection;
mod interaction;
mod npc_registry;
mod vibe;

pub use connection::ConnectionRecord;
pub use interaction::InteractionEntry;
pub use npc_registry::NpcRegistryEntry;
pub use vibe::{DirectedVibe, VibeRecord};
