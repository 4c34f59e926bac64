//! NPC Vibes Engine library.
//!
//! First-sight relationship engine for a virtual tabletop: when a PC and an
//! NPC first see each other, each side rolls a d20 vibe that sticks for the
//! life of the world.
//!
//! ## Structure
//!
//! - `stores/` - Cached relationship ledger, session state and settings
//! - `use_cases/` - Sight, first-sight rolls, connections, management
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Host events, UI commands and socket messages
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::{App, AppPorts};
