//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - World settings storage (could swap SQLite -> host settings API)
//! - The host scene (tokens, walls, users)
//! - Chat whispers, cross-process broadcast and visuals
//! - Clock/Random (for testing)

mod error;
mod external;
mod host;
mod repos;
mod testing;

pub use error::{HostError, RepoError, TransportError};
pub use external::{BroadcastPort, MessagingPort, Notification, PresentationPort};
pub use host::{ActorSnapshot, CanvasPort, Point, TokenSnapshot, HUMANOID_TRAIT};
pub use repos::SettingsRepo;
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockBroadcastPort, MockMessagingPort, MockPresentationPort};
#[cfg(test)]
pub use host::MockCanvasPort;
#[cfg(test)]
pub use repos::MockSettingsRepo;
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
