//! NPC Vibes Shared - wire types exchanged between connected processes
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json, chrono and the domain vocabulary
//! 2. **No business logic** - pure data types and serialization
//! 3. **Forward compatible** - unknown tags deserialize to `Unknown`

pub mod messages;
pub mod requests;
pub mod responses;
pub mod vibe_book;

pub use messages::{RollOutcomes, SocketMessage, SOCKET_CHANNEL};
pub use requests::UiCommand;
pub use responses::{ErrorCode, ResponseResult};
pub use vibe_book::{GmOverview, PlayerView, PlayerVibeEntry, VibeBookRow};
