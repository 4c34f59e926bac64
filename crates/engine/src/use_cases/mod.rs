//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across stores and ports to fulfill user stories.

pub mod connection;
pub mod management;
mod names;
pub mod sight;
pub mod vibe_book;
pub mod vibes;

// Re-export main types
pub use connection::ConnectionUseCases;
pub use management::ManagementUseCases;
pub use sight::SightUseCases;
pub use vibe_book::VibeBook;
pub use vibes::VibeUseCases;
