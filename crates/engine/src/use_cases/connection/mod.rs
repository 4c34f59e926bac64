//! Connection use cases - GM-set levels and interaction-driven suggestions.

mod set_level;
mod track_interaction;

pub use set_level::{ConnectionChange, SetConnectionLevel};
pub use track_interaction::{InteractionSummary, TrackInteraction};

use std::sync::Arc;

use npcvibes_domain::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Domain(#[from] DomainError),
}

/// Container for connection use cases.
pub struct ConnectionUseCases {
    pub set_level: Arc<SetConnectionLevel>,
    pub track_interaction: Arc<TrackInteraction>,
}

impl ConnectionUseCases {
    pub fn new(set_level: Arc<SetConnectionLevel>, track_interaction: Arc<TrackInteraction>) -> Self {
        Self {
            set_level,
            track_interaction,
        }
    }
}
