//! Vibe use cases - first-sight rolls and the auras that show them.

mod debug_log;
mod first_sight;
mod roll;
mod visuals;

pub use debug_log::{DebugInfo, SightCheck, SightDebugLog};
pub use first_sight::{participant_role, FirstSight, FirstSightOutcome, SkipReason};
pub use roll::VibeRoller;
pub use visuals::VisualEffects;

use std::sync::Arc;

/// Container for vibe use cases.
pub struct VibeUseCases {
    pub roller: Arc<VibeRoller>,
    pub first_sight: Arc<FirstSight>,
    pub visuals: Arc<VisualEffects>,
}

impl VibeUseCases {
    pub fn new(
        roller: Arc<VibeRoller>,
        first_sight: Arc<FirstSight>,
        visuals: Arc<VisualEffects>,
    ) -> Self {
        Self {
            roller,
            first_sight,
            visuals,
        }
    }
}
