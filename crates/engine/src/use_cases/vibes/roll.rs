//! Vibe roller - one d20 per direction from the injected random source.

use std::sync::Arc;

use npcvibes_domain::VibeRoll;

use crate::infrastructure::ports::RandomPort;

pub struct VibeRoller {
    random: Arc<dyn RandomPort>,
}

impl VibeRoller {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    /// Roll how `source_name` feels about `target_name`.
    pub fn roll(&self, source_name: &str, target_name: &str) -> VibeRoll {
        VibeRoll::roll_with(
            |min, max| {
                let face = self
                    .random
                    .gen_range(i32::from(min), i32::from(max))
                    .clamp(i32::from(min), i32::from(max));
                u8::try_from(face).unwrap_or(min)
            },
            source_name,
            target_name,
        )
    }
}
