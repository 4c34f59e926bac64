//! Value objects - immutable, valid-by-construction domain values

mod pair_key;
mod progression;
mod settings;
mod vibe_roll;

pub use pair_key::PairKey;
pub use progression::{
    connection_advice, is_valid_transition, suggest_next_level, ProgressionThresholds,
};
pub use settings::{VibeSettings, MAX_SIGHT_RANGE, MIN_SIGHT_RANGE};
pub use vibe_roll::{flavor_text, RollValue, VibeRoll, VibeStatistics, VIBE_DIE_SIZE};
