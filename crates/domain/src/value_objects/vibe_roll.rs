//! Vibe roll value objects
//!
//! A single d20 decides a vibe. The mapping is fixed:
//! 1 → Repulsed, 18-19 → Curious, 20 → Awestruck, everything else → None.
//! Randomness is injected by the caller so the domain stays deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::types::VibeType;

/// Number of faces on the vibe die
pub const VIBE_DIE_SIZE: u8 = 20;

/// A natural d20 result, valid by construction (1..=20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RollValue(u8);

impl RollValue {
    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (1..=VIBE_DIE_SIZE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!(
                "vibe roll must be between 1 and {}, got {}",
                VIBE_DIE_SIZE, value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The vibe this face of the die produces
    pub fn vibe(&self) -> VibeType {
        match self.0 {
            1 => VibeType::Repulsed,
            18 | 19 => VibeType::Curious,
            20 => VibeType::Awestruck,
            _ => VibeType::None,
        }
    }
}

impl TryFrom<u8> for RollValue {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RollValue> for u8 {
    fn from(value: RollValue) -> Self {
        value.0
    }
}

impl fmt::Display for RollValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one directed first-sight roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeRoll {
    pub roll: RollValue,
    pub vibe: VibeType,
    pub flavor_text: String,
}

impl VibeRoll {
    /// Build a roll outcome from a die face and the two display names.
    pub fn new(roll: RollValue, source_name: &str, target_name: &str) -> Self {
        let vibe = roll.vibe();
        Self {
            roll,
            vibe,
            flavor_text: flavor_text(source_name, target_name, vibe, roll),
        }
    }

    /// Roll using an injected die. `die` receives the inclusive bounds.
    ///
    /// An out-of-range face from a misbehaving source is clamped onto the die.
    pub fn roll_with(
        die: impl FnOnce(u8, u8) -> u8,
        source_name: &str,
        target_name: &str,
    ) -> Self {
        let face = die(1, VIBE_DIE_SIZE).clamp(1, VIBE_DIE_SIZE);
        Self::new(RollValue(face), source_name, target_name)
    }

    pub fn has_vibe(&self) -> bool {
        self.vibe.is_significant()
    }
}

/// Presentation text for a roll. Deterministic in its inputs.
pub fn flavor_text(source_name: &str, target_name: &str, vibe: VibeType, roll: RollValue) -> String {
    match vibe {
        VibeType::Repulsed => format!(
            "{source_name} feels an immediate sense of repulsion towards {target_name}. Something about them just rubs the wrong way. (Rolled {roll})"
        ),
        VibeType::Curious => format!(
            "{source_name} finds themselves intrigued by {target_name}. There's something compelling about them that draws attention. (Rolled {roll})"
        ),
        VibeType::Awestruck => format!(
            "{source_name} is struck with awe upon seeing {target_name}. Their presence is truly impressive and inspiring. (Rolled {roll})"
        ),
        VibeType::None => format!(
            "{source_name} notices {target_name} but feels no particular emotional reaction. (Rolled {roll})"
        ),
    }
}

/// Tally of vibe outcomes over a set of rolls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeStatistics {
    pub total: u64,
    pub repulsed: u64,
    pub curious: u64,
    pub awestruck: u64,
    pub none: u64,
}

impl VibeStatistics {
    pub fn record(&mut self, vibe: VibeType) {
        self.total += 1;
        match vibe {
            VibeType::Repulsed => self.repulsed += 1,
            VibeType::Curious => self.curious += 1,
            VibeType::Awestruck => self.awestruck += 1,
            VibeType::None => self.none += 1,
        }
    }

    pub fn from_rolls<I: IntoIterator<Item = RollValue>>(rolls: I) -> Self {
        let mut stats = Self::default();
        for roll in rolls {
            stats.record(roll.vibe());
        }
        stats
    }

    pub fn count(&self, vibe: VibeType) -> u64 {
        match vibe {
            VibeType::Repulsed => self.repulsed,
            VibeType::Curious => self.curious,
            VibeType::Awestruck => self.awestruck,
            VibeType::None => self.none,
        }
    }

    /// Share of rolls (0.0-1.0) that produced `vibe`
    pub fn frequency(&self, vibe: VibeType) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(vibe) as f64 / self.total as f64
    }

    /// Number of non-None outcomes
    pub fn significant(&self) -> u64 {
        self.repulsed + self.curious + self.awestruck
    }
}
