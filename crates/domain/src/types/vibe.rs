//! Vibe type - the first-sight emotional reaction one character holds toward another
//!
//! A vibe is rolled once per direction and never changes afterwards. It is
//! SEPARATE from ConnectionLevel (slow-moving social closeness).

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotional reaction produced by a first-sight roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VibeType {
    /// No particular reaction (rolls 2-17)
    #[default]
    None,
    /// Immediate dislike (natural 1)
    Repulsed,
    /// Intrigued (18 or 19)
    Curious,
    /// Deeply impressed (natural 20)
    Awestruck,
}

impl VibeType {
    /// Get all vibe types in display order
    pub fn all() -> &'static [VibeType] {
        &[
            VibeType::None,
            VibeType::Repulsed,
            VibeType::Curious,
            VibeType::Awestruck,
        ]
    }

    /// Get a display name for the vibe
    pub fn display_name(&self) -> &'static str {
        match self {
            VibeType::None => "None",
            VibeType::Repulsed => "Repulsed",
            VibeType::Curious => "Curious",
            VibeType::Awestruck => "Awestruck",
        }
    }

    /// Aura/chat colour as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            VibeType::Repulsed => "#ff4444",
            VibeType::Curious => "#ffdd44",
            VibeType::Awestruck => "#44ff44",
            VibeType::None => "#ffffff",
        }
    }

    /// Whether the vibe should trigger notifications and auras
    pub fn is_significant(&self) -> bool {
        !matches!(self, VibeType::None)
    }
}

impl fmt::Display for VibeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for VibeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(VibeType::None),
            "repulsed" => Ok(VibeType::Repulsed),
            "curious" => Ok(VibeType::Curious),
            "awestruck" => Ok(VibeType::Awestruck),
            other => Err(DomainError::parse(format!("Unknown vibe type: {}", other))),
        }
    }
}
