//! World settings value object
//!
//! # Architectural Note (Settings Serialization)
//!
//! VibeSettings intentionally includes serde derives because:
//! 1. Settings are stored in the world settings store as a JSON document
//! 2. The JSON field names are the ones the host's settings menu registers
//!
//! Missing fields fall back to their defaults so older documents keep loading.

use serde::{Deserialize, Serialize};

pub const MIN_SIGHT_RANGE: f64 = 30.0;
pub const MAX_SIGHT_RANGE: f64 = 1000.0;

/// All configurable world settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VibeSettings {
    // ============================================================================
    // Output gates
    // ============================================================================
    /// Whether any aura update is produced
    pub enable_visual_indicators: bool,
    /// Whether chat whispers are requested
    pub enable_notifications: bool,

    // ============================================================================
    // Vision
    // ============================================================================
    /// Fallback sight radius in scene distance units
    pub default_sight_range: f64,
    /// Treat every wall as transparent
    pub ignore_walls: bool,
    /// NPC observers skip the vision-enabled check
    pub npc_vision_exempt: bool,
    /// Only humanoid actors take part in first sight
    pub humanoid_only: bool,

    // ============================================================================
    // Presentation
    // ============================================================================
    /// Aura opacity, percent
    pub aura_opacity: u8,
    /// Aura size multiplier relative to the token
    pub aura_size: f64,

    // ============================================================================
    // Timing
    // ============================================================================
    /// How long a line-of-sight answer is reused
    pub sight_cache_ttl_ms: u64,
    /// Quiet period before buffered ledger writes are flushed
    pub save_debounce_ms: u64,
}

impl Default for VibeSettings {
    fn default() -> Self {
        Self {
            enable_visual_indicators: true,
            enable_notifications: true,
            default_sight_range: 300.0,
            ignore_walls: false,
            npc_vision_exempt: true,
            humanoid_only: true,
            aura_opacity: 70,
            aura_size: 1.5,
            sight_cache_ttl_ms: 1_000,
            save_debounce_ms: 1_000,
        }
    }
}

impl VibeSettings {
    /// Clamp ranged options into the bounds the settings menu allows.
    pub fn normalized(mut self) -> Self {
        if !self.default_sight_range.is_finite() {
            self.default_sight_range = Self::default().default_sight_range;
        }
        self.default_sight_range = self
            .default_sight_range
            .clamp(MIN_SIGHT_RANGE, MAX_SIGHT_RANGE);
        self.aura_opacity = self.aura_opacity.min(100);
        if !self.aura_size.is_finite() {
            self.aura_size = Self::default().aura_size;
        }
        self.aura_size = self.aura_size.clamp(0.5, 3.0);
        self
    }

    /// Aura opacity as a 0.0-1.0 alpha value
    pub fn aura_alpha(&self) -> f32 {
        f32::from(self.aura_opacity.min(100)) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: VibeSettings =
            serde_json::from_str(r#"{"ignoreWalls": true}"#).expect("deserialize");
        assert!(settings.ignore_walls);
        assert!(settings.enable_notifications);
        assert_eq!(settings.default_sight_range, 300.0);
    }

    #[test]
    fn test_normalized_clamps_ranges() {
        let settings = VibeSettings {
            default_sight_range: 5.0,
            aura_opacity: 250,
            aura_size: 9.0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(settings.default_sight_range, MIN_SIGHT_RANGE);
        assert_eq!(settings.aura_opacity, 100);
        assert_eq!(settings.aura_size, 3.0);
    }

    #[test]
    fn test_aura_alpha() {
        assert!((VibeSettings::default().aura_alpha() - 0.7).abs() < f32::EPSILON);
    }
}
