//! Vibe Book read models
//!
//! The GM overview lists every PC→NPC vibe with its reverse direction and
//! connection level. The player view shows a single PC's side only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use npcvibes_domain::{CharacterRef, ConnectionLevel, VibeStatistics, VibeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeBookRow {
    pub pc_id: CharacterRef,
    pub pc_name: String,
    pub npc_id: CharacterRef,
    pub npc_name: String,
    pub pc_vibe: VibeType,
    /// NPC's vibe back toward the PC, if rolled
    pub npc_vibe: Option<VibeType>,
    pub connection: ConnectionLevel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmOverview {
    pub rows: Vec<VibeBookRow>,
    /// NPCs known to the registry
    pub npc_count: usize,
    /// Distribution of stored PC→NPC vibes
    pub statistics: VibeStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerVibeEntry {
    pub npc_id: CharacterRef,
    pub npc_name: String,
    pub vibe: VibeType,
    /// Display colour, `#rrggbb`
    pub color: String,
    pub connection: ConnectionLevel,
    pub connection_description: String,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub pc_id: CharacterRef,
    pub entries: Vec<PlayerVibeEntry>,
}
