//! Commands the UI layer can issue against the engine

use serde::{Deserialize, Serialize};

use npcvibes_domain::{CharacterRef, ConnectionLevel, VibeSettings};

/// A UI command, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UiCommand {
    /// Clear session state and re-evaluate every PC/NPC token pair
    ForceRecheck,
    /// Export the full ledger as JSON
    ExportSnapshot,
    /// Replace the ledger with a previously exported snapshot
    ImportSnapshot { json: String },
    /// Wipe all relationship state (GM only)
    ResetAll,
    #[serde(rename_all = "camelCase")]
    SetConnectionLevel {
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        level: ConnectionLevel,
    },
    #[serde(rename_all = "camelCase")]
    TrackInteraction {
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        interaction_type: String,
        #[serde(default)]
        description: String,
    },
    /// Forget which pairs were already processed this session
    ClearProcessedPairs,
    /// Drop ledger entries for characters that no longer exist
    CleanupOrphans,
    /// GM overview of every vibe
    GetVibeBook,
    #[serde(rename_all = "camelCase")]
    GetPlayerView { pc_id: CharacterRef },
    /// First-sight debug log with roll statistics
    GetDebugInfo,
    ClearDebugLog,
    GetSettings,
    /// Replace the world settings (GM only)
    UpdateSettings { settings: VibeSettings },
    /// Unknown command for forward compatibility
    #[serde(other)]
    Unknown,
}

impl UiCommand {
    /// Whether the command needs GM privilege
    pub fn requires_gm(&self) -> bool {
        matches!(
            self,
            UiCommand::ResetAll
                | UiCommand::ImportSnapshot { .. }
                | UiCommand::SetConnectionLevel { .. }
                | UiCommand::CleanupOrphans
                | UiCommand::GetVibeBook
                | UiCommand::UpdateSettings { .. }
        )
    }
}
