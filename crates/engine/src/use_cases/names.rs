//! Display names for characters that may not be on the scene.

use npcvibes_domain::{CharacterRef, VibeLedger};

use crate::infrastructure::ports::CanvasPort;

/// Token name on the active scene, then the NPC registry, then the raw id.
pub(crate) fn character_name(canvas: &dyn CanvasPort, ledger: &VibeLedger, id: &CharacterRef) -> String {
    if let Some(token) = canvas.tokens_for_actor(id).first() {
        return token.display_name().to_string();
    }
    ledger
        .npc_registry()
        .get(id)
        .map(|entry| entry.display_name.clone())
        .unwrap_or_else(|| id.to_string())
}
