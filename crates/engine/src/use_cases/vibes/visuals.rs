//! Vibe auras - show a PC's vibe on the NPC token it is about.
//!
//! The aura sits on the NPC token and is meant for the PC's owners. A process
//! only draws it when the local user is one of those owners or a GM.

use std::sync::Arc;

use npcvibes_domain::{ActorRole, CharacterRef, TokenId};

use crate::infrastructure::ports::{CanvasPort, PresentationPort, TokenSnapshot};
use crate::stores::{RelationshipStore, SettingsStore};

pub struct VisualEffects {
    canvas: Arc<dyn CanvasPort>,
    store: Arc<RelationshipStore>,
    settings: Arc<SettingsStore>,
    presenter: Arc<dyn PresentationPort>,
}

impl VisualEffects {
    pub fn new(
        canvas: Arc<dyn CanvasPort>,
        store: Arc<RelationshipStore>,
        settings: Arc<SettingsStore>,
        presenter: Arc<dyn PresentationPort>,
    ) -> Self {
        Self {
            canvas,
            store,
            settings,
            presenter,
        }
    }

    /// Draw the PC's vibe toward the NPC, if any. Returns whether an aura was shown.
    pub async fn update_pair(&self, pc_token: &TokenSnapshot, npc_token: &TokenSnapshot) -> bool {
        if !self.settings.current().await.enable_visual_indicators {
            return false;
        }
        let (Some(pc_actor), Some(npc_id)) = (pc_token.actor.as_ref(), npc_token.actor_ref()) else {
            return false;
        };

        let viewers = &pc_actor.owners;
        if !self.canvas.is_gm() && !viewers.contains(&self.canvas.current_user()) {
            return false;
        }

        let Some(record) = self
            .store
            .get_disposition(&pc_actor.actor_ref, npc_id, ActorRole::Pc)
            .await
        else {
            return false;
        };
        if !record.vibe.is_significant() {
            return false;
        }

        self.presenter
            .show_aura(&npc_token.id, record.vibe, viewers)
            .await;
        true
    }

    /// Update every token pair belonging to two characters.
    pub async fn update_characters(&self, pc_id: &CharacterRef, npc_id: &CharacterRef) -> usize {
        let npc_tokens = self.canvas.tokens_for_actor(npc_id);
        let mut shown = 0;
        for pc_token in self.canvas.tokens_for_actor(pc_id) {
            for npc_token in &npc_tokens {
                if self.update_pair(&pc_token, npc_token).await {
                    shown += 1;
                }
            }
        }
        shown
    }

    /// Redraw every aura on the canvas from the store.
    pub async fn refresh_all(&self) -> usize {
        self.presenter.clear_auras().await;

        let tokens = self.canvas.tokens();
        let (pcs, npcs): (Vec<_>, Vec<_>) = tokens
            .iter()
            .filter(|t| t.role().is_some())
            .partition(|t| t.role() == Some(ActorRole::Pc));

        let mut shown = 0;
        for pc_token in &pcs {
            for npc_token in &npcs {
                if self.update_pair(pc_token, npc_token).await {
                    shown += 1;
                }
            }
        }
        tracing::debug!(auras = shown, "Refreshed vibe auras");
        shown
    }

    pub async fn remove_token(&self, token_id: &TokenId) {
        self.presenter.remove_auras(token_id).await;
    }

    pub async fn clear(&self) {
        self.presenter.clear_auras().await;
    }
}
