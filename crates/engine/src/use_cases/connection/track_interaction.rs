//! Track interaction use case.
//!
//! Logging an interaction never changes the connection. When the count
//! crosses a threshold for the PC's vibe, the GM gets a suggestion and decides.

use std::sync::Arc;

use serde::Serialize;

use npcvibes_domain::{
    suggest_next_level, ActorRole, CharacterRef, ConnectionLevel, InteractionEntry, PairKey,
    VibeType,
};

use crate::infrastructure::ports::{CanvasPort, ClockPort, MessagingPort, Notification};
use crate::stores::{RelationshipStore, SettingsStore};
use crate::use_cases::names::character_name;

use super::ConnectionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSummary {
    pub interaction_count: usize,
    pub current: ConnectionLevel,
    /// Set when the interaction count suggests the next level
    pub suggested: Option<ConnectionLevel>,
}

pub struct TrackInteraction {
    store: Arc<RelationshipStore>,
    settings: Arc<SettingsStore>,
    canvas: Arc<dyn CanvasPort>,
    messaging: Arc<dyn MessagingPort>,
    clock: Arc<dyn ClockPort>,
}

impl TrackInteraction {
    pub fn new(
        store: Arc<RelationshipStore>,
        settings: Arc<SettingsStore>,
        canvas: Arc<dyn CanvasPort>,
        messaging: Arc<dyn MessagingPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            settings,
            canvas,
            messaging,
            clock,
        }
    }

    pub async fn execute(
        &self,
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        interaction_type: &str,
        description: &str,
    ) -> Result<InteractionSummary, ConnectionError> {
        let interaction_type = interaction_type.trim();
        if interaction_type.is_empty() {
            return Err(ConnectionError::InvalidInput(
                "interaction type cannot be empty".to_string(),
            ));
        }

        let pair = PairKey::new(pc_id.clone(), npc_id.clone());
        let entry = InteractionEntry::new(interaction_type, description, self.clock.now());
        let interaction_count = self.store.append_interaction(&pair, entry).await;

        let vibe = self
            .store
            .get_disposition(&pc_id, &npc_id, ActorRole::Pc)
            .await
            .map(|record| record.vibe)
            .unwrap_or(VibeType::None);
        let current = self.store.get_connection(&pc_id, &npc_id).await;
        let suggested = Some(suggest_next_level(vibe, interaction_count, current))
            .filter(|level| *level != current);

        tracing::debug!(
            pair = %pair,
            interaction_type,
            interaction_count,
            suggested = ?suggested,
            "Interaction tracked"
        );

        if let Some(suggested) = suggested {
            if self.settings.current().await.enable_notifications {
                let (pc_name, npc_name) = self
                    .store
                    .read(|ledger| {
                        (
                            character_name(self.canvas.as_ref(), ledger, &pc_id),
                            character_name(self.canvas.as_ref(), ledger, &npc_id),
                        )
                    })
                    .await;
                let notification = Notification::ConnectionSuggestion {
                    pc_name,
                    npc_name,
                    current,
                    suggested,
                    interaction_count,
                    vibe,
                };
                let gm_ids = self.canvas.active_gm_ids();
                if let Err(e) = self.messaging.whisper(&gm_ids, &notification).await {
                    tracing::warn!(error = %e, "Failed to deliver connection suggestion");
                }
            }
        }

        Ok(InteractionSummary {
            interaction_count,
            current,
            suggested,
        })
    }
}
