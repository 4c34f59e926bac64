//! Vibe Book use cases - read models for the GM overview and player journals.

use std::sync::Arc;

use npcvibes_domain::{connection_advice, ActorRole, CharacterRef, VibeStatistics};
use npcvibes_shared::{GmOverview, PlayerVibeEntry, PlayerView, VibeBookRow};

use crate::infrastructure::ports::CanvasPort;
use crate::stores::RelationshipStore;
use crate::use_cases::names::character_name;

pub struct VibeBook {
    store: Arc<RelationshipStore>,
    canvas: Arc<dyn CanvasPort>,
}

impl VibeBook {
    pub fn new(store: Arc<RelationshipStore>, canvas: Arc<dyn CanvasPort>) -> Self {
        Self { store, canvas }
    }

    /// Every PC→NPC vibe, with the NPC's vibe back and the connection level.
    pub async fn gm_overview(&self) -> GmOverview {
        let canvas = self.canvas.as_ref();
        self.store
            .read(|ledger| {
                let mut statistics = VibeStatistics::default();
                let mut rows = Vec::new();
                for (pc_id, vibes) in ledger.pc_dispositions() {
                    let pc_name = character_name(canvas, ledger, pc_id);
                    for (npc_id, record) in vibes {
                        statistics.record(record.vibe);
                        rows.push(VibeBookRow {
                            pc_id: pc_id.clone(),
                            pc_name: pc_name.clone(),
                            npc_id: npc_id.clone(),
                            npc_name: character_name(canvas, ledger, npc_id),
                            pc_vibe: record.vibe,
                            npc_vibe: ledger
                                .vibe(npc_id, pc_id, ActorRole::Npc)
                                .map(|r| r.vibe),
                            connection: ledger.connection_level(pc_id, npc_id),
                            created_at: record.created_at,
                        });
                    }
                }
                GmOverview {
                    rows,
                    npc_count: ledger.npc_registry().len(),
                    statistics,
                }
            })
            .await
    }

    /// One PC's vibes and connections, with roleplay advice.
    pub async fn player_view(&self, pc_id: &CharacterRef) -> PlayerView {
        let canvas = self.canvas.as_ref();
        let entries = self
            .store
            .read(|ledger| {
                ledger
                    .pc_vibes(pc_id)
                    .map(|(npc_id, record)| {
                        let connection = ledger.connection_level(pc_id, npc_id);
                        PlayerVibeEntry {
                            npc_id: npc_id.clone(),
                            npc_name: character_name(canvas, ledger, npc_id),
                            vibe: record.vibe,
                            color: record.vibe.color().to_string(),
                            connection,
                            connection_description: connection.description().to_string(),
                            advice: connection_advice(record.vibe, connection),
                        }
                    })
                    .collect()
            })
            .await;
        PlayerView {
            pc_id: pc_id.clone(),
            entries,
        }
    }
}
