//! Socket messages from other processes.
//!
//! The GM process is the only one that rolls and persists. Everyone else
//! mirrors what it announces into their local cache and redraws.

use npcvibes_domain::ActorRole;
use npcvibes_shared::SocketMessage;

use crate::app::App;

pub async fn handle_socket_message(app: &App, message: SocketMessage) {
    let store = &app.stores.relationships;
    let visuals = &app.use_cases.vibes.visuals;

    tracing::debug!(kind = message.kind(), "Received socket message");

    match message {
        SocketMessage::DispositionRolled {
            pc_id,
            npc_id,
            outcomes,
        } => {
            let pc_to_npc = outcomes.pc_to_npc.map(|r| r.vibe);
            let npc_to_pc = outcomes.npc_to_pc.map(|r| r.vibe);
            let (pc, npc) = (pc_id.clone(), npc_id.clone());
            store
                .mirror(move |ledger, now| {
                    if let Some(vibe) = pc_to_npc {
                        if !ledger.has_vibe(&pc, &npc, ActorRole::Pc) {
                            ledger.record_vibe(pc.clone(), npc.clone(), ActorRole::Pc, vibe, now);
                        }
                    }
                    if let Some(vibe) = npc_to_pc {
                        if !ledger.has_vibe(&npc, &pc, ActorRole::Npc) {
                            ledger.record_vibe(npc, pc, ActorRole::Npc, vibe, now);
                        }
                    }
                })
                .await;
            visuals.update_characters(&pc_id, &npc_id).await;
        }

        SocketMessage::DispositionChanged => {
            // Import and reset are persisted before they are announced.
            if let Err(e) = store.load().await {
                tracing::warn!(error = %e, "Failed to reload vibe data after remote change");
            }
            app.stores.processed.clear();
            app.use_cases.sight.oracle.clear().await;
            visuals.refresh_all().await;
        }

        SocketMessage::ConnectionChanged {
            pc_id,
            npc_id,
            level,
            actor_id,
        } => {
            tracing::info!(
                pc_id = %pc_id,
                npc_id = %npc_id,
                level = %level,
                actor_id = %actor_id,
                "Connection level changed remotely"
            );
            let (pc, npc) = (pc_id.clone(), npc_id.clone());
            store
                .mirror(move |ledger, now| ledger.set_connection(pc, npc, level, now))
                .await;
            visuals.update_characters(&pc_id, &npc_id).await;
        }

        SocketMessage::Unknown => {
            tracing::debug!("Ignoring unknown socket message");
        }
    }
}
