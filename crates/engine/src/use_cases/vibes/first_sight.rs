//! First sight - roll vibes the first time a PC and an NPC see each other.
//!
//! The session processed set stops repeated rolls within one session. The
//! existence check against the store stops them across sessions. Only the
//! GM process broadcasts new rolls; peers just redraw.

use std::sync::Arc;

use npcvibes_domain::{ActorRole, PairKey, UserId, VibeRoll, VibeSettings};
use npcvibes_shared::{RollOutcomes, SocketMessage};

use crate::infrastructure::ports::{
    BroadcastPort, CanvasPort, ClockPort, MessagingPort, Notification, TokenSnapshot,
};
use crate::stores::{ProcessedPairs, RelationshipStore, SettingsStore};
use crate::use_cases::sight::VisibilityOracle;

use super::debug_log::{DebugInfo, SightCheck, SightDebugLog};
use super::roll::VibeRoller;
use super::visuals::VisualEffects;

/// Why a visibility event produced no rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A token had no actor or the wrong role
    Unresolved,
    NotVisible,
    AlreadyProcessed,
    /// Both directions already had a vibe; only visuals were refreshed
    AlreadyRolled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstSightOutcome {
    Skipped(SkipReason),
    Rolled(RollOutcomes),
}

impl FirstSightOutcome {
    pub fn rolls(&self) -> usize {
        match self {
            FirstSightOutcome::Rolled(outcomes) => outcomes.len(),
            FirstSightOutcome::Skipped(_) => 0,
        }
    }
}

/// The role a token plays in first sight, if it takes part at all.
///
/// Tokens need an actor of PC or NPC type, the humanoid trait when the world
/// restricts to humanoids, and hidden tokens only count for a GM.
pub fn participant_role(token: &TokenSnapshot, settings: &VibeSettings, is_gm: bool) -> Option<ActorRole> {
    let actor = token.actor.as_ref()?;
    let role = actor.role()?;
    if token.hidden && !is_gm {
        return None;
    }
    if settings.humanoid_only && !actor.is_humanoid() {
        return None;
    }
    Some(role)
}

pub struct FirstSight {
    canvas: Arc<dyn CanvasPort>,
    oracle: Arc<VisibilityOracle>,
    roller: Arc<VibeRoller>,
    store: Arc<RelationshipStore>,
    processed: Arc<ProcessedPairs>,
    settings: Arc<SettingsStore>,
    visuals: Arc<VisualEffects>,
    messaging: Arc<dyn MessagingPort>,
    broadcast: Arc<dyn BroadcastPort>,
    clock: Arc<dyn ClockPort>,
    debug_log: SightDebugLog,
}

impl FirstSight {
    pub fn new(
        canvas: Arc<dyn CanvasPort>,
        oracle: Arc<VisibilityOracle>,
        roller: Arc<VibeRoller>,
        store: Arc<RelationshipStore>,
        processed: Arc<ProcessedPairs>,
        settings: Arc<SettingsStore>,
        visuals: Arc<VisualEffects>,
        messaging: Arc<dyn MessagingPort>,
        broadcast: Arc<dyn BroadcastPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            canvas,
            oracle,
            roller,
            store,
            processed,
            settings,
            visuals,
            messaging,
            broadcast,
            clock,
            debug_log: SightDebugLog::new(),
        }
    }

    /// Handle a PC token and an NPC token that may have just seen each other.
    pub async fn on_visibility_event(
        &self,
        pc_token: &TokenSnapshot,
        npc_token: &TokenSnapshot,
    ) -> FirstSightOutcome {
        let (Some(pc_id), Some(npc_id)) = (pc_token.actor_ref(), npc_token.actor_ref()) else {
            return FirstSightOutcome::Skipped(SkipReason::Unresolved);
        };
        if pc_token.role() != Some(ActorRole::Pc) || npc_token.role() != Some(ActorRole::Npc) {
            return FirstSightOutcome::Skipped(SkipReason::Unresolved);
        }
        let pc_name = pc_token.display_name();
        let npc_name = npc_token.display_name();

        self.store.register_npc(npc_id.clone(), npc_name).await;

        let pc_sees = self.oracle.can_see(pc_token, npc_token).await;
        let npc_sees = self.oracle.can_see(npc_token, pc_token).await;
        if !pc_sees && !npc_sees {
            return FirstSightOutcome::Skipped(SkipReason::NotVisible);
        }

        let pair = PairKey::new(pc_id.clone(), npc_id.clone());
        if self.processed.contains(&pair) {
            return FirstSightOutcome::Skipped(SkipReason::AlreadyProcessed);
        }

        let pc_has = self
            .store
            .has_disposition(pc_id, npc_id, ActorRole::Pc)
            .await;
        let npc_has = self
            .store
            .has_disposition(npc_id, pc_id, ActorRole::Npc)
            .await;
        if pc_has && npc_has {
            self.record_check(&pair, pc_sees, npc_sees, &RollOutcomes::default());
            self.visuals.update_pair(pc_token, npc_token).await;
            return FirstSightOutcome::Skipped(SkipReason::AlreadyRolled);
        }

        let settings = self.settings.current().await;
        let gm_ids = self.canvas.active_gm_ids();
        if settings.enable_notifications {
            self.whisper(
                &gm_ids,
                Notification::FirstSight {
                    pc_name: pc_name.to_string(),
                    npc_name: npc_name.to_string(),
                },
            )
            .await;
        }

        // A vibe mirrored from the GM while we were notifying wins over a
        // local roll.
        let mut outcomes = RollOutcomes::default();
        if !pc_has {
            let roll = self.roller.roll(pc_name, npc_name);
            if self
                .store
                .set_disposition_if_absent(pc_id.clone(), npc_id.clone(), roll.vibe, ActorRole::Pc)
                .await
            {
                outcomes.pc_to_npc = Some(roll);
            }
        }
        if !npc_has {
            let roll = self.roller.roll(npc_name, pc_name);
            if self
                .store
                .set_disposition_if_absent(npc_id.clone(), pc_id.clone(), roll.vibe, ActorRole::Npc)
                .await
            {
                outcomes.npc_to_pc = Some(roll);
            }
        }
        if outcomes.is_empty() {
            self.record_check(&pair, pc_sees, npc_sees, &outcomes);
            self.visuals.update_pair(pc_token, npc_token).await;
            return FirstSightOutcome::Skipped(SkipReason::AlreadyRolled);
        }

        tracing::info!(
            pc_id = %pc_id,
            npc_id = %npc_id,
            pc_to_npc = ?outcomes.pc_to_npc.as_ref().map(|r| r.vibe),
            npc_to_pc = ?outcomes.npc_to_pc.as_ref().map(|r| r.vibe),
            "First sight vibes rolled"
        );

        if settings.enable_notifications {
            let directions = [
                (pc_name, npc_name, &outcomes.pc_to_npc),
                (npc_name, pc_name, &outcomes.npc_to_pc),
            ];
            for (source_name, target_name, roll) in directions {
                if let Some(roll) = roll.as_ref().filter(|r| r.has_vibe()) {
                    self.whisper(&gm_ids, vibe_notification(source_name, target_name, roll))
                        .await;
                }
            }
        }

        self.processed.mark(pair.clone());
        self.record_check(&pair, pc_sees, npc_sees, &outcomes);

        if self.canvas.is_gm() {
            let message = SocketMessage::DispositionRolled {
                pc_id: pc_id.clone(),
                npc_id: npc_id.clone(),
                outcomes: outcomes.clone(),
            };
            if let Err(e) = self.broadcast.emit(&message).await {
                tracing::warn!(error = %e, pc_id = %pc_id, npc_id = %npc_id, "Failed to broadcast vibe roll");
                if let Err(e) = self.messaging.alert("Failed to share vibe roll with other players").await {
                    tracing::warn!(error = %e, "Failed to show alert");
                }
            }
        }

        self.visuals.update_pair(pc_token, npc_token).await;
        FirstSightOutcome::Rolled(outcomes)
    }

    /// Check one token against every participating counterpart on the canvas.
    pub async fn check_token(&self, token: &TokenSnapshot) -> usize {
        let settings = self.settings.current().await;
        let is_gm = self.canvas.is_gm();
        let Some(role) = participant_role(token, &settings, is_gm) else {
            return 0;
        };

        let mut rolls = 0;
        for other in self.canvas.tokens() {
            if participant_role(&other, &settings, is_gm) != Some(role.counterpart()) {
                continue;
            }
            let outcome = match role {
                ActorRole::Pc => self.on_visibility_event(token, &other).await,
                ActorRole::Npc => self.on_visibility_event(&other, token).await,
            };
            rolls += outcome.rolls();
        }
        rolls
    }

    /// Forget the session state and check every PC/NPC pair on the canvas.
    ///
    /// Returns the number of directions rolled.
    pub async fn refresh_all(&self) -> usize {
        let cleared = self.processed.clear();
        self.oracle.clear().await;

        if !self.canvas.is_ready() {
            tracing::warn!("Canvas not ready, skipping sight refresh");
            return 0;
        }

        let settings = self.settings.current().await;
        let is_gm = self.canvas.is_gm();
        let tokens = self.canvas.tokens();
        let pcs: Vec<&TokenSnapshot> = tokens
            .iter()
            .filter(|t| participant_role(t, &settings, is_gm) == Some(ActorRole::Pc))
            .collect();
        let npcs: Vec<&TokenSnapshot> = tokens
            .iter()
            .filter(|t| participant_role(t, &settings, is_gm) == Some(ActorRole::Npc))
            .collect();

        let mut rolls = 0;
        for pc_token in &pcs {
            for npc_token in &npcs {
                rolls += self.on_visibility_event(pc_token, npc_token).await.rolls();
            }
        }

        tracing::info!(
            pcs = pcs.len(),
            npcs = npcs.len(),
            cleared_pairs = cleared,
            rolls,
            "Sight refresh complete"
        );
        rolls
    }

    /// Drop the session processed set so pairs can be evaluated again.
    pub fn clear_processed(&self) -> usize {
        let cleared = self.processed.clear();
        tracing::info!(cleared, "Cleared processed pairs");
        cleared
    }

    pub fn debug_info(&self) -> DebugInfo {
        self.debug_log.summary(self.processed.keys())
    }

    pub fn clear_debug_log(&self) {
        self.debug_log.clear();
    }

    fn record_check(&self, pair: &PairKey, pc_sees: bool, npc_sees: bool, outcomes: &RollOutcomes) {
        self.debug_log.record(SightCheck {
            pc_id: pair.pc_id().clone(),
            npc_id: pair.npc_id().clone(),
            pc_can_see_npc: pc_sees,
            npc_can_see_pc: npc_sees,
            rolled: [&outcomes.pc_to_npc, &outcomes.npc_to_pc]
                .into_iter()
                .flatten()
                .map(|roll| roll.vibe)
                .collect(),
            timestamp: self.clock.now(),
        });
    }

    async fn whisper(&self, recipients: &[UserId], notification: Notification) {
        if let Err(e) = self.messaging.whisper(recipients, &notification).await {
            tracing::warn!(error = %e, title = %notification.title(), "Failed to deliver notification");
        }
    }
}

fn vibe_notification(source_name: &str, target_name: &str, roll: &VibeRoll) -> Notification {
    Notification::VibeRolled {
        source_name: source_name.to_string(),
        target_name: target_name.to_string(),
        roll: roll.clone(),
        first_sight: true,
    }
}
