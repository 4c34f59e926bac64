//! Set connection level use case.

use std::sync::Arc;

use serde::Serialize;

use npcvibes_domain::{CharacterRef, ConnectionLevel, UserId};
use npcvibes_shared::SocketMessage;

use crate::infrastructure::ports::{BroadcastPort, CanvasPort, MessagingPort, Notification};
use crate::stores::{RelationshipStore, SettingsStore};
use crate::use_cases::names::character_name;

use super::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionChange {
    pub from: ConnectionLevel,
    pub to: ConnectionLevel,
}

/// Moves a PC/NPC connection to a new level.
///
/// Forward moves are one step at a time. The change is whispered to the GMs
/// and the acting user, then broadcast so other processes redraw.
pub struct SetConnectionLevel {
    store: Arc<RelationshipStore>,
    settings: Arc<SettingsStore>,
    canvas: Arc<dyn CanvasPort>,
    messaging: Arc<dyn MessagingPort>,
    broadcast: Arc<dyn BroadcastPort>,
}

impl SetConnectionLevel {
    pub fn new(
        store: Arc<RelationshipStore>,
        settings: Arc<SettingsStore>,
        canvas: Arc<dyn CanvasPort>,
        messaging: Arc<dyn MessagingPort>,
        broadcast: Arc<dyn BroadcastPort>,
    ) -> Self {
        Self {
            store,
            settings,
            canvas,
            messaging,
            broadcast,
        }
    }

    pub async fn execute(
        &self,
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        level: ConnectionLevel,
        actor: UserId,
    ) -> Result<ConnectionChange, ConnectionError> {
        if pc_id == npc_id {
            return Err(ConnectionError::InvalidInput(
                "a character cannot have a connection with itself".to_string(),
            ));
        }

        let current = self.store.get_connection(&pc_id, &npc_id).await;
        let level = current.transition_to(level)?;
        self.store
            .set_connection(pc_id.clone(), npc_id.clone(), level)
            .await;

        tracing::info!(
            pc_id = %pc_id,
            npc_id = %npc_id,
            from = %current,
            to = %level,
            actor = %actor,
            "Connection level set"
        );

        if current != level && self.settings.current().await.enable_notifications {
            let (pc_name, npc_name) = self
                .store
                .read(|ledger| {
                    (
                        character_name(self.canvas.as_ref(), ledger, &pc_id),
                        character_name(self.canvas.as_ref(), ledger, &npc_id),
                    )
                })
                .await;
            let mut recipients = self.canvas.active_gm_ids();
            recipients.push(actor.clone());
            let notification = Notification::ConnectionUpdated {
                pc_name,
                npc_name,
                from: current,
                to: level,
            };
            if let Err(e) = self.messaging.whisper(&recipients, &notification).await {
                tracing::warn!(error = %e, "Failed to deliver connection notice");
            }
        }

        let message = SocketMessage::ConnectionChanged {
            pc_id,
            npc_id,
            level,
            actor_id: actor,
        };
        if let Err(e) = self.broadcast.emit(&message).await {
            tracing::warn!(error = %e, "Failed to broadcast connection change");
        }

        Ok(ConnectionChange {
            from: current,
            to: level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::canvas::fixtures::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::messaging::TracingMessenger;
    use crate::infrastructure::ports::{MockBroadcastPort, MockSettingsRepo};
    use chrono::{Duration, Utc};
    use npcvibes_domain::DomainError;

    struct Harness {
        store: Arc<RelationshipStore>,
        messenger: Arc<TracingMessenger>,
        use_case: SetConnectionLevel,
    }

    fn harness(broadcast: MockBroadcastPort) -> Harness {
        let store = Arc::new(RelationshipStore::new(
            Arc::new(MockSettingsRepo::new()),
            Arc::new(FixedClock(Utc::now())),
            Duration::seconds(1),
        ));
        let messenger = Arc::new(TracingMessenger::new());
        let use_case = SetConnectionLevel::new(
            store.clone(),
            Arc::new(SettingsStore::new(Arc::new(MockSettingsRepo::new()))),
            Arc::new(aria_and_bram()),
            messenger.clone(),
            Arc::new(broadcast),
        );
        Harness {
            store,
            messenger,
            use_case,
        }
    }

    fn aria() -> CharacterRef {
        CharacterRef::new("Actor.aria")
    }

    fn bram() -> CharacterRef {
        CharacterRef::new("Actor.bram")
    }

    #[tokio::test]
    async fn single_step_is_stored_notified_and_broadcast() {
        let mut broadcast = MockBroadcastPort::new();
        broadcast
            .expect_emit()
            .withf(|message| {
                matches!(
                    message,
                    SocketMessage::ConnectionChanged { level: ConnectionLevel::Acquaintance, actor_id, .. }
                        if actor_id.as_str() == "alice"
                )
            })
            .times(1)
            .returning(|_| Ok(()));
        let h = harness(broadcast);

        let change = h
            .use_case
            .execute(aria(), bram(), ConnectionLevel::Acquaintance, UserId::new("alice"))
            .await
            .expect("valid step");
        assert_eq!(change.from, ConnectionLevel::Stranger);
        assert_eq!(
            h.store.get_connection(&aria(), &bram()).await,
            ConnectionLevel::Acquaintance
        );

        let deliveries = h.messenger.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(
            deliveries[0].recipients,
            vec![UserId::new("gm"), UserId::new("alice")]
        );
        assert_eq!(
            deliveries[0].notification.body(),
            "Connection between Aria and Bram changed from Stranger to Acquaintance"
        );
    }

    #[tokio::test]
    async fn skipping_a_level_is_rejected_without_changes() {
        let mut broadcast = MockBroadcastPort::new();
        broadcast.expect_emit().never();
        let h = harness(broadcast);

        let err = h
            .use_case
            .execute(aria(), bram(), ConnectionLevel::Friend, UserId::new("gm"))
            .await
            .expect_err("Stranger cannot jump to Friend");
        assert!(matches!(
            err,
            ConnectionError::Domain(DomainError::InvalidStateTransition(_))
        ));
        assert_eq!(
            h.store.get_connection(&aria(), &bram()).await,
            ConnectionLevel::Stranger
        );
        assert!(h.messenger.deliveries().is_empty());
    }

    #[tokio::test]
    async fn moving_backward_is_allowed() {
        let mut broadcast = MockBroadcastPort::new();
        broadcast.expect_emit().returning(|_| Ok(()));
        let h = harness(broadcast);
        h.store
            .set_connection(aria(), bram(), ConnectionLevel::BestFriend)
            .await;

        let change = h
            .use_case
            .execute(aria(), bram(), ConnectionLevel::Stranger, UserId::new("gm"))
            .await
            .expect("regression is allowed");
        assert_eq!(change.to, ConnectionLevel::Stranger);
    }

    #[tokio::test]
    async fn same_level_is_a_silent_no_op() {
        let mut broadcast = MockBroadcastPort::new();
        broadcast.expect_emit().returning(|_| Ok(()));
        let h = harness(broadcast);

        h.use_case
            .execute(aria(), bram(), ConnectionLevel::Stranger, UserId::new("gm"))
            .await
            .expect("no-op");
        assert!(h.messenger.deliveries().is_empty());
    }
}
