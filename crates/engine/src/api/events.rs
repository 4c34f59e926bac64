//! Host canvas events.
//!
//! The host fires these as tokens appear, move, hide and vanish. Each one is
//! turned into sight-memo invalidation plus a first-sight pass over the
//! affected tokens.

use serde::{Deserialize, Serialize};

use npcvibes_domain::{ActorRole, TokenId};

use crate::app::App;
use crate::use_cases::vibes::participant_role;

/// Token fields whose change can alter who sees whom
const POSITION_FIELDS: &[&str] = &["x", "y", "elevation"];
const VISIBILITY_FIELDS: &[&str] = &["hidden", "sight", "vision"];

/// A canvas event, tagged by `event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    /// The scene finished drawing
    CanvasReady,
    #[serde(rename_all = "camelCase")]
    TokenCreated { token_id: TokenId },
    #[serde(rename_all = "camelCase")]
    TokenUpdated {
        token_id: TokenId,
        /// Names of the token fields that changed
        #[serde(default)]
        changed: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    TokenDeleted { token_id: TokenId },
    /// The host recomputed vision for the scene
    SightRefresh,
    /// A user joined the world
    UserConnected,
    #[serde(other)]
    Unknown,
}

impl HostEvent {
    fn changed_any(changed: &[String], fields: &[&str]) -> bool {
        changed.iter().any(|f| fields.contains(&f.as_str()))
    }
}

/// Apply a host event. Returns the number of directed vibes rolled.
pub async fn handle_host_event(app: &App, event: HostEvent) -> usize {
    let canvas = &app.ports.canvas;
    let first_sight = &app.use_cases.vibes.first_sight;
    let visuals = &app.use_cases.vibes.visuals;
    let oracle = &app.use_cases.sight.oracle;

    match event {
        HostEvent::CanvasReady => {
            if !canvas.is_ready() {
                tracing::debug!("Canvas reported ready before its tokens loaded");
                return 0;
            }
            register_scene_npcs(app).await;
            let rolled = first_sight.refresh_all().await;
            visuals.refresh_all().await;
            rolled
        }
        HostEvent::TokenCreated { token_id } => match canvas.token(&token_id) {
            Some(token) => first_sight.check_token(&token).await,
            None => {
                tracing::debug!(token_id = %token_id, "Created token not on the canvas");
                0
            }
        },
        HostEvent::TokenUpdated { token_id, changed } => {
            let moved = HostEvent::changed_any(&changed, POSITION_FIELDS);
            let visibility = HostEvent::changed_any(&changed, VISIBILITY_FIELDS);
            if !moved && !visibility {
                return 0;
            }
            oracle.invalidate_token(&token_id).await;
            match canvas.token(&token_id) {
                Some(token) => first_sight.check_token(&token).await,
                None => 0,
            }
        }
        HostEvent::TokenDeleted { token_id } => {
            oracle.invalidate_token(&token_id).await;
            visuals.remove_token(&token_id).await;
            0
        }
        HostEvent::SightRefresh => first_sight.refresh_all().await,
        HostEvent::UserConnected => {
            visuals.refresh_all().await;
            0
        }
        HostEvent::Unknown => {
            tracing::debug!("Ignoring unknown host event");
            0
        }
    }
}

/// Make sure every NPC on the scene has a name in the registry, seen or not.
async fn register_scene_npcs(app: &App) {
    let settings = app.stores.settings.current().await;
    let is_gm = app.ports.canvas.is_gm();
    for token in app.ports.canvas.tokens() {
        if participant_role(&token, &settings, is_gm) != Some(ActorRole::Npc) {
            continue;
        }
        if let Some(actor) = token.actor_ref() {
            app.stores
                .relationships
                .register_npc(actor.clone(), token.display_name())
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::test_support::*;
    use crate::infrastructure::broadcast::BroadcastBus;
    use crate::infrastructure::canvas::fixtures::*;
    use crate::infrastructure::canvas::Wall;
    use crate::infrastructure::ports::{MockSettingsRepo, Point};
    use npcvibes_domain::{CharacterRef, VibeType};

    fn quiet_repo() -> Arc<MockSettingsRepo> {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_set().returning(|_, _| Ok(()));
        Arc::new(repo)
    }

    #[test]
    fn token_updated_parses_changed_fields() {
        let event: HostEvent = serde_json::from_str(
            r#"{"event":"tokenUpdated","tokenId":"tok-aria","changed":["x","y"]}"#,
        )
        .expect("deserialize");
        assert_eq!(
            event,
            HostEvent::TokenUpdated {
                token_id: TokenId::new("tok-aria"),
                changed: vec!["x".into(), "y".into()],
            }
        );

        let event: HostEvent =
            serde_json::from_str(r#"{"event":"combatStarted"}"#).expect("deserialize");
        assert_eq!(event, HostEvent::Unknown);
    }

    #[tokio::test]
    async fn canvas_ready_rolls_and_draws() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![20, 5]);

        assert_eq!(handle_host_event(&t.app, HostEvent::CanvasReady).await, 2);
        let aura = t
            .presenter
            .aura(&TokenId::new("tok-bram"))
            .expect("aura on the NPC");
        assert_eq!(aura.vibe, VibeType::Awestruck);
    }

    #[tokio::test]
    async fn moving_out_from_behind_a_wall_triggers_first_sight() {
        let canvas = aria_and_bram();
        canvas.add_wall(Wall::new(Point::new(25.0, -10.0), Point::new(25.0, 10.0)));
        let t = test_app(canvas, quiet_repo(), &BroadcastBus::new(), "gm", vec![18, 18]);

        assert_eq!(handle_host_event(&t.app, HostEvent::CanvasReady).await, 0);
        assert!(t
            .app
            .stores
            .relationships
            .read(|l| l.npc_registry().contains_key(&CharacterRef::new("Actor.bram")))
            .await);

        t.canvas
            .move_token(&TokenId::new("tok-aria"), Point::new(0.0, 40.0));
        let event = HostEvent::TokenUpdated {
            token_id: TokenId::new("tok-aria"),
            changed: vec!["y".into()],
        };
        assert_eq!(handle_host_event(&t.app, event).await, 2);
    }

    #[tokio::test]
    async fn cosmetic_updates_are_ignored() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![20]);
        let event = HostEvent::TokenUpdated {
            token_id: TokenId::new("tok-aria"),
            changed: vec!["texture".into()],
        };
        assert_eq!(handle_host_event(&t.app, event).await, 0);
        assert_eq!(t.random.calls(), 0);
    }

    #[tokio::test]
    async fn created_token_is_checked() {
        let canvas = aria_and_bram();
        canvas.remove_token(&TokenId::new("tok-bram"));
        let t = test_app(canvas, quiet_repo(), &BroadcastBus::new(), "gm", vec![1, 1]);
        assert_eq!(handle_host_event(&t.app, HostEvent::CanvasReady).await, 0);

        t.canvas
            .upsert_token(npc("tok-bram", "Actor.bram", "Bram", 50.0, 0.0));
        let event = HostEvent::TokenCreated {
            token_id: TokenId::new("tok-bram"),
        };
        assert_eq!(handle_host_event(&t.app, event).await, 2);
    }

    #[tokio::test]
    async fn deleted_token_loses_its_aura() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![20, 5]);
        handle_host_event(&t.app, HostEvent::CanvasReady).await;
        assert_eq!(t.presenter.aura_count(), 1);

        t.canvas.remove_token(&TokenId::new("tok-bram"));
        let event = HostEvent::TokenDeleted {
            token_id: TokenId::new("tok-bram"),
        };
        handle_host_event(&t.app, event).await;
        assert_eq!(t.presenter.aura_count(), 0);
    }
}
