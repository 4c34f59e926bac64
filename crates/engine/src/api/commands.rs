//! UI command dispatch.
//!
//! Every command answers with a [`ResponseResult`]. Permission checks happen
//! here before any use case runs.

use npcvibes_domain::{CharacterRef, DomainError};
use npcvibes_shared::{ErrorCode, ResponseResult, UiCommand};

use crate::app::App;
use crate::stores::StoreError;
use crate::use_cases::connection::ConnectionError;
use crate::use_cases::management::ManagementError;

pub async fn handle_command(app: &App, command: UiCommand) -> ResponseResult {
    let canvas = &app.ports.canvas;

    if command.requires_gm() && !canvas.is_gm() {
        tracing::warn!(user = %canvas.current_user(), ?command, "Rejected GM-only command");
        return ResponseResult::error(ErrorCode::Forbidden, "Only the GM can do that");
    }

    let vibe_data = &app.use_cases.management.vibe_data;

    match command {
        UiCommand::ForceRecheck => {
            let rolled = vibe_data.force_recheck().await;
            ResponseResult::success(serde_json::json!({ "rolled": rolled }))
        }

        UiCommand::ExportSnapshot => match vibe_data.export().await {
            Ok(json) => ResponseResult::success(serde_json::json!({ "json": json })),
            Err(e) => management_error(app, e).await,
        },

        UiCommand::ImportSnapshot { json } => match vibe_data.import(&json).await {
            Ok(()) => ResponseResult::success_empty(),
            Err(e) => management_error(app, e).await,
        },

        UiCommand::ResetAll => match vibe_data.reset().await {
            Ok(()) => ResponseResult::success_empty(),
            Err(e) => management_error(app, e).await,
        },

        UiCommand::SetConnectionLevel {
            pc_id,
            npc_id,
            level,
        } => {
            match app
                .use_cases
                .connection
                .set_level
                .execute(pc_id, npc_id, level, canvas.current_user())
                .await
            {
                Ok(change) => ResponseResult::success(change),
                Err(e) => connection_error(e),
            }
        }

        UiCommand::TrackInteraction {
            pc_id,
            npc_id,
            interaction_type,
            description,
        } => {
            match app
                .use_cases
                .connection
                .track_interaction
                .execute(pc_id, npc_id, &interaction_type, &description)
                .await
            {
                Ok(summary) => ResponseResult::success(summary),
                Err(e) => connection_error(e),
            }
        }

        UiCommand::ClearProcessedPairs => {
            let cleared = vibe_data.clear_processed();
            ResponseResult::success(serde_json::json!({ "cleared": cleared }))
        }

        UiCommand::CleanupOrphans => ResponseResult::success(vibe_data.cleanup_orphans().await),

        UiCommand::GetVibeBook => ResponseResult::success(app.use_cases.vibe_book.gm_overview().await),

        UiCommand::GetPlayerView { pc_id } => {
            if !can_view_character(app, &pc_id) {
                return ResponseResult::error(
                    ErrorCode::Forbidden,
                    "You do not own that character",
                );
            }
            ResponseResult::success(app.use_cases.vibe_book.player_view(&pc_id).await)
        }

        UiCommand::GetDebugInfo => {
            ResponseResult::success(app.use_cases.vibes.first_sight.debug_info())
        }

        UiCommand::ClearDebugLog => {
            app.use_cases.vibes.first_sight.clear_debug_log();
            ResponseResult::success_empty()
        }

        UiCommand::GetSettings => ResponseResult::success(app.stores.settings.current().await),

        UiCommand::UpdateSettings { settings } => match app.stores.settings.update(settings).await {
            Ok(settings) => {
                app.apply_settings(&settings).await;
                app.use_cases.sight.oracle.clear().await;
                app.use_cases.vibes.visuals.refresh_all().await;
                ResponseResult::success(settings)
            }
            Err(e) => store_error(app, StoreError::Persistence(e)).await,
        },

        UiCommand::Unknown => ResponseResult::error(ErrorCode::BadRequest, "Unknown command"),
    }
}

/// GMs see every sheet; players only the characters they own.
fn can_view_character(app: &App, pc_id: &CharacterRef) -> bool {
    let canvas = &app.ports.canvas;
    canvas.is_gm() || canvas.active_owners(pc_id).contains(&canvas.current_user())
}

async fn management_error(app: &App, err: ManagementError) -> ResponseResult {
    match err {
        ManagementError::Store(e) => store_error(app, e).await,
    }
}

async fn store_error(app: &App, err: StoreError) -> ResponseResult {
    if err.is_malformed() {
        return ResponseResult::error(ErrorCode::MalformedSnapshot, err.to_string());
    }
    if err.is_unauthorized() {
        return ResponseResult::error(ErrorCode::Forbidden, err.to_string());
    }
    match err {
        StoreError::Persistence(e) => {
            app.alert(&format!("Failed to save vibe data: {e}")).await;
            ResponseResult::error(ErrorCode::StorageFailure, e.to_string())
        }
        StoreError::Domain(e) => domain_error(e),
    }
}

fn connection_error(err: ConnectionError) -> ResponseResult {
    match err {
        ConnectionError::InvalidInput(msg) => ResponseResult::error(ErrorCode::BadRequest, msg),
        ConnectionError::Domain(e) => domain_error(e),
    }
}

fn domain_error(err: DomainError) -> ResponseResult {
    let code = match &err {
        DomainError::InvalidStateTransition(_) => ErrorCode::InvalidTransition,
        DomainError::MalformedSnapshot { .. } | DomainError::Parse(_) => {
            ErrorCode::MalformedSnapshot
        }
        DomainError::Unauthorized(_) => ErrorCode::Forbidden,
        DomainError::Validation(_) => ErrorCode::BadRequest,
    };
    ResponseResult::error(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::test_support::*;
    use crate::infrastructure::broadcast::BroadcastBus;
    use crate::infrastructure::canvas::fixtures::*;
    use crate::infrastructure::ports::{MockSettingsRepo, RepoError};
    use npcvibes_domain::{ConnectionLevel, UserId, VibeSettings};

    fn quiet_repo() -> Arc<MockSettingsRepo> {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_set().returning(|_, _| Ok(()));
        Arc::new(repo)
    }

    fn as_player(t: &TestApp) {
        t.canvas.set_current_user(UserId::new("alice"));
    }

    fn aria() -> CharacterRef {
        CharacterRef::new("Actor.aria")
    }

    fn bram() -> CharacterRef {
        CharacterRef::new("Actor.bram")
    }

    #[tokio::test]
    async fn gm_only_commands_are_forbidden_for_players() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "alice", vec![]);
        as_player(&t);

        for command in [
            UiCommand::ResetAll,
            UiCommand::GetVibeBook,
            UiCommand::CleanupOrphans,
            UiCommand::ImportSnapshot { json: "{}".into() },
            UiCommand::SetConnectionLevel {
                pc_id: aria(),
                npc_id: bram(),
                level: ConnectionLevel::Acquaintance,
            },
        ] {
            let result = handle_command(&t.app, command).await;
            assert_eq!(result.error_code(), Some(ErrorCode::Forbidden));
        }
    }

    #[tokio::test]
    async fn set_connection_level_reports_the_change() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![]);
        let result = handle_command(
            &t.app,
            UiCommand::SetConnectionLevel {
                pc_id: aria(),
                npc_id: bram(),
                level: ConnectionLevel::Acquaintance,
            },
        )
        .await;
        assert!(result.is_success());
        assert_eq!(
            t.app.stores.relationships.get_connection(&aria(), &bram()).await,
            ConnectionLevel::Acquaintance
        );
    }

    #[tokio::test]
    async fn skipping_levels_is_an_invalid_transition() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![]);
        let result = handle_command(
            &t.app,
            UiCommand::SetConnectionLevel {
                pc_id: aria(),
                npc_id: bram(),
                level: ConnectionLevel::Friend,
            },
        )
        .await;
        assert_eq!(result.error_code(), Some(ErrorCode::InvalidTransition));
    }

    #[tokio::test]
    async fn empty_interaction_type_is_a_bad_request() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![]);
        let result = handle_command(
            &t.app,
            UiCommand::TrackInteraction {
                pc_id: aria(),
                npc_id: bram(),
                interaction_type: "  ".into(),
                description: String::new(),
            },
        )
        .await;
        assert_eq!(result.error_code(), Some(ErrorCode::BadRequest));
    }

    #[tokio::test]
    async fn malformed_import_is_reported() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![]);
        let result = handle_command(
            &t.app,
            UiCommand::ImportSnapshot {
                json: r#"{"pcDispositions":{}}"#.into(),
            },
        )
        .await;
        assert_eq!(result.error_code(), Some(ErrorCode::MalformedSnapshot));
    }

    #[tokio::test]
    async fn failed_import_write_is_a_storage_failure() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_set()
            .returning(|_, _| Err(RepoError::database("settings_set", "disk full")));
        let t = test_app(aria_and_bram(), Arc::new(repo), &BroadcastBus::new(), "gm", vec![]);

        let json = npcvibes_domain::VibeLedger::new()
            .to_snapshot_json()
            .expect("snapshot");
        let result = handle_command(&t.app, UiCommand::ImportSnapshot { json }).await;
        assert_eq!(result.error_code(), Some(ErrorCode::StorageFailure));
        assert_eq!(t.messenger.alerts().len(), 1);
    }

    #[tokio::test]
    async fn player_view_requires_ownership() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "alice", vec![]);
        as_player(&t);

        let own = handle_command(&t.app, UiCommand::GetPlayerView { pc_id: aria() }).await;
        assert!(own.is_success());

        let other = handle_command(
            &t.app,
            UiCommand::GetPlayerView {
                pc_id: CharacterRef::new("Actor.cole"),
            },
        )
        .await;
        assert_eq!(other.error_code(), Some(ErrorCode::Forbidden));
    }

    #[tokio::test]
    async fn export_then_import_round_trips_through_commands() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![20, 1]);
        let rolled = handle_command(&t.app, UiCommand::ForceRecheck).await;
        assert!(rolled.is_success());

        let exported = handle_command(&t.app, UiCommand::ExportSnapshot).await;
        let ResponseResult::Success { data: Some(data) } = exported else {
            panic!("export failed");
        };
        let json = data["json"].as_str().expect("json string").to_string();

        let reset = handle_command(&t.app, UiCommand::ResetAll).await;
        assert!(reset.is_success());
        assert!(t.app.stores.relationships.read(|l| l.is_empty()).await);

        let imported = handle_command(&t.app, UiCommand::ImportSnapshot { json }).await;
        assert!(imported.is_success());
        assert_eq!(t.app.stores.relationships.read(|l| l.vibe_count()).await, 2);
    }

    #[tokio::test]
    async fn update_settings_normalizes_and_applies() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![]);
        let settings = VibeSettings {
            default_sight_range: 5_000.0,
            ..Default::default()
        };
        let result = handle_command(&t.app, UiCommand::UpdateSettings { settings }).await;
        assert!(result.is_success());
        assert_eq!(
            t.app.stores.settings.current().await.default_sight_range,
            npcvibes_domain::MAX_SIGHT_RANGE
        );
    }

    #[tokio::test]
    async fn unknown_command_is_a_bad_request() {
        let t = test_app(aria_and_bram(), quiet_repo(), &BroadcastBus::new(), "gm", vec![]);
        let result = handle_command(&t.app, UiCommand::Unknown).await;
        assert_eq!(result.error_code(), Some(ErrorCode::BadRequest));
    }
}
