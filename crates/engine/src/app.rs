//! Application state and composition.

use std::sync::Arc;

use chrono::Duration;

use npcvibes_domain::VibeSettings;

use crate::infrastructure::ports::{
    BroadcastPort, CanvasPort, ClockPort, MessagingPort, PresentationPort, RandomPort,
    SettingsRepo,
};
use crate::stores::{ProcessedPairs, RelationshipStore, SettingsStore, StoreError};
use crate::use_cases;
use crate::use_cases::connection::{SetConnectionLevel, TrackInteraction};
use crate::use_cases::management::VibeDataManagement;
use crate::use_cases::sight::VisibilityOracle;
use crate::use_cases::vibes::{FirstSight, VibeRoller, VisualEffects};

/// Host-facing ports the engine is built on.
#[derive(Clone)]
pub struct AppPorts {
    pub settings_repo: Arc<dyn SettingsRepo>,
    pub canvas: Arc<dyn CanvasPort>,
    pub messaging: Arc<dyn MessagingPort>,
    pub broadcast: Arc<dyn BroadcastPort>,
    pub presentation: Arc<dyn PresentationPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

/// Main application state.
///
/// Built once per process and handed to the api layer by reference.
pub struct App {
    pub ports: AppPorts,
    pub stores: Stores,
    pub use_cases: UseCases,
}

/// Container for all stores.
pub struct Stores {
    pub relationships: Arc<RelationshipStore>,
    pub processed: Arc<ProcessedPairs>,
    pub settings: Arc<SettingsStore>,
}

/// Container for all use cases.
pub struct UseCases {
    pub sight: use_cases::SightUseCases,
    pub vibes: use_cases::VibeUseCases,
    pub connection: use_cases::ConnectionUseCases,
    pub management: use_cases::ManagementUseCases,
    pub vibe_book: Arc<use_cases::VibeBook>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// Timing starts from the default settings; [`App::load`] applies the
    /// persisted ones.
    pub fn new(ports: AppPorts) -> Self {
        let defaults = VibeSettings::default();

        // Stores
        let settings = Arc::new(SettingsStore::new(ports.settings_repo.clone()));
        let relationships = Arc::new(RelationshipStore::new(
            ports.settings_repo.clone(),
            ports.clock.clone(),
            millis(defaults.save_debounce_ms),
        ));
        let processed = Arc::new(ProcessedPairs::new());

        // Sight
        let oracle = Arc::new(VisibilityOracle::new(
            ports.canvas.clone(),
            settings.clone(),
            ports.clock.clone(),
            millis(defaults.sight_cache_ttl_ms),
        ));

        // Vibes
        let roller = Arc::new(VibeRoller::new(ports.random.clone()));
        let visuals = Arc::new(VisualEffects::new(
            ports.canvas.clone(),
            relationships.clone(),
            settings.clone(),
            ports.presentation.clone(),
        ));
        let first_sight = Arc::new(FirstSight::new(
            ports.canvas.clone(),
            oracle.clone(),
            roller.clone(),
            relationships.clone(),
            processed.clone(),
            settings.clone(),
            visuals.clone(),
            ports.messaging.clone(),
            ports.broadcast.clone(),
            ports.clock.clone(),
        ));

        // Connections
        let set_level = Arc::new(SetConnectionLevel::new(
            relationships.clone(),
            settings.clone(),
            ports.canvas.clone(),
            ports.messaging.clone(),
            ports.broadcast.clone(),
        ));
        let track_interaction = Arc::new(TrackInteraction::new(
            relationships.clone(),
            settings.clone(),
            ports.canvas.clone(),
            ports.messaging.clone(),
            ports.clock.clone(),
        ));

        // Management
        let vibe_data = Arc::new(VibeDataManagement::new(
            relationships.clone(),
            processed.clone(),
            oracle.clone(),
            first_sight.clone(),
            visuals.clone(),
            ports.canvas.clone(),
            ports.broadcast.clone(),
        ));

        let vibe_book = Arc::new(use_cases::VibeBook::new(
            relationships.clone(),
            ports.canvas.clone(),
        ));

        let use_cases = UseCases {
            sight: use_cases::SightUseCases::new(oracle),
            vibes: use_cases::VibeUseCases::new(roller, first_sight, visuals),
            connection: use_cases::ConnectionUseCases::new(set_level, track_interaction),
            management: use_cases::ManagementUseCases::new(vibe_data),
            vibe_book,
        };

        Self {
            ports,
            stores: Stores {
                relationships,
                processed,
                settings,
            },
            use_cases,
        }
    }

    /// Load persisted settings and vibe data.
    pub async fn load(&self) -> Result<(), StoreError> {
        let settings = self.stores.settings.load().await?;
        self.apply_settings(&settings).await;
        self.stores.relationships.load().await
    }

    /// Push timing settings down into the stores and the sight memo.
    pub async fn apply_settings(&self, settings: &VibeSettings) {
        self.stores
            .relationships
            .set_debounce(millis(settings.save_debounce_ms))
            .await;
        self.use_cases
            .sight
            .oracle
            .set_memo_ttl(millis(settings.sight_cache_ttl_ms))
            .await;
    }

    /// Persist buffered writes whose quiet period is over.
    ///
    /// A failure is shown to the local user; the cached ledger stays
    /// authoritative and the next write schedules another attempt.
    pub async fn flush_pending(&self) -> bool {
        match self.stores.relationships.flush_if_due().await {
            Ok(saved) => saved,
            Err(e) => {
                self.alert(&format!("Failed to save vibe data: {e}")).await;
                false
            }
        }
    }

    /// Persist everything still buffered, ignoring the quiet period.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.stores.relationships.flush().await?;
        tracing::info!("Vibe data flushed");
        Ok(())
    }

    /// Periodic housekeeping: flush buffered writes that are due and drop
    /// expired sight answers.
    pub async fn tick(&self) -> bool {
        let saved = self.flush_pending().await;
        let evicted = self.use_cases.sight.oracle.evict_expired().await;
        if evicted > 0 {
            tracing::trace!(evicted, "Evicted expired sight answers");
        }
        saved
    }

    pub(crate) async fn alert(&self, message: &str) {
        tracing::warn!(message, "Alerting user");
        if let Err(e) = self.ports.messaging.alert(message).await {
            tracing::warn!(error = %e, "Failed to show alert");
        }
    }
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::infrastructure::broadcast::BroadcastBus;
    use crate::infrastructure::canvas::fixtures::*;
    use crate::infrastructure::ports::{MockSettingsRepo, RepoError};
    use crate::infrastructure::settings::SqliteSettingsRepo;
    use npcvibes_domain::{ActorRole, CharacterRef, TokenId, VibeType};

    #[tokio::test]
    async fn load_applies_persisted_timing() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get()
            .withf(|key| key == crate::stores::SETTINGS_KEY)
            .returning(|_| Ok(Some(serde_json::json!({ "saveDebounceMs": 5000 }))));
        repo.expect_get()
            .withf(|key| key == crate::stores::LEDGER_KEY)
            .returning(|_| Ok(None));
        repo.expect_set().returning(|_, _| Ok(()));

        let t = test_app(aria_and_bram(), Arc::new(repo), &BroadcastBus::new(), "gm", vec![]);
        t.app.load().await.expect("load");

        t.app
            .stores
            .relationships
            .register_npc(CharacterRef::new("Actor.bram"), "Bram")
            .await;
        t.clock.advance(Duration::seconds(2));
        assert!(!t.app.flush_pending().await);
        t.clock.advance(Duration::seconds(3));
        assert!(t.app.flush_pending().await);
    }

    #[tokio::test]
    async fn tick_flushes_due_writes_and_evicts_stale_sight_answers() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().times(1).returning(|_, _| Ok(()));

        let t = test_app(aria_and_bram(), Arc::new(repo), &BroadcastBus::new(), "gm", vec![]);
        let aria = t.canvas.token(&TokenId::new("tok-aria")).expect("aria");
        let bram = t.canvas.token(&TokenId::new("tok-bram")).expect("bram");
        let oracle = &t.app.use_cases.sight.oracle;
        oracle.can_see(&aria, &bram).await;
        t.app
            .stores
            .relationships
            .register_npc(CharacterRef::new("Actor.bram"), "Bram")
            .await;

        assert!(!t.app.tick().await);
        t.clock.advance(Duration::seconds(2));
        assert!(t.app.tick().await);
        assert_eq!(oracle.evict_expired().await, 0);
        assert_eq!(oracle.invalidate_token(&aria.id).await, 0);
    }

    #[tokio::test]
    async fn failed_flush_alerts_the_user() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set()
            .returning(|_, _| Err(RepoError::database("settings_set", "read-only world")));

        let t = test_app(aria_and_bram(), Arc::new(repo), &BroadcastBus::new(), "gm", vec![]);
        t.app
            .stores
            .relationships
            .register_npc(CharacterRef::new("Actor.bram"), "Bram")
            .await;
        t.clock.advance(Duration::seconds(1));

        assert!(!t.app.flush_pending().await);
        let alerts = t.messenger.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Failed to save vibe data"));
        assert!(t.app.stores.relationships.is_dirty().await);
    }

    #[tokio::test]
    async fn rolls_survive_a_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("world.db");
        let bus = BroadcastBus::new();

        let clock: Arc<dyn ClockPort> = Arc::new(crate::infrastructure::clock::SystemClock::new());
        let repo = Arc::new(
            SqliteSettingsRepo::new(
                db.to_str().expect("utf-8 path"),
                crate::infrastructure::settings::MODULE_NAMESPACE,
                clock,
            )
            .await
            .expect("repo"),
        );
        let first = test_app(aria_and_bram(), repo.clone(), &bus, "gm", vec![20, 1]);
        first.app.load().await.expect("load");
        assert_eq!(first.app.use_cases.vibes.first_sight.refresh_all().await, 2);
        first.app.shutdown().await.expect("flush");

        let second = test_app(aria_and_bram(), repo, &bus, "gm", vec![]);
        second.app.load().await.expect("load");
        let stored = second
            .app
            .stores
            .relationships
            .get_disposition(
                &CharacterRef::new("Actor.aria"),
                &CharacterRef::new("Actor.bram"),
                ActorRole::Pc,
            )
            .await
            .map(|r| r.vibe);
        assert_eq!(stored, Some(VibeType::Awestruck));

        // New session, same pair: nothing to roll.
        assert_eq!(second.app.use_cases.vibes.first_sight.refresh_all().await, 0);
        assert_eq!(second.random.calls(), 0);
    }
}
