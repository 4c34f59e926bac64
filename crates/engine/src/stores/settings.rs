//! World settings store.
//!
//! Settings live under their own key next to the ledger. The cached copy is
//! always normalized; reads never touch the repository.

use std::sync::Arc;

use tokio::sync::RwLock;

use npcvibes_domain::VibeSettings;

use crate::infrastructure::ports::{RepoError, SettingsRepo};

/// Settings key holding the world settings document
pub const SETTINGS_KEY: &str = "settings";

pub struct SettingsStore {
    repo: Arc<dyn SettingsRepo>,
    current: RwLock<VibeSettings>,
}

impl SettingsStore {
    pub fn new(repo: Arc<dyn SettingsRepo>) -> Self {
        Self {
            repo,
            current: RwLock::new(VibeSettings::default()),
        }
    }

    /// Load persisted settings. A missing or unreadable document leaves the
    /// defaults in place.
    pub async fn load(&self) -> Result<VibeSettings, RepoError> {
        let settings = match self.repo.get(SETTINGS_KEY).await? {
            Some(value) => match serde_json::from_value::<VibeSettings>(value) {
                Ok(settings) => settings.normalized(),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable settings, using defaults");
                    VibeSettings::default()
                }
            },
            None => VibeSettings::default(),
        };
        *self.current.write().await = settings.clone();
        Ok(settings)
    }

    pub async fn current(&self) -> VibeSettings {
        self.current.read().await.clone()
    }

    /// Normalize, persist and cache new settings.
    pub async fn update(&self, settings: VibeSettings) -> Result<VibeSettings, RepoError> {
        let settings = settings.normalized();
        let value = serde_json::to_value(&settings).map_err(RepoError::serialization)?;
        self.repo.set(SETTINGS_KEY, &value).await?;
        *self.current.write().await = settings.clone();
        tracing::info!(
            default_sight_range = settings.default_sight_range,
            ignore_walls = settings.ignore_walls,
            "Settings updated"
        );
        Ok(settings)
    }
}
