//! Management use cases for world-wide vibe data operations.
//!
//! Export, import, reset and orphan cleanup. Import and reset replace the
//! whole ledger, so they also drop session state and tell peers to redraw.

use std::sync::Arc;

use npcvibes_domain::CleanupReport;
use npcvibes_shared::SocketMessage;

use crate::infrastructure::ports::{BroadcastPort, CanvasPort};
use crate::stores::{ProcessedPairs, RelationshipStore, StoreError};
use crate::use_cases::sight::VisibilityOracle;
use crate::use_cases::vibes::{FirstSight, VisualEffects};

/// Shared error type for management use cases.
#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Container for management use cases.
pub struct ManagementUseCases {
    pub vibe_data: Arc<VibeDataManagement>,
}

impl ManagementUseCases {
    pub fn new(vibe_data: Arc<VibeDataManagement>) -> Self {
        Self { vibe_data }
    }
}

pub struct VibeDataManagement {
    store: Arc<RelationshipStore>,
    processed: Arc<ProcessedPairs>,
    oracle: Arc<VisibilityOracle>,
    first_sight: Arc<FirstSight>,
    visuals: Arc<VisualEffects>,
    canvas: Arc<dyn CanvasPort>,
    broadcast: Arc<dyn BroadcastPort>,
}

impl VibeDataManagement {
    pub fn new(
        store: Arc<RelationshipStore>,
        processed: Arc<ProcessedPairs>,
        oracle: Arc<VisibilityOracle>,
        first_sight: Arc<FirstSight>,
        visuals: Arc<VisualEffects>,
        canvas: Arc<dyn CanvasPort>,
        broadcast: Arc<dyn BroadcastPort>,
    ) -> Self {
        Self {
            store,
            processed,
            oracle,
            first_sight,
            visuals,
            canvas,
            broadcast,
        }
    }

    /// Pretty-printed JSON snapshot of the whole ledger.
    pub async fn export(&self) -> Result<String, ManagementError> {
        let json = self.store.export_snapshot().await?;
        tracing::info!(bytes = json.len(), "Vibe data exported");
        Ok(json)
    }

    /// Replace the ledger with an exported snapshot.
    ///
    /// A malformed snapshot is rejected before anything changes.
    pub async fn import(&self, json: &str) -> Result<(), ManagementError> {
        self.store.import_snapshot(json).await?;
        tracing::info!("Vibe data imported");

        self.processed.clear();
        self.oracle.clear().await;
        self.announce_change().await;
        self.visuals.refresh_all().await;
        Ok(())
    }

    /// Wipe every vibe, connection, registry entry and interaction. GM only.
    pub async fn reset(&self) -> Result<(), ManagementError> {
        self.store.reset_all(self.canvas.is_gm()).await?;
        tracing::warn!("All vibe data reset");

        self.processed.clear();
        self.oracle.clear().await;
        self.visuals.clear().await;
        self.announce_change().await;
        Ok(())
    }

    /// Purge entries for characters that no longer exist in the world.
    pub async fn cleanup_orphans(&self) -> CleanupReport {
        let valid = self.canvas.actor_refs();
        let report = self.store.cleanup_orphans(&valid).await;
        tracing::info!(
            registry_entries = report.registry_entries,
            vibes = report.vibes,
            connections = report.connections,
            interaction_logs = report.interaction_logs,
            "Orphaned vibe data cleaned up"
        );
        report
    }

    /// Forget the session processed set and re-check every pair.
    pub async fn force_recheck(&self) -> usize {
        self.first_sight.refresh_all().await
    }

    pub fn clear_processed(&self) -> usize {
        self.first_sight.clear_processed()
    }

    async fn announce_change(&self) {
        if let Err(e) = self.broadcast.emit(&SocketMessage::DispositionChanged).await {
            tracing::warn!(error = %e, "Failed to broadcast vibe data change");
        }
    }
}
