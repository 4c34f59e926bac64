//! Relationship store: the in-memory ledger with coalesced persistence.
//!
//! The cache is authoritative between flushes. Every mutation marks the
//! ledger dirty and pushes the flush deadline out by the debounce window, so
//! a burst of writes becomes one persisted snapshot. Reset and import bypass
//! the window and persist immediately.
//!
//! A failed flush keeps the ledger dirty but unscheduled: there is no
//! background retry, the next mutation schedules the next attempt.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use npcvibes_domain::{
    ActorRole, CharacterRef, CleanupReport, ConnectionLevel, DomainError, InteractionEntry,
    PairKey, VibeLedger, VibeRecord, VibeType,
};

use crate::infrastructure::ports::{ClockPort, RepoError, SettingsRepo};

/// Settings key holding the ledger document
pub const LEDGER_KEY: &str = "vibeData";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to save vibe data: {0}")]
    Persistence(#[from] RepoError),
    #[error("Invalid vibe data: {0}")]
    Domain(#[from] DomainError),
}

impl StoreError {
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            StoreError::Domain(DomainError::MalformedSnapshot { .. } | DomainError::Parse(_))
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Domain(DomainError::Unauthorized(_)))
    }
}

struct LedgerState {
    ledger: VibeLedger,
    dirty: bool,
    flush_due: Option<DateTime<Utc>>,
    debounce: Duration,
}

pub struct RelationshipStore {
    repo: Arc<dyn SettingsRepo>,
    clock: Arc<dyn ClockPort>,
    state: Mutex<LedgerState>,
}

impl RelationshipStore {
    pub fn new(repo: Arc<dyn SettingsRepo>, clock: Arc<dyn ClockPort>, debounce: Duration) -> Self {
        Self {
            repo,
            clock,
            state: Mutex::new(LedgerState {
                ledger: VibeLedger::new(),
                dirty: false,
                flush_due: None,
                debounce,
            }),
        }
    }

    /// Replace the cache with the persisted ledger, or an empty one if none
    /// was ever saved.
    pub async fn load(&self) -> Result<(), StoreError> {
        let ledger = match self.repo.get(LEDGER_KEY).await? {
            Some(value) => VibeLedger::from_snapshot_value(value)?,
            None => VibeLedger::new(),
        };
        tracing::info!(vibes = ledger.vibe_count(), npcs = ledger.npc_registry().len(), "Loaded vibe data");

        let mut state = self.state.lock().await;
        state.ledger = ledger;
        state.dirty = false;
        state.flush_due = None;
        Ok(())
    }

    pub async fn set_debounce(&self, debounce: Duration) {
        self.state.lock().await.debounce = debounce;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Run a read against the cached ledger.
    pub async fn read<R>(&self, f: impl FnOnce(&VibeLedger) -> R) -> R {
        let state = self.state.lock().await;
        f(&state.ledger)
    }

    /// Clone of the current ledger
    pub async fn snapshot(&self) -> VibeLedger {
        self.read(VibeLedger::clone).await
    }

    pub async fn get_disposition(
        &self,
        source: &CharacterRef,
        target: &CharacterRef,
        role: ActorRole,
    ) -> Option<VibeRecord> {
        self.read(|ledger| ledger.vibe(source, target, role).cloned())
            .await
    }

    pub async fn has_disposition(
        &self,
        source: &CharacterRef,
        target: &CharacterRef,
        role: ActorRole,
    ) -> bool {
        self.read(|ledger| ledger.has_vibe(source, target, role)).await
    }

    pub async fn get_connection(&self, pc_id: &CharacterRef, npc_id: &CharacterRef) -> ConnectionLevel {
        self.read(|ledger| ledger.connection_level(pc_id, npc_id))
            .await
    }

    pub async fn interactions(&self, pair: &PairKey) -> Vec<InteractionEntry> {
        self.read(|ledger| ledger.interactions(pair).to_vec()).await
    }

    // =========================================================================
    // Buffered writes
    // =========================================================================

    /// Apply a mutation and schedule a coalesced flush.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut VibeLedger, DateTime<Utc>) -> R) -> R {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let result = f(&mut state.ledger, now);
        state.dirty = true;
        state.flush_due = Some(now + state.debounce);
        result
    }

    /// Mirror a change another process already persisted. The cache is
    /// updated but nothing is scheduled for writing.
    pub async fn mirror<R>(&self, f: impl FnOnce(&mut VibeLedger, DateTime<Utc>) -> R) -> R {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        f(&mut state.ledger, now)
    }

    /// Upsert one direction's vibe. Callers guarantee write-once.
    pub async fn set_disposition(
        &self,
        source: CharacterRef,
        target: CharacterRef,
        vibe: VibeType,
        role: ActorRole,
    ) {
        self.mutate(|ledger, now| ledger.record_vibe(source, target, role, vibe, now))
            .await;
    }

    /// Store one direction's vibe unless one is already recorded, checked
    /// under the ledger lock. Returns whether this call wrote it.
    pub async fn set_disposition_if_absent(
        &self,
        source: CharacterRef,
        target: CharacterRef,
        vibe: VibeType,
        role: ActorRole,
    ) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if state.ledger.has_vibe(&source, &target, role) {
            return false;
        }
        state.ledger.record_vibe(source, target, role, vibe, now);
        state.dirty = true;
        state.flush_due = Some(now + state.debounce);
        true
    }

    /// Unconditional upsert; transition rules are the caller's job.
    pub async fn set_connection(&self, pc_id: CharacterRef, npc_id: CharacterRef, level: ConnectionLevel) {
        self.mutate(|ledger, now| ledger.set_connection(pc_id, npc_id, level, now))
            .await;
    }

    /// Append to the pair's interaction log, returning the new log length.
    pub async fn append_interaction(&self, pair: &PairKey, entry: InteractionEntry) -> usize {
        self.mutate(|ledger, _| ledger.append_interaction(pair, entry))
            .await
    }

    /// Register or refresh an NPC, returning true when it is new.
    pub async fn register_npc(&self, npc_id: CharacterRef, display_name: &str) -> bool {
        self.mutate(|ledger, now| ledger.register_npc(npc_id, display_name, now))
            .await
    }

    /// Purge entries for ids missing from `valid`.
    pub async fn cleanup_orphans(&self, valid: &HashSet<CharacterRef>) -> CleanupReport {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let report = state
            .ledger
            .cleanup_orphans(|id| valid.contains(id));
        if !report.is_empty() {
            state.dirty = true;
            state.flush_due = Some(now + state.debounce);
        }
        report
    }

    // =========================================================================
    // Immediate writes
    // =========================================================================

    pub async fn export_snapshot(&self) -> Result<String, StoreError> {
        Ok(self.read(VibeLedger::to_snapshot_json).await?)
    }

    /// Replace everything with an exported snapshot and persist now.
    ///
    /// A malformed document is rejected before any state changes.
    pub async fn import_snapshot(&self, json: &str) -> Result<(), StoreError> {
        let ledger = VibeLedger::from_snapshot_json(json)?;
        self.replace_persisted(ledger).await
    }

    /// Wipe all relationship state and persist now. GM only.
    pub async fn reset_all(&self, is_gm: bool) -> Result<(), StoreError> {
        if !is_gm {
            return Err(DomainError::unauthorized("Only GMs can reset vibe data").into());
        }
        self.replace_persisted(VibeLedger::new()).await
    }

    /// Persist `ledger` and only then make it the cached ledger. A failed
    /// save leaves the cache, dirty flag and flush deadline as they were.
    async fn replace_persisted(&self, mut ledger: VibeLedger) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        ledger.touch(self.clock.now());
        let value = serde_json::to_value(&ledger).map_err(RepoError::serialization)?;

        if let Err(e) = self.repo.set(LEDGER_KEY, &value).await {
            tracing::warn!(error = %e, "Failed to save replacement vibe data, keeping cached state");
            return Err(e.into());
        }
        tracing::debug!(vibes = ledger.vibe_count(), "Replacement vibe data saved");
        state.ledger = ledger;
        state.dirty = false;
        state.flush_due = None;
        Ok(())
    }

    // =========================================================================
    // Flushing
    // =========================================================================

    /// Persist if a scheduled flush is due. Returns whether a write happened.
    pub async fn flush_if_due(&self) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        match state.flush_due {
            Some(due) if state.dirty && now >= due => {
                self.persist_locked(&mut state).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Persist pending writes now, ignoring the debounce window.
    pub async fn flush(&self) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if !state.dirty {
            return Ok(false);
        }
        self.persist_locked(&mut state).await?;
        Ok(true)
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    pub async fn flush_due(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.flush_due
    }

    async fn persist_locked(&self, state: &mut LedgerState) -> Result<(), StoreError> {
        state.ledger.touch(self.clock.now());
        let value = serde_json::to_value(&state.ledger).map_err(RepoError::serialization)?;

        match self.repo.set(LEDGER_KEY, &value).await {
            Ok(()) => {
                state.dirty = false;
                state.flush_due = None;
                tracing::debug!(vibes = state.ledger.vibe_count(), "Vibe data saved");
                Ok(())
            }
            Err(e) => {
                state.flush_due = None;
                tracing::warn!(error = %e, "Failed to save vibe data, keeping cached state");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::ports::MockSettingsRepo;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0)
            .single()
            .expect("valid time")
    }

    fn id(value: &str) -> CharacterRef {
        CharacterRef::new(value)
    }

    fn store_with(repo: MockSettingsRepo, clock: Arc<ManualClock>) -> RelationshipStore {
        RelationshipStore::new(Arc::new(repo), clock, Duration::milliseconds(1000))
    }

    #[tokio::test]
    async fn rapid_writes_coalesce_into_one_save() {
        let saves = Arc::new(AtomicUsize::new(0));
        let counter = saves.clone();
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().returning(move |key, value| {
            assert_eq!(key, LEDGER_KEY);
            assert!(value.get("pcDispositions").is_some());
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock.clone());

        store.set_disposition(id("aria"), id("bram"), VibeType::Curious, ActorRole::Pc).await;
        clock.advance(Duration::milliseconds(400));
        store.set_disposition(id("bram"), id("aria"), VibeType::None, ActorRole::Npc).await;
        clock.advance(Duration::milliseconds(400));
        store.set_connection(id("aria"), id("bram"), ConnectionLevel::Acquaintance).await;

        // Deadline keeps moving with each write.
        clock.advance(Duration::milliseconds(900));
        assert!(!store.flush_if_due().await.expect("not due"));
        assert_eq!(saves.load(Ordering::SeqCst), 0);

        clock.advance(Duration::milliseconds(100));
        assert!(store.flush_if_due().await.expect("flush"));
        assert_eq!(saves.load(Ordering::SeqCst), 1);
        assert!(!store.is_dirty().await);

        assert!(!store.flush_if_due().await.expect("nothing pending"));
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_flush_keeps_cache_and_waits_for_next_mutation() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RepoError::database("settings_set", "disk full"))
            } else {
                Ok(())
            }
        });

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock.clone());

        store.set_disposition(id("aria"), id("bram"), VibeType::Awestruck, ActorRole::Pc).await;
        clock.advance(Duration::seconds(2));

        let err = store.flush_if_due().await.expect_err("save fails");
        assert!(matches!(err, StoreError::Persistence(_)));

        // Cache still authoritative, nothing scheduled.
        assert!(store.is_dirty().await);
        assert_eq!(store.flush_due().await, None);
        assert_eq!(
            store.get_disposition(&id("aria"), &id("bram"), ActorRole::Pc).await.map(|r| r.vibe),
            Some(VibeType::Awestruck)
        );
        clock.advance(Duration::seconds(5));
        assert!(!store.flush_if_due().await.expect("no retry loop"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        // The next mutation schedules the retry.
        store.register_npc(id("bram"), "Bram").await;
        clock.advance(Duration::seconds(1));
        assert!(store.flush_if_due().await.expect("retry succeeds"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!store.is_dirty().await);
    }

    #[tokio::test]
    async fn import_rejects_malformed_snapshot_without_touching_state() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().never();

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock);
        store.set_disposition(id("aria"), id("bram"), VibeType::Curious, ActorRole::Pc).await;
        let before = store.snapshot().await;

        let err = store
            .import_snapshot(r#"{ "pcDispositions": {} }"#)
            .await
            .expect_err("malformed");
        assert!(err.is_malformed());
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn import_replaces_and_persists_immediately() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().times(1).returning(|_, _| Ok(()));

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock);
        store.set_disposition(id("old"), id("npc"), VibeType::Curious, ActorRole::Pc).await;

        let mut incoming = VibeLedger::new();
        incoming.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Repulsed, start());
        let json = incoming.to_snapshot_json().expect("export");

        store.import_snapshot(&json).await.expect("import");
        assert!(!store.is_dirty().await);
        assert!(!store.has_disposition(&id("old"), &id("npc"), ActorRole::Pc).await);
        assert!(store.has_disposition(&id("aria"), &id("bram"), ActorRole::Pc).await);
    }

    #[tokio::test]
    async fn reset_requires_gm() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().never();

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock);
        store.set_connection(id("aria"), id("bram"), ConnectionLevel::Friend).await;

        let err = store.reset_all(false).await.expect_err("players cannot reset");
        assert!(err.is_unauthorized());
        assert_eq!(
            store.get_connection(&id("aria"), &id("bram")).await,
            ConnectionLevel::Friend
        );
    }

    #[tokio::test]
    async fn reset_clears_everything_and_persists() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().times(1).returning(|_, value| {
            assert_eq!(value["pcDispositions"], serde_json::json!({}));
            Ok(())
        });

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock);
        store.set_disposition(id("aria"), id("bram"), VibeType::Curious, ActorRole::Pc).await;
        store.register_npc(id("bram"), "Bram").await;

        store.reset_all(true).await.expect("reset");
        assert!(store.read(VibeLedger::is_empty).await);
    }

    #[tokio::test]
    async fn failed_reset_keeps_cached_ledger_and_schedule() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set()
            .times(1)
            .returning(|_, _| Err(RepoError::database("settings_set", "disk full")));

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock);
        store.set_disposition(id("aria"), id("bram"), VibeType::Curious, ActorRole::Pc).await;
        let due = store.flush_due().await;
        let before = store.snapshot().await;

        let err = store.reset_all(true).await.expect_err("save fails");
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(store.snapshot().await, before);
        assert!(store.is_dirty().await);
        assert_eq!(store.flush_due().await, due);
    }

    #[tokio::test]
    async fn failed_import_is_not_saved_by_a_later_flush() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut repo = MockSettingsRepo::new();
        repo.expect_set().returning(move |_, value| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(RepoError::database("settings_set", "locked"));
            }
            // The later flush carries the old ledger, not the rejected import.
            assert!(value["pcDispositions"].get("old").is_some());
            assert!(value["pcDispositions"].get("aria").is_none());
            Ok(())
        });

        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(repo, clock);
        store.set_disposition(id("old"), id("npc"), VibeType::Curious, ActorRole::Pc).await;

        let mut incoming = VibeLedger::new();
        incoming.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Repulsed, start());
        let json = incoming.to_snapshot_json().expect("export");

        assert!(store.import_snapshot(&json).await.is_err());
        assert!(store.has_disposition(&id("old"), &id("npc"), ActorRole::Pc).await);
        assert!(!store.has_disposition(&id("aria"), &id("bram"), ActorRole::Pc).await);

        assert!(store.flush().await.expect("flush old ledger"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn conditional_write_keeps_an_existing_vibe() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = store_with(MockSettingsRepo::new(), clock);
        store
            .mirror(|ledger, now| {
                ledger.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Awestruck, now)
            })
            .await;

        let wrote = store
            .set_disposition_if_absent(id("aria"), id("bram"), VibeType::Repulsed, ActorRole::Pc)
            .await;
        assert!(!wrote);
        assert_eq!(
            store.get_disposition(&id("aria"), &id("bram"), ActorRole::Pc).await.map(|r| r.vibe),
            Some(VibeType::Awestruck)
        );
        assert!(!store.is_dirty().await);

        assert!(
            store
                .set_disposition_if_absent(id("bram"), id("aria"), VibeType::None, ActorRole::Npc)
                .await
        );
        assert!(store.flush_due().await.is_some());
    }

    #[tokio::test]
    async fn load_reads_persisted_ledger() {
        let mut persisted = VibeLedger::new();
        persisted.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Awestruck, start());
        let value = serde_json::to_value(&persisted).expect("serialize");

        let mut repo = MockSettingsRepo::new();
        repo.expect_get()
            .withf(|key| key == LEDGER_KEY)
            .returning(move |_| Ok(Some(value.clone())));

        let store = store_with(repo, Arc::new(ManualClock::new(start())));
        store.load().await.expect("load");
        assert!(store.has_disposition(&id("aria"), &id("bram"), ActorRole::Pc).await);
        assert!(!store.is_dirty().await);
    }

    #[tokio::test]
    async fn load_without_saved_data_starts_empty() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get().returning(|_| Ok(None));

        let store = store_with(repo, Arc::new(ManualClock::new(start())));
        store.load().await.expect("load");
        assert!(store.read(VibeLedger::is_empty).await);
    }

    #[tokio::test]
    async fn cleanup_only_schedules_when_something_changed() {
        let repo = MockSettingsRepo::new();
        let store = store_with(repo, Arc::new(ManualClock::new(start())));
        store.set_disposition(id("aria"), id("x"), VibeType::Curious, ActorRole::Pc).await;
        store.flush_due().await.expect("scheduled by write");

        let valid: HashSet<CharacterRef> = [id("aria"), id("x")].into_iter().collect();
        assert!(store.cleanup_orphans(&valid).await.is_empty());

        let valid: HashSet<CharacterRef> = [id("aria")].into_iter().collect();
        let report = store.cleanup_orphans(&valid).await;
        assert_eq!(report.vibes, 1);
        assert!(!store.has_disposition(&id("aria"), &id("x"), ActorRole::Pc).await);
    }

    #[tokio::test]
    async fn mirrored_changes_are_not_scheduled() {
        let store = store_with(MockSettingsRepo::new(), Arc::new(ManualClock::new(start())));
        store
            .mirror(|ledger, now| {
                ledger.set_connection(id("aria"), id("bram"), ConnectionLevel::Friend, now)
            })
            .await;
        assert_eq!(store.get_connection(&id("aria"), &id("bram")).await, ConnectionLevel::Friend);
        assert!(!store.is_dirty().await);
        assert!(store.flush_due().await.is_none());
    }
}
