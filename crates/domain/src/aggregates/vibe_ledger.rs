//! VibeLedger aggregate - the world's complete relationship state
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: mutation only through methods
//! - **One document**: the ledger IS the persisted JSON snapshot
//! - **Directional**: PC→NPC and NPC→PC vibes live in separate maps
//!
//! The ledger itself does not refuse to overwrite a vibe; write-once is the
//! coordinator's job (it checks `has_vibe` before rolling).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ConnectionRecord, DirectedVibe, InteractionEntry, NpcRegistryEntry, VibeRecord};
use crate::error::DomainError;
use crate::ids::CharacterRef;
use crate::types::{ActorRole, ConnectionLevel, VibeType};
use crate::value_objects::PairKey;

/// Current snapshot format version
pub const LEDGER_VERSION: u32 = 1;

/// Top-level keys every imported snapshot must carry
pub const REQUIRED_SNAPSHOT_KEYS: [&str; 4] = [
    "pcDispositions",
    "npcDispositions",
    "connections",
    "npcRegistry",
];

/// source → target → record
pub type VibeMap = BTreeMap<CharacterRef, BTreeMap<CharacterRef, VibeRecord>>;

/// pc → npc → record
pub type ConnectionMap = BTreeMap<CharacterRef, BTreeMap<CharacterRef, ConnectionRecord>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMetadata {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for LedgerMetadata {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            last_updated: None,
        }
    }
}

/// What an orphan sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub registry_entries: usize,
    pub vibes: usize,
    pub connections: usize,
    pub interaction_logs: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.registry_entries + self.vibes + self.connections + self.interaction_logs
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// All relationship state for one world
///
/// # Invariants
///
/// - At most one vibe per (source, target, source role)
/// - At most one connection per (pc, npc); absent means Stranger
/// - Interaction logs are append-only outside of cleanup and reset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeLedger {
    pc_dispositions: VibeMap,
    npc_dispositions: VibeMap,
    connections: ConnectionMap,
    npc_registry: BTreeMap<CharacterRef, NpcRegistryEntry>,
    #[serde(default)]
    interactions: BTreeMap<String, Vec<InteractionEntry>>,
    #[serde(default)]
    metadata: LedgerMetadata,
}

impl VibeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Snapshot import / export
    // =========================================================================

    /// Parse an exported snapshot, rejecting documents that lack any of the
    /// four required mappings.
    pub fn from_snapshot_json(json: &str) -> Result<Self, DomainError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_snapshot_value(value)
    }

    pub fn from_snapshot_value(value: serde_json::Value) -> Result<Self, DomainError> {
        let missing: Vec<&'static str> = match value.as_object() {
            Some(object) => REQUIRED_SNAPSHOT_KEYS
                .iter()
                .copied()
                .filter(|key| !object.contains_key(*key))
                .collect(),
            None => REQUIRED_SNAPSHOT_KEYS.to_vec(),
        };
        if !missing.is_empty() {
            return Err(DomainError::malformed_snapshot(missing));
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_snapshot_json(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // =========================================================================
    // Vibes
    // =========================================================================

    fn vibes(&self, role: ActorRole) -> &VibeMap {
        match role {
            ActorRole::Pc => &self.pc_dispositions,
            ActorRole::Npc => &self.npc_dispositions,
        }
    }

    fn vibes_mut(&mut self, role: ActorRole) -> &mut VibeMap {
        match role {
            ActorRole::Pc => &mut self.pc_dispositions,
            ActorRole::Npc => &mut self.npc_dispositions,
        }
    }

    pub fn vibe(
        &self,
        source: &CharacterRef,
        target: &CharacterRef,
        source_role: ActorRole,
    ) -> Option<&VibeRecord> {
        self.vibes(source_role).get(source)?.get(target)
    }

    pub fn directed_vibe(
        &self,
        source: &CharacterRef,
        target: &CharacterRef,
        source_role: ActorRole,
    ) -> Option<DirectedVibe> {
        self.vibe(source, target, source_role).map(|record| {
            DirectedVibe::from_record(source.clone(), target.clone(), source_role, record)
        })
    }

    pub fn has_vibe(
        &self,
        source: &CharacterRef,
        target: &CharacterRef,
        source_role: ActorRole,
    ) -> bool {
        self.vibe(source, target, source_role).is_some()
    }

    /// Upsert the vibe for one direction.
    pub fn record_vibe(
        &mut self,
        source: CharacterRef,
        target: CharacterRef,
        source_role: ActorRole,
        vibe: VibeType,
        now: DateTime<Utc>,
    ) {
        self.vibes_mut(source_role)
            .entry(source)
            .or_default()
            .insert(target, VibeRecord::new(vibe, now));
    }

    /// Every vibe a PC holds, keyed by NPC
    pub fn pc_vibes<'a>(
        &'a self,
        pc_id: &CharacterRef,
    ) -> impl Iterator<Item = (&'a CharacterRef, &'a VibeRecord)> + 'a {
        self.pc_dispositions.get(pc_id).into_iter().flatten()
    }

    /// Every vibe an NPC holds, keyed by PC
    pub fn npc_vibes<'a>(
        &'a self,
        npc_id: &CharacterRef,
    ) -> impl Iterator<Item = (&'a CharacterRef, &'a VibeRecord)> + 'a {
        self.npc_dispositions.get(npc_id).into_iter().flatten()
    }

    pub fn pc_dispositions(&self) -> &VibeMap {
        &self.pc_dispositions
    }

    pub fn npc_dispositions(&self) -> &VibeMap {
        &self.npc_dispositions
    }

    /// Number of stored vibes across both directions
    pub fn vibe_count(&self) -> usize {
        self.pc_dispositions
            .values()
            .chain(self.npc_dispositions.values())
            .map(BTreeMap::len)
            .sum()
    }

    // =========================================================================
    // Connections
    // =========================================================================

    pub fn connection(&self, pc_id: &CharacterRef, npc_id: &CharacterRef) -> Option<&ConnectionRecord> {
        self.connections.get(pc_id)?.get(npc_id)
    }

    /// Connection level, Stranger when never set
    pub fn connection_level(&self, pc_id: &CharacterRef, npc_id: &CharacterRef) -> ConnectionLevel {
        self.connection(pc_id, npc_id)
            .map(|record| record.level)
            .unwrap_or_default()
    }

    /// Unconditional upsert. Callers validate the transition first.
    pub fn set_connection(
        &mut self,
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        level: ConnectionLevel,
        now: DateTime<Utc>,
    ) {
        self.connections
            .entry(pc_id)
            .or_default()
            .insert(npc_id, ConnectionRecord::new(level, now));
    }

    pub fn pc_connections<'a>(
        &'a self,
        pc_id: &CharacterRef,
    ) -> impl Iterator<Item = (&'a CharacterRef, &'a ConnectionRecord)> + 'a {
        self.connections.get(pc_id).into_iter().flatten()
    }

    pub fn connections(&self) -> &ConnectionMap {
        &self.connections
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Append to the pair's log, returning the new log length.
    pub fn append_interaction(&mut self, pair: &PairKey, entry: InteractionEntry) -> usize {
        let log = self.interactions.entry(pair.as_key()).or_default();
        log.push(entry);
        log.len()
    }

    pub fn interactions(&self, pair: &PairKey) -> &[InteractionEntry] {
        self.interactions
            .get(&pair.as_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // =========================================================================
    // NPC registry
    // =========================================================================

    /// Register or refresh an NPC. Returns true when the NPC is new.
    pub fn register_npc(
        &mut self,
        npc_id: CharacterRef,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> bool {
        match self.npc_registry.get_mut(&npc_id) {
            Some(entry) => {
                entry.touch(display_name, now);
                false
            }
            None => {
                self.npc_registry
                    .insert(npc_id, NpcRegistryEntry::new(display_name, now));
                true
            }
        }
    }

    pub fn npc_registry(&self) -> &BTreeMap<CharacterRef, NpcRegistryEntry> {
        &self.npc_registry
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Remove everything that references an id `is_valid` rejects.
    ///
    /// Nested maps cascade: an invalid outer id drops its whole inner map, a
    /// valid outer id keeps only its valid inner entries.
    pub fn cleanup_orphans(&mut self, is_valid: impl Fn(&str) -> bool) -> CleanupReport {
        let mut report = CleanupReport::default();

        let before = self.npc_registry.len();
        self.npc_registry.retain(|id, _| is_valid(id.as_str()));
        report.registry_entries = before - self.npc_registry.len();

        report.vibes = prune_nested(&mut self.pc_dispositions, &is_valid)
            + prune_nested(&mut self.npc_dispositions, &is_valid);
        report.connections = prune_nested(&mut self.connections, &is_valid);

        let before = self.interactions.len();
        self.interactions
            .retain(|key, _| PairKey::stored_key_resolves(key, &is_valid));
        report.interaction_logs = before - self.interactions.len();

        report
    }

    pub fn metadata(&self) -> &LedgerMetadata {
        &self.metadata
    }

    /// Stamp the ledger before it is persisted.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.metadata.version = LEDGER_VERSION;
        self.metadata.last_updated = Some(now);
    }

    pub fn is_empty(&self) -> bool {
        self.pc_dispositions.is_empty()
            && self.npc_dispositions.is_empty()
            && self.connections.is_empty()
            && self.npc_registry.is_empty()
            && self.interactions.is_empty()
    }
}

fn prune_nested<V>(
    map: &mut BTreeMap<CharacterRef, BTreeMap<CharacterRef, V>>,
    is_valid: &impl Fn(&str) -> bool,
) -> usize {
    let mut removed = 0;
    map.retain(|outer, inner| {
        if !is_valid(outer.as_str()) {
            removed += inner.len();
            return false;
        }
        let before = inner.len();
        inner.retain(|id, _| is_valid(id.as_str()));
        removed += before - inner.len();
        true
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn id(value: &str) -> CharacterRef {
        CharacterRef::new(value)
    }

    #[test]
    fn test_directions_are_independent() {
        let mut ledger = VibeLedger::new();
        ledger.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Repulsed, now());

        assert!(ledger.has_vibe(&id("aria"), &id("bram"), ActorRole::Pc));
        assert!(!ledger.has_vibe(&id("bram"), &id("aria"), ActorRole::Npc));

        ledger.record_vibe(id("bram"), id("aria"), ActorRole::Npc, VibeType::Awestruck, now());
        assert_eq!(
            ledger.vibe(&id("aria"), &id("bram"), ActorRole::Pc).map(|r| r.vibe),
            Some(VibeType::Repulsed)
        );
        assert_eq!(
            ledger.vibe(&id("bram"), &id("aria"), ActorRole::Npc).map(|r| r.vibe),
            Some(VibeType::Awestruck)
        );
        assert_eq!(ledger.vibe_count(), 2);
    }

    #[test]
    fn test_connection_defaults_to_stranger() {
        let mut ledger = VibeLedger::new();
        assert_eq!(
            ledger.connection_level(&id("aria"), &id("bram")),
            ConnectionLevel::Stranger
        );
        ledger.set_connection(id("aria"), id("bram"), ConnectionLevel::Friend, now());
        assert_eq!(
            ledger.connection_level(&id("aria"), &id("bram")),
            ConnectionLevel::Friend
        );
    }

    #[test]
    fn test_register_npc_keeps_first_seen() {
        let mut ledger = VibeLedger::new();
        let first = now();
        let later = first + chrono::Duration::minutes(5);

        assert!(ledger.register_npc(id("bram"), "Bram", first));
        assert!(!ledger.register_npc(id("bram"), "Bram the Smith", later));

        let entry = &ledger.npc_registry()[&id("bram")];
        assert_eq!(entry.first_seen, first);
        assert_eq!(entry.last_seen, later);
        assert_eq!(entry.display_name, "Bram the Smith");
    }

    #[test]
    fn test_snapshot_layout_uses_documented_keys() {
        let mut ledger = VibeLedger::new();
        ledger.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Curious, now());
        ledger.set_connection(id("aria"), id("bram"), ConnectionLevel::Acquaintance, now());

        let value = serde_json::to_value(&ledger).expect("serialize");
        for key in REQUIRED_SNAPSHOT_KEYS {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(
            value["pcDispositions"]["aria"]["bram"]["dispositionType"],
            "curious"
        );
        assert_eq!(value["connections"]["aria"]["bram"]["level"], "Acquaintance");
    }

    #[test]
    fn test_import_rejects_missing_keys() {
        let err = VibeLedger::from_snapshot_json(r#"{ "pcDispositions": {} }"#)
            .expect_err("must reject");
        assert_eq!(
            err,
            DomainError::malformed_snapshot(vec!["npcDispositions", "connections", "npcRegistry"])
        );
    }

    #[test]
    fn test_import_rejects_non_object() {
        let err = VibeLedger::from_snapshot_json("[]").expect_err("must reject");
        assert!(matches!(err, DomainError::MalformedSnapshot { ref missing } if missing.len() == 4));
    }

    #[test]
    fn test_import_accepts_documents_without_interactions() {
        let json = r#"{
            "pcDispositions": { "aria": { "bram": { "dispositionType": "awestruck", "createdAt": "2025-03-01T18:00:00Z" } } },
            "npcDispositions": {},
            "connections": {},
            "npcRegistry": {}
        }"#;
        let ledger = VibeLedger::from_snapshot_json(json).expect("import");
        assert_eq!(
            ledger.vibe(&id("aria"), &id("bram"), ActorRole::Pc).map(|r| r.vibe),
            Some(VibeType::Awestruck)
        );
        assert_eq!(ledger.metadata().version, LEDGER_VERSION);
    }

    #[test]
    fn test_export_then_import_preserves_state() {
        let mut ledger = VibeLedger::new();
        ledger.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Curious, now());
        ledger.register_npc(id("bram"), "Bram", now());
        ledger.append_interaction(
            &PairKey::new(id("aria"), id("bram")),
            InteractionEntry::new("conversation", "Haggled over a sword", now()),
        );

        let json = ledger.to_snapshot_json().expect("export");
        let restored = VibeLedger::from_snapshot_json(&json).expect("import");
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_cleanup_removes_only_orphans() {
        let mut ledger = VibeLedger::new();
        ledger.register_npc(id("bram"), "Bram", now());
        ledger.register_npc(id("x"), "Ghost", now());
        ledger.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Curious, now());
        ledger.record_vibe(id("aria"), id("x"), ActorRole::Pc, VibeType::Repulsed, now());
        ledger.record_vibe(id("x"), id("aria"), ActorRole::Npc, VibeType::None, now());
        ledger.record_vibe(id("bram"), id("aria"), ActorRole::Npc, VibeType::None, now());
        ledger.set_connection(id("aria"), id("x"), ConnectionLevel::Friend, now());
        ledger.set_connection(id("aria"), id("bram"), ConnectionLevel::Acquaintance, now());
        ledger.append_interaction(
            &PairKey::new(id("aria"), id("x")),
            InteractionEntry::new("conversation", "", now()),
        );
        ledger.append_interaction(
            &PairKey::new(id("aria"), id("bram")),
            InteractionEntry::new("conversation", "", now()),
        );

        let valid = ["aria", "bram"];
        let report = ledger.cleanup_orphans(|candidate| valid.contains(&candidate));

        assert_eq!(report.registry_entries, 1);
        assert_eq!(report.vibes, 2);
        assert_eq!(report.connections, 1);
        assert_eq!(report.interaction_logs, 1);

        assert!(!ledger.npc_registry().contains_key("x"));
        assert!(!ledger.has_vibe(&id("aria"), &id("x"), ActorRole::Pc));
        assert!(!ledger.has_vibe(&id("x"), &id("aria"), ActorRole::Npc));
        assert!(ledger.connection(&id("aria"), &id("x")).is_none());

        assert!(ledger.has_vibe(&id("aria"), &id("bram"), ActorRole::Pc));
        assert!(ledger.has_vibe(&id("bram"), &id("aria"), ActorRole::Npc));
        assert_eq!(
            ledger.connection_level(&id("aria"), &id("bram")),
            ConnectionLevel::Acquaintance
        );
        assert_eq!(ledger.interactions(&PairKey::new(id("aria"), id("bram"))).len(), 1);
    }

    #[test]
    fn test_cleanup_with_all_valid_is_a_no_op() {
        let mut ledger = VibeLedger::new();
        ledger.record_vibe(id("aria"), id("bram"), ActorRole::Pc, VibeType::Curious, now());
        let before = ledger.clone();
        assert!(ledger.cleanup_orphans(|_| true).is_empty());
        assert_eq!(ledger, before);
    }
}
