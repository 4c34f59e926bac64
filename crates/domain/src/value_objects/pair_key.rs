//! PC/NPC pair key
//!
//! The pair key is always PC first, NPC second, rendered as `pc-npc`. It keys
//! the session processed set and the interaction log.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::CharacterRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairKey {
    pc_id: CharacterRef,
    npc_id: CharacterRef,
}

impl PairKey {
    pub fn new(pc_id: CharacterRef, npc_id: CharacterRef) -> Self {
        Self { pc_id, npc_id }
    }

    pub fn pc_id(&self) -> &CharacterRef {
        &self.pc_id
    }

    pub fn npc_id(&self) -> &CharacterRef {
        &self.npc_id
    }

    /// Storage form, `pc-npc`
    pub fn as_key(&self) -> String {
        format!("{}-{}", self.pc_id, self.npc_id)
    }

    /// Whether a stored `pc-npc` key can be read as a pair of ids that both
    /// satisfy `is_valid`. Host ids may themselves contain dashes, so every
    /// split point is tried.
    pub fn stored_key_resolves(key: &str, is_valid: impl Fn(&str) -> bool) -> bool {
        key.match_indices('-')
            .any(|(i, _)| is_valid(&key[..i]) && is_valid(&key[i + 1..]))
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pc_id, self.npc_id)
    }
}
