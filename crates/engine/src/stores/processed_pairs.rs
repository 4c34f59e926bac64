//! Session-scoped set of PC/NPC pairs that already had their first sight.
//!
//! Not persisted. Cleared by a full refresh or an explicit clear.

use dashmap::DashSet;

use npcvibes_domain::PairKey;

#[derive(Default)]
pub struct ProcessedPairs {
    pairs: DashSet<PairKey>,
}

impl ProcessedPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pair: &PairKey) -> bool {
        self.pairs.contains(pair)
    }

    /// Mark a pair processed. Returns false if it already was.
    pub fn mark(&self, pair: PairKey) -> bool {
        self.pairs.insert(pair)
    }

    pub fn clear(&self) -> usize {
        let count = self.pairs.len();
        self.pairs.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Sorted storage keys, for diagnostics
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pairs.iter().map(|pair| pair.as_key()).collect();
        keys.sort();
        keys
    }
}
