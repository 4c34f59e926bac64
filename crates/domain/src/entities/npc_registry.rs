//! NPC registry entries
//!
//! Every NPC that has been resolved to a stable id is remembered here so that
//! cleanup can tell which ids have gone stale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcRegistryEntry {
    pub display_name: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl NpcRegistryEntry {
    pub fn new(display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            display_name: display_name.into(),
            first_seen: now,
            last_seen: now,
        }
    }

    /// Refresh the name and last-seen time, keeping first-seen.
    pub fn touch(&mut self, display_name: impl Into<String>, now: DateTime<Utc>) {
        self.display_name = display_name.into();
        self.last_seen = now;
    }
}
