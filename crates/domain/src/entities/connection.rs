//! PC → NPC connection records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ConnectionLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub level: ConnectionLevel,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn new(level: ConnectionLevel, updated_at: DateTime<Utc>) -> Self {
        Self { level, updated_at }
    }
}
