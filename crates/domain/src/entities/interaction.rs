//! Interaction log entries - input for connection suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEntry {
    /// Free-form category, e.g. `conversation` or `favor`
    #[serde(alias = "type")]
    pub interaction_type: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEntry {
    pub fn new(
        interaction_type: impl Into<String>,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            interaction_type: interaction_type.into(),
            description: description.into(),
            timestamp,
        }
    }
}
