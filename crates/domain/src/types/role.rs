//! Actor role - which side of a PC/NPC pair a character sits on

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role category of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Player-controlled character
    Pc,
    /// Non-player character
    Npc,
}

impl ActorRole {
    /// Map the host's actor type onto a role. Anything other than a
    /// character or npc actor (hazards, loot, vehicles) has no role.
    pub fn from_actor_type(actor_type: &str) -> Option<Self> {
        match actor_type {
            "character" => Some(ActorRole::Pc),
            "npc" => Some(ActorRole::Npc),
            _ => None,
        }
    }

    /// The role on the other side of a pair
    pub fn counterpart(&self) -> Self {
        match self {
            ActorRole::Pc => ActorRole::Npc,
            ActorRole::Npc => ActorRole::Pc,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Pc => write!(f, "pc"),
            ActorRole::Npc => write!(f, "npc"),
        }
    }
}

impl std::str::FromStr for ActorRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pc" | "character" => Ok(ActorRole::Pc),
            "npc" => Ok(ActorRole::Npc),
            other => Err(DomainError::parse(format!("Unknown actor role: {}", other))),
        }
    }
}
