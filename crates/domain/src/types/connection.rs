//! Connection level - staged social closeness between a PC and an NPC
//!
//! Four ordered levels, Stranger through BestFriend. Moving forward is one
//! step at a time; moving backward (or staying put) is always allowed.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship-closeness level between a PC and an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ConnectionLevel {
    /// No meaningful relationship
    #[default]
    Stranger,
    /// Casual familiarity
    Acquaintance,
    /// Genuine friendship
    Friend,
    /// One of the closest companions
    BestFriend,
}

/// What it takes to move up from a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRequirements {
    pub to: ConnectionLevel,
    pub requirements: &'static [&'static str],
}

impl ConnectionLevel {
    /// All levels in ascending order
    pub fn all() -> &'static [ConnectionLevel] {
        &[
            ConnectionLevel::Stranger,
            ConnectionLevel::Acquaintance,
            ConnectionLevel::Friend,
            ConnectionLevel::BestFriend,
        ]
    }

    /// Position in the progression (0-3)
    pub fn index(&self) -> usize {
        match self {
            ConnectionLevel::Stranger => 0,
            ConnectionLevel::Acquaintance => 1,
            ConnectionLevel::Friend => 2,
            ConnectionLevel::BestFriend => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    /// The next level up, if any
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// True if `proposed` is a backward move, a no-op, or exactly one step forward.
    pub fn can_transition_to(&self, proposed: ConnectionLevel) -> bool {
        proposed.index() <= self.index() || proposed.index() == self.index() + 1
    }

    /// Validate a transition, returning the new level.
    pub fn transition_to(&self, proposed: ConnectionLevel) -> Result<ConnectionLevel, DomainError> {
        if self.can_transition_to(proposed) {
            Ok(proposed)
        } else {
            Err(DomainError::invalid_state_transition(format!(
                "connection cannot jump from {} to {}",
                self, proposed
            )))
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConnectionLevel::Stranger => "Stranger",
            ConnectionLevel::Acquaintance => "Acquaintance",
            ConnectionLevel::Friend => "Friend",
            ConnectionLevel::BestFriend => "Best Friend",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConnectionLevel::Stranger => "You have no meaningful relationship with this character.",
            ConnectionLevel::Acquaintance => {
                "You know this character casually, such as a shopkeeper you buy from regularly."
            }
            ConnectionLevel::Friend => "You have a genuine friendship with this character.",
            ConnectionLevel::BestFriend => "This character is one of your closest companions.",
        }
    }

    /// Table-facing effects of holding this level
    pub fn mechanical_effects(&self) -> &'static [&'static str] {
        match self {
            ConnectionLevel::Stranger => &[],
            ConnectionLevel::Acquaintance => &[
                "Can attempt to Gather Information about them",
                "They might provide basic assistance if asked politely",
            ],
            ConnectionLevel::Friend => &[
                "Will provide reasonable assistance when asked",
                "Might offer information or aid without being asked",
                "Generally trustworthy and reliable",
            ],
            ConnectionLevel::BestFriend => &[
                "Will go out of their way to help you",
                "Shares important information freely",
                "Might take risks on your behalf",
                "Provides emotional support and counsel",
            ],
        }
    }

    /// Requirements for the next step up; `None` at BestFriend
    pub fn progression_requirements(&self) -> Option<ProgressionRequirements> {
        let requirements: &'static [&'static str] = match self {
            ConnectionLevel::Stranger => &[
                "Have at least one meaningful interaction",
                "Exchange names or basic information",
                "No hostile actions taken",
            ],
            ConnectionLevel::Acquaintance => &[
                "Multiple positive interactions",
                "Provide assistance or do a favor",
                "Share personal information or experiences",
                "Demonstrate trustworthiness",
            ],
            ConnectionLevel::Friend => &[
                "Significant shared experiences",
                "Mutual trust and respect established",
                "Provide major assistance or make sacrifices",
                "Deep personal connection formed",
            ],
            ConnectionLevel::BestFriend => return None,
        };
        self.next().map(|to| ProgressionRequirements { to, requirements })
    }
}

impl fmt::Display for ConnectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for ConnectionLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "stranger" => Ok(ConnectionLevel::Stranger),
            "acquaintance" => Ok(ConnectionLevel::Acquaintance),
            "friend" => Ok(ConnectionLevel::Friend),
            "bestfriend" => Ok(ConnectionLevel::BestFriend),
            _ => Err(DomainError::parse(format!("Unknown connection level: {}", s))),
        }
    }
}
