//! Connection progression rules
//!
//! Suggestions are advisory: they never mutate anything and never jump past
//! Friend. BestFriend always needs the GM's call.

use crate::types::{ConnectionLevel, VibeType};

/// Whether moving from `current` to `proposed` is allowed.
pub fn is_valid_transition(current: ConnectionLevel, proposed: ConnectionLevel) -> bool {
    current.can_transition_to(proposed)
}

/// Interaction-count thresholds for suggesting the next level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionThresholds {
    /// Interactions needed to suggest Stranger → Acquaintance
    pub to_acquaintance: usize,
    /// Interactions needed to suggest Acquaintance → Friend; `None` means never
    pub to_friend: Option<usize>,
}

impl ProgressionThresholds {
    pub fn for_vibe(vibe: VibeType) -> Self {
        match vibe {
            VibeType::Awestruck => Self {
                to_acquaintance: 3,
                to_friend: Some(5),
            },
            VibeType::Curious => Self {
                to_acquaintance: 2,
                to_friend: Some(4),
            },
            VibeType::Repulsed => Self {
                to_acquaintance: 5,
                to_friend: None,
            },
            VibeType::None => Self {
                to_acquaintance: 3,
                to_friend: Some(6),
            },
        }
    }
}

/// Suggest a connection level from the PC's vibe and the pair's interaction count.
///
/// Returns `current` unchanged when no threshold is met or the suggestion
/// would be an invalid transition.
pub fn suggest_next_level(
    vibe: VibeType,
    interaction_count: usize,
    current: ConnectionLevel,
) -> ConnectionLevel {
    let thresholds = ProgressionThresholds::for_vibe(vibe);

    let suggested = match current {
        ConnectionLevel::Stranger if interaction_count >= thresholds.to_acquaintance => {
            ConnectionLevel::Acquaintance
        }
        ConnectionLevel::Acquaintance
            if thresholds
                .to_friend
                .is_some_and(|needed| interaction_count >= needed) =>
        {
            ConnectionLevel::Friend
        }
        _ => current,
    };

    if is_valid_transition(current, suggested) {
        suggested
    } else {
        current
    }
}

/// Roleplay advice for building a connection
pub fn connection_advice(vibe: VibeType, level: ConnectionLevel) -> String {
    let mut advice: Vec<String> = Vec::new();
    let is_stranger = level == ConnectionLevel::Stranger;

    match vibe {
        VibeType::Awestruck => {
            advice.push("This character inspires you. Building a connection could lead to mentorship or deep friendship.".into());
            if is_stranger {
                advice.push("Try to engage them in conversation about their impressive qualities.".into());
            }
        }
        VibeType::Curious => {
            advice.push("Your curiosity about this character creates natural opportunities for connection.".into());
            if is_stranger {
                advice.push("Ask questions and show genuine interest in their background or expertise.".into());
            }
        }
        VibeType::Repulsed => {
            advice.push("Despite your initial negative reaction, relationships can change over time.".into());
            advice.push("Try to understand what caused your repulsion and whether it can be overcome.".into());
            if is_stranger {
                advice.push("Small positive interactions might help overcome your initial impression.".into());
            }
        }
        VibeType::None => {
            advice.push("No strong initial impression means you can build this relationship naturally.".into());
        }
    }

    if let Some(progression) = level.progression_requirements() {
        advice.push(format!(
            "To become {}s, consider: {}.",
            progression.to.display_name().to_lowercase(),
            progression.requirements.join(", ")
        ));
    }

    advice.join(" ")
}
