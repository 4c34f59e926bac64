//! External service ports: chat whispers, cross-process broadcast, and visuals.

use async_trait::async_trait;

use npcvibes_domain::{ConnectionLevel, TokenId, UserId, VibeRoll, VibeType};
use npcvibes_shared::SocketMessage;

use super::error::TransportError;

// =============================================================================
// Messaging
// =============================================================================

/// A whisper the engine asks the host to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A PC and an NPC saw each other for the first time
    FirstSight { pc_name: String, npc_name: String },
    /// A significant vibe was rolled
    VibeRolled {
        source_name: String,
        target_name: String,
        roll: VibeRoll,
        first_sight: bool,
    },
    ConnectionUpdated {
        pc_name: String,
        npc_name: String,
        from: ConnectionLevel,
        to: ConnectionLevel,
    },
    /// Advisory connection progression
    ConnectionSuggestion {
        pc_name: String,
        npc_name: String,
        current: ConnectionLevel,
        suggested: ConnectionLevel,
        interaction_count: usize,
        vibe: VibeType,
    },
}

impl Notification {
    pub fn title(&self) -> String {
        match self {
            Notification::FirstSight { .. } => "First Sight".to_string(),
            Notification::VibeRolled { roll, .. } => format!("{} Vibe", roll.vibe.display_name()),
            Notification::ConnectionUpdated { .. } => "Connection Updated".to_string(),
            Notification::ConnectionSuggestion { .. } => "Connection Suggestion".to_string(),
        }
    }

    /// Plain-text message body
    pub fn body(&self) -> String {
        match self {
            Notification::FirstSight { pc_name, npc_name } => format!(
                "{pc_name} and {npc_name} see each other for the first time. Rolling for vibes..."
            ),
            Notification::VibeRolled {
                source_name,
                target_name,
                roll,
                first_sight,
            } => {
                let mut body = String::new();
                if *first_sight {
                    body.push_str(&format!(
                        "First sight between {source_name} and {target_name}. "
                    ));
                }
                body.push_str(&format!(
                    "{source_name} feels {} towards {target_name}. {}",
                    roll.vibe.display_name().to_lowercase(),
                    roll.flavor_text
                ));
                body
            }
            Notification::ConnectionUpdated {
                pc_name,
                npc_name,
                from,
                to,
            } => format!(
                "Connection between {pc_name} and {npc_name} changed from {} to {}",
                from.display_name(),
                to.display_name()
            ),
            Notification::ConnectionSuggestion {
                pc_name,
                npc_name,
                current,
                suggested,
                interaction_count,
                vibe,
            } => format!(
                "Connection suggestion: {pc_name} and {npc_name} could progress from {} to {} ({interaction_count} interactions, {} vibe)",
                current.display_name(),
                suggested.display_name(),
                vibe.display_name().to_lowercase()
            ),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Whisper a notification to the given users.
    async fn whisper(
        &self,
        recipients: &[UserId],
        notification: &Notification,
    ) -> Result<(), TransportError>;

    /// Show an error toast to the local user.
    async fn alert(&self, message: &str) -> Result<(), TransportError>;
}

// =============================================================================
// Broadcast
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BroadcastPort: Send + Sync {
    /// Emit a message to every other connected process.
    async fn emit(&self, message: &SocketMessage) -> Result<(), TransportError>;
}

// =============================================================================
// Presentation
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresentationPort: Send + Sync {
    /// Show (or replace) the vibe aura on a token for the given viewers.
    async fn show_aura(&self, token_id: &TokenId, vibe: VibeType, viewers: &[UserId]);

    /// Remove every aura attached to a token.
    async fn remove_auras(&self, token_id: &TokenId);

    /// Remove every aura on the canvas.
    async fn clear_auras(&self);
}
