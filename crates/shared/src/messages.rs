//! Socket messages exchanged between connected processes
//!
//! Every process listens on [`SOCKET_CHANNEL`]. Only the GM process emits
//! `dispositionRolled`; peers react by updating visuals, never by re-rolling.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Unknown message types deserialize to `Unknown`

use serde::{Deserialize, Serialize};

use npcvibes_domain::{CharacterRef, ConnectionLevel, UserId, VibeRoll};

/// Socket channel name shared by every process of the module
pub const SOCKET_CHANNEL: &str = "module.pf2e-npc-vibes";

/// Freshly generated rolls for one PC/NPC pair.
///
/// A direction is absent when its vibe already existed and was not re-rolled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcomes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc_to_npc: Option<VibeRoll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc_to_pc: Option<VibeRoll>,
}

impl RollOutcomes {
    pub fn is_empty(&self) -> bool {
        self.pc_to_npc.is_none() && self.npc_to_pc.is_none()
    }

    /// Number of directions rolled
    pub fn len(&self) -> usize {
        usize::from(self.pc_to_npc.is_some()) + usize::from(self.npc_to_pc.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SocketMessage {
    /// New first-sight rolls for a pair
    #[serde(rename_all = "camelCase")]
    DispositionRolled {
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        outcomes: RollOutcomes,
    },
    /// Relationship state changed wholesale; peers refresh every visual
    DispositionChanged,
    /// A GM set a connection level
    #[serde(rename_all = "camelCase")]
    ConnectionChanged {
        pc_id: CharacterRef,
        npc_id: CharacterRef,
        level: ConnectionLevel,
        actor_id: UserId,
    },
    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

impl SocketMessage {
    /// Wire name of the message type, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SocketMessage::DispositionRolled { .. } => "dispositionRolled",
            SocketMessage::DispositionChanged => "dispositionChanged",
            SocketMessage::ConnectionChanged { .. } => "connectionChanged",
            SocketMessage::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;
    use npcvibes_domain::RollValue;

    #[test]
    fn disposition_rolled_uses_camel_case_fields() {
        let roll = VibeRoll::new(RollValue::new(20).expect("face"), "Bram", "Aria");
        let msg = SocketMessage::DispositionRolled {
            pc_id: CharacterRef::new("aria"),
            npc_id: CharacterRef::new("bram"),
            outcomes: RollOutcomes {
                pc_to_npc: None,
                npc_to_pc: Some(roll),
            },
        };

        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "dispositionRolled");
        assert_eq!(value["pcId"], "aria");
        assert_eq!(value["npcId"], "bram");
        assert_eq!(value["outcomes"]["npcToPc"]["vibe"], "awestruck");
        assert_eq!(value["outcomes"]["npcToPc"]["roll"], 20);
        assert!(value["outcomes"].get("pcToNpc").is_none());
    }

    #[test]
    fn disposition_changed_is_a_bare_tag() {
        let json = serde_json::to_string(&SocketMessage::DispositionChanged).expect("serialize");
        assert_eq!(json, r#"{"type":"dispositionChanged"}"#);
    }

    #[test]
    fn connection_changed_parses_from_peer_json() {
        let msg: SocketMessage = serde_json::from_str(
            r#"{"type":"connectionChanged","pcId":"aria","npcId":"bram","level":"Friend","actorId":"gm-1"}"#,
        )
        .expect("deserialize");
        assert_eq!(
            msg,
            SocketMessage::ConnectionChanged {
                pc_id: CharacterRef::new("aria"),
                npc_id: CharacterRef::new("bram"),
                level: ConnectionLevel::Friend,
                actor_id: UserId::new("gm-1"),
            }
        );
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let msg: SocketMessage =
            serde_json::from_str(r#"{"type":"somethingNew"}"#).expect("deserialize");
        assert_eq!(msg, SocketMessage::Unknown);
        assert_eq!(msg.kind(), "unknown");
    }

    #[test]
    fn outcome_counts() {
        let mut outcomes = RollOutcomes::default();
        assert!(outcomes.is_empty());
        outcomes.pc_to_npc = Some(VibeRoll::new(RollValue::new(1).expect("face"), "Aria", "Bram"));
        assert_eq!(outcomes.len(), 1);
    }
}
