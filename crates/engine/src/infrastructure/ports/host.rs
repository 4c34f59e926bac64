//! Host scene port: the narrow view of tokens, actors and users the engine needs.
//!
//! The host owns the scene graph and the wall collision algorithm. The engine
//! only asks for token snapshots and a line-of-sight answer between two points.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use npcvibes_domain::{ActorRole, CharacterRef, SceneId, TokenId, UserId};

use super::error::HostError;

/// Actor trait that marks a creature as humanoid.
pub const HUMANOID_TRAIT: &str = "humanoid";

/// Token center in scene distance units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The character behind a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    /// Stable id, survives token deletion
    pub actor_ref: CharacterRef,
    pub name: String,
    /// Host actor type, `character` or `npc` for participants
    pub actor_type: String,
    #[serde(default)]
    pub traits: Vec<String>,
    /// Innate darkvision radius
    #[serde(default)]
    pub darkvision: Option<f64>,
    /// Innate low-light vision radius
    #[serde(default)]
    pub low_light_vision: Option<f64>,
    /// Users with owner permission
    #[serde(default)]
    pub owners: Vec<UserId>,
}

impl ActorSnapshot {
    pub fn role(&self) -> Option<ActorRole> {
        ActorRole::from_actor_type(&self.actor_type)
    }

    pub fn is_humanoid(&self) -> bool {
        self.traits
            .iter()
            .any(|t| t.eq_ignore_ascii_case(HUMANOID_TRAIT))
    }

    /// Innate vision radius, darkvision before low-light vision
    pub fn innate_sight_range(&self) -> Option<f64> {
        [self.darkvision, self.low_light_vision]
            .into_iter()
            .flatten()
            .find(|range| *range > 0.0)
    }
}

/// A token as the engine sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub name: String,
    #[serde(default)]
    pub scene_id: Option<SceneId>,
    #[serde(default)]
    pub actor: Option<ActorSnapshot>,
    pub position: Point,
    /// Hidden from players
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub vision_enabled: bool,
    /// Per-token sight radius override
    #[serde(default)]
    pub sight_range: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl TokenSnapshot {
    pub fn role(&self) -> Option<ActorRole> {
        self.actor.as_ref().and_then(ActorSnapshot::role)
    }

    pub fn actor_ref(&self) -> Option<&CharacterRef> {
        self.actor.as_ref().map(|actor| &actor.actor_ref)
    }

    /// Actor name, falling back to the token name
    pub fn display_name(&self) -> &str {
        self.actor
            .as_ref()
            .map(|actor| actor.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait CanvasPort: Send + Sync {
    /// Whether the scene is loaded and queryable
    fn is_ready(&self) -> bool;

    /// Every token on the active scene
    fn tokens(&self) -> Vec<TokenSnapshot>;

    fn token(&self, id: &TokenId) -> Option<TokenSnapshot>;

    /// Tokens on the active scene whose actor is `actor`
    fn tokens_for_actor(&self, actor: &CharacterRef) -> Vec<TokenSnapshot>;

    /// Whether a sight ray between two points is unobstructed.
    fn line_of_sight(&self, from: Point, to: Point) -> Result<bool, HostError>;

    /// Every actor that exists in the world, on scene or not
    fn actor_refs(&self) -> HashSet<CharacterRef>;

    /// Active users owning `actor`
    fn active_owners(&self, actor: &CharacterRef) -> Vec<UserId>;

    /// Active users with GM privilege
    fn active_gm_ids(&self) -> Vec<UserId>;

    /// The user this process runs as
    fn current_user(&self) -> UserId;

    /// Whether this process runs with GM privilege
    fn is_gm(&self) -> bool;
}
