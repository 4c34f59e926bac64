//! In-memory scene model implementing the host canvas port.
//!
//! Used by the binary (scene loaded from a JSON document) and by tests.
//! Walls are straight segments; a sight ray is blocked when it crosses one.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use npcvibes_domain::{CharacterRef, SceneId, TokenId, UserId};

use crate::infrastructure::ports::{CanvasPort, HostError, Point, TokenSnapshot};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wall {
    pub a: Point,
    pub b: Point,
    #[serde(default = "default_true")]
    pub blocks_sight: bool,
}

impl Wall {
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            a,
            b,
            blocks_sight: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub is_gm: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Serializable scene snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub scene_id: SceneId,
    #[serde(default)]
    pub tokens: Vec<TokenSnapshot>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    /// Actors that exist in the world without a token on this scene
    #[serde(default)]
    pub actors: Vec<CharacterRef>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    pub current_user: UserId,
}

impl SceneDocument {
    pub fn new(scene_id: impl Into<SceneId>, current_user: UserRecord) -> Self {
        Self {
            scene_id: scene_id.into(),
            tokens: Vec::new(),
            walls: Vec::new(),
            actors: Vec::new(),
            current_user: current_user.id.clone(),
            users: vec![current_user],
        }
    }
}

pub struct InMemoryCanvas {
    scene: Mutex<SceneDocument>,
}

impl InMemoryCanvas {
    pub fn new(mut scene: SceneDocument) -> Self {
        let scene_id = scene.scene_id.clone();
        for token in &mut scene.tokens {
            token.scene_id.get_or_insert_with(|| scene_id.clone());
        }
        Self {
            scene: Mutex::new(scene),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    fn with_scene<R>(&self, f: impl FnOnce(&mut SceneDocument) -> R) -> R {
        let mut scene = self.scene.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut scene)
    }

    pub fn scene_id(&self) -> SceneId {
        self.with_scene(|scene| scene.scene_id.clone())
    }

    /// Insert or replace a token. Tokens without a scene land on this one.
    pub fn upsert_token(&self, mut token: TokenSnapshot) {
        self.with_scene(|scene| {
            token
                .scene_id
                .get_or_insert_with(|| scene.scene_id.clone());
            match scene.tokens.iter_mut().find(|t| t.id == token.id) {
                Some(existing) => *existing = token,
                None => scene.tokens.push(token),
            }
        });
    }

    pub fn move_token(&self, id: &TokenId, position: Point) -> Option<TokenSnapshot> {
        self.with_scene(|scene| {
            let token = scene.tokens.iter_mut().find(|t| &t.id == id)?;
            token.position = position;
            Some(token.clone())
        })
    }

    pub fn set_hidden(&self, id: &TokenId, hidden: bool) -> Option<TokenSnapshot> {
        self.with_scene(|scene| {
            let token = scene.tokens.iter_mut().find(|t| &t.id == id)?;
            token.hidden = hidden;
            Some(token.clone())
        })
    }

    pub fn remove_token(&self, id: &TokenId) -> Option<TokenSnapshot> {
        self.with_scene(|scene| {
            let index = scene.tokens.iter().position(|t| &t.id == id)?;
            Some(scene.tokens.remove(index))
        })
    }

    pub fn add_wall(&self, wall: Wall) {
        self.with_scene(|scene| scene.walls.push(wall));
    }

    /// Register an actor that exists without a token on this scene.
    pub fn add_actor(&self, actor: CharacterRef) {
        self.with_scene(|scene| {
            if !scene.actors.contains(&actor) {
                scene.actors.push(actor);
            }
        });
    }

    /// Delete an actor from the world along with its tokens.
    pub fn delete_actor(&self, actor: &CharacterRef) {
        self.with_scene(|scene| {
            scene.actors.retain(|a| a != actor);
            scene.tokens.retain(|t| t.actor_ref() != Some(actor));
        });
    }

    pub fn add_user(&self, user: UserRecord) {
        self.with_scene(|scene| {
            scene.users.retain(|u| u.id != user.id);
            scene.users.push(user);
        });
    }

    pub fn set_current_user(&self, id: UserId) {
        self.with_scene(|scene| scene.current_user = id);
    }

    pub fn snapshot(&self) -> SceneDocument {
        self.with_scene(|scene| scene.clone())
    }
}

impl CanvasPort for InMemoryCanvas {
    fn is_ready(&self) -> bool {
        true
    }

    fn tokens(&self) -> Vec<TokenSnapshot> {
        self.with_scene(|scene| scene.tokens.clone())
    }

    fn token(&self, id: &TokenId) -> Option<TokenSnapshot> {
        self.with_scene(|scene| scene.tokens.iter().find(|t| &t.id == id).cloned())
    }

    fn tokens_for_actor(&self, actor: &CharacterRef) -> Vec<TokenSnapshot> {
        self.with_scene(|scene| {
            scene
                .tokens
                .iter()
                .filter(|t| t.actor_ref() == Some(actor))
                .cloned()
                .collect()
        })
    }

    fn line_of_sight(&self, from: Point, to: Point) -> Result<bool, HostError> {
        if ![from.x, from.y, to.x, to.y].iter().all(|c| c.is_finite()) {
            return Err(HostError::LineOfSight(
                "ray endpoints must be finite".to_string(),
            ));
        }
        Ok(self.with_scene(|scene| {
            !scene
                .walls
                .iter()
                .filter(|wall| wall.blocks_sight)
                .any(|wall| segments_intersect(from, to, wall.a, wall.b))
        }))
    }

    fn actor_refs(&self) -> HashSet<CharacterRef> {
        self.with_scene(|scene| {
            scene
                .actors
                .iter()
                .cloned()
                .chain(scene.tokens.iter().filter_map(|t| t.actor_ref().cloned()))
                .collect()
        })
    }

    fn active_owners(&self, actor: &CharacterRef) -> Vec<UserId> {
        self.with_scene(|scene| {
            let owners: HashSet<&UserId> = scene
                .tokens
                .iter()
                .filter_map(|t| t.actor.as_ref())
                .filter(|a| &a.actor_ref == actor)
                .flat_map(|a| a.owners.iter())
                .collect();
            scene
                .users
                .iter()
                .filter(|u| u.active && owners.contains(&u.id))
                .map(|u| u.id.clone())
                .collect()
        })
    }

    fn active_gm_ids(&self) -> Vec<UserId> {
        self.with_scene(|scene| {
            scene
                .users
                .iter()
                .filter(|u| u.active && u.is_gm)
                .map(|u| u.id.clone())
                .collect()
        })
    }

    fn current_user(&self) -> UserId {
        self.with_scene(|scene| scene.current_user.clone())
    }

    fn is_gm(&self) -> bool {
        self.with_scene(|scene| {
            scene
                .users
                .iter()
                .any(|u| u.id == scene.current_user && u.is_gm)
        })
    }
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segment p1-p2 touches segment q1-q2, endpoints included.
fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
