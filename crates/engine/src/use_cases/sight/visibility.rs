//! Visibility oracle - decides whether one token can see another.
//!
//! The checks run in a fixed order and stop at the first failure. Any host
//! error along the way counts as "cannot see". Answers are memoized per
//! directed token pair for a short window.

use std::sync::Arc;

use chrono::Duration;

use npcvibes_domain::{ActorRole, TokenId, VibeSettings};

use crate::infrastructure::cache::TtlCache;
use crate::infrastructure::ports::{CanvasPort, ClockPort, HostError, TokenSnapshot};
use crate::stores::SettingsStore;

/// Why a sight check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SightBlock {
    /// Not one PC and one NPC, or the same character twice
    InvalidPair,
    DifferentScene,
    /// Subject hidden from players and the local user is not a GM
    Hidden,
    VisionDisabled,
    OutOfRange,
    Obstructed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SightOutcome {
    Visible,
    Blocked(SightBlock),
}

impl SightOutcome {
    pub fn is_visible(&self) -> bool {
        matches!(self, SightOutcome::Visible)
    }
}

type SightKey = (TokenId, TokenId);

pub struct VisibilityOracle {
    canvas: Arc<dyn CanvasPort>,
    settings: Arc<SettingsStore>,
    memo: TtlCache<SightKey, bool>,
}

impl VisibilityOracle {
    pub fn new(
        canvas: Arc<dyn CanvasPort>,
        settings: Arc<SettingsStore>,
        clock: Arc<dyn ClockPort>,
        memo_ttl: Duration,
    ) -> Self {
        Self {
            canvas,
            settings,
            memo: TtlCache::new(memo_ttl, clock),
        }
    }

    /// Whether `observer` can currently see `subject`.
    ///
    /// Never fails: errors are logged and answered with `false`.
    pub async fn can_see(&self, observer: &TokenSnapshot, subject: &TokenSnapshot) -> bool {
        let key = (observer.id.clone(), subject.id.clone());
        if let Some(visible) = self.memo.get(&key).await {
            return visible;
        }

        let settings = self.settings.current().await;
        let visible = match self.evaluate(observer, subject, &settings) {
            Ok(SightOutcome::Visible) => true,
            Ok(SightOutcome::Blocked(reason)) => {
                tracing::debug!(
                    observer = %observer.id,
                    subject = %subject.id,
                    reason = ?reason,
                    "Sight blocked"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    observer = %observer.id,
                    subject = %subject.id,
                    error = %e,
                    "Sight check failed, treating as not visible"
                );
                false
            }
        };

        self.memo.insert(key, visible).await;
        visible
    }

    /// Run the check pipeline without touching the memo.
    pub fn evaluate(
        &self,
        observer: &TokenSnapshot,
        subject: &TokenSnapshot,
        settings: &VibeSettings,
    ) -> Result<SightOutcome, HostError> {
        let (observer_role, subject_role) = match (observer.role(), subject.role()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(SightOutcome::Blocked(SightBlock::InvalidPair)),
        };
        if observer_role == subject_role
            || observer.id == subject.id
            || observer.actor_ref() == subject.actor_ref()
        {
            return Ok(SightOutcome::Blocked(SightBlock::InvalidPair));
        }

        match (&observer.scene_id, &subject.scene_id) {
            (Some(a), Some(b)) if a == b => {}
            _ => return Ok(SightOutcome::Blocked(SightBlock::DifferentScene)),
        }

        if subject.hidden && !self.canvas.is_gm() {
            return Ok(SightOutcome::Blocked(SightBlock::Hidden));
        }

        let vision_exempt = observer_role == ActorRole::Npc && settings.npc_vision_exempt;
        if !observer.vision_enabled && !vision_exempt {
            return Ok(SightOutcome::Blocked(SightBlock::VisionDisabled));
        }

        let distance = observer.position.distance_to(subject.position);
        if !distance.is_finite() {
            return Err(HostError::Token(format!(
                "non-finite distance between {} and {}",
                observer.id, subject.id
            )));
        }
        if distance > sight_range(observer, settings) {
            return Ok(SightOutcome::Blocked(SightBlock::OutOfRange));
        }

        if settings.ignore_walls {
            return Ok(SightOutcome::Visible);
        }
        if self
            .canvas
            .line_of_sight(observer.position, subject.position)?
        {
            Ok(SightOutcome::Visible)
        } else {
            Ok(SightOutcome::Blocked(SightBlock::Obstructed))
        }
    }

    /// Drop memoized answers involving a token. Returns how many were dropped.
    pub async fn invalidate_token(&self, token_id: &TokenId) -> usize {
        self.memo
            .remove_where(|(observer, subject)| observer == token_id || subject == token_id)
            .await
    }

    pub async fn clear(&self) {
        self.memo.clear().await;
    }

    /// Drop memoized answers that have outlived the TTL.
    pub async fn evict_expired(&self) -> usize {
        self.memo.cleanup_expired().await
    }

    pub async fn set_memo_ttl(&self, ttl: Duration) {
        self.memo.set_ttl(ttl).await;
    }
}

/// Effective sight radius: token override, then innate vision, then the
/// world default.
fn sight_range(observer: &TokenSnapshot, settings: &VibeSettings) -> f64 {
    observer
        .sight_range
        .filter(|range| range.is_finite() && *range > 0.0)
        .or_else(|| {
            observer
                .actor
                .as_ref()
                .and_then(|actor| actor.innate_sight_range())
        })
        .unwrap_or(settings.default_sight_range)
}
