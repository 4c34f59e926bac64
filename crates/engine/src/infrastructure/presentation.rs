//! Presentation adapter that tracks active auras in memory.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use npcvibes_domain::{TokenId, UserId, VibeType};

use crate::infrastructure::ports::PresentationPort;

/// An aura currently drawn on a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aura {
    pub vibe: VibeType,
    pub color: &'static str,
    pub viewers: Vec<UserId>,
}

/// Logs aura changes and keeps the current aura per token.
#[derive(Default)]
pub struct TracingPresenter {
    auras: Mutex<BTreeMap<TokenId, Aura>>,
}

impl TracingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aura(&self, token_id: &TokenId) -> Option<Aura> {
        self.auras
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(token_id)
            .cloned()
    }

    pub fn aura_count(&self) -> usize {
        self.auras.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl PresentationPort for TracingPresenter {
    async fn show_aura(&self, token_id: &TokenId, vibe: VibeType, viewers: &[UserId]) {
        tracing::debug!(token_id = %token_id, vibe = %vibe, color = vibe.color(), "Showing vibe aura");
        self.auras.lock().unwrap_or_else(|p| p.into_inner()).insert(
            token_id.clone(),
            Aura {
                vibe,
                color: vibe.color(),
                viewers: viewers.to_vec(),
            },
        );
    }

    async fn remove_auras(&self, token_id: &TokenId) {
        if self
            .auras
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(token_id)
            .is_some()
        {
            tracing::debug!(token_id = %token_id, "Removed vibe aura");
        }
    }

    async fn clear_auras(&self) {
        self.auras.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}
