//! Sight use cases - who can see whom on the active scene.

mod visibility;

pub use visibility::{SightBlock, SightOutcome, VisibilityOracle};

use std::sync::Arc;

/// Container for sight use cases.
pub struct SightUseCases {
    pub oracle: Arc<VisibilityOracle>,
}

impl SightUseCases {
    pub fn new(oracle: Arc<VisibilityOracle>) -> Self {
        Self { oracle }
    }
}
