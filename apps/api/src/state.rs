use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::matching::runner::MatchRunner;
use crate::store::{JobSource, MatchStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Scores pairs and persists results. Holds its own store handles.
    pub runner: MatchRunner,
    pub matches: Arc<dyn MatchStore>,
    pub jobs: Arc<dyn JobSource>,
    pub identity: Arc<dyn IdentityProvider>,
}
