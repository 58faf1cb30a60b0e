use dropsort_core::{Config, SortingEngine};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    engine: Arc<SortingEngine>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<SortingEngine>) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &SortingEngine {
        self.engine.as_ref()
    }
}
