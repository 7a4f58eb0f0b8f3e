//! Application state management

use tokio::sync::RwLock;

use crate::error::Result;
use crate::inference::InferenceEngine;
use crate::reporting::ReportState;
use crate::store::ModelStore;

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub store: ModelStore,
    pub inference: InferenceEngine,
    /// Summary and metrics of the last successful training run
    pub reports: RwLock<ReportState>,
}

impl AppState {
    /// Build the state, creating the artifacts directory if needed
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store = ModelStore::open(&config.artifacts_dir)?;
        Ok(Self {
            inference: InferenceEngine::new(store.clone()),
            store,
            config,
            reports: RwLock::new(ReportState::new()),
        })
    }
}
