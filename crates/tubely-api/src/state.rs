//! Application state shared by handlers

use crate::services::upload::UploadPipeline;
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::Storage;

pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<UploadPipeline>,
    /// Used directly to serve `/assets`
    pub storage: Arc<dyn Storage>,
}
