//! Application state for the web server.
//!
//! Only configuration is shared between requests. Every upload fits its own
//! models, so there is nothing to lock.

use anyhow::Result;
use ecoscan_core::{PipelineConfig, Settings};
use std::sync::Arc;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    settings: Arc<Settings>,
}

impl AppState {
    /// Validate settings and wrap them for sharing across handlers.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Pipeline parameters applied to every upload.
    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.settings.pipeline
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.settings.server.max_upload_bytes
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.settings.server.allowed_origins
    }
}
