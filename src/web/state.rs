//! Application state shared across handlers

use crate::config::Settings;
use crate::launcher::Launcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    pub launcher: Arc<Launcher>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, launcher: Launcher) -> Self {
        Self {
            settings: Arc::new(settings),
            launcher: Arc::new(launcher),
        }
    }
}
