//! Application state shared across handlers

use crate::config::Settings;
use crate::dispatch::SearchDispatcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Settings the server was started with
    pub settings: Arc<Settings>,
    /// The one dispatcher every request goes through
    pub dispatcher: Arc<SearchDispatcher>,
}

impl AppState {
    pub fn new(settings: Settings, dispatcher: SearchDispatcher) -> Self {
        Self {
            settings: Arc::new(settings),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
