// Application state module
// Read-only state shared by the request handlers

use std::time::Instant;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Reference point for the health check uptime
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            started_at: Instant::now(),
        }
    }

    /// Seconds elapsed since the state was created
    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
