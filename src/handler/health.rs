//! Health check endpoint (`GET /health`)

use chrono::{SecondsFormat, Utc};
use hyper::StatusCode;
use serde::Serialize;

use crate::config::AppState;
use crate::http::{self, HttpResponse};

#[derive(Debug, Clone, Serialize)]
pub struct HealthRecord {
    pub status: &'static str,
    /// ISO-8601, UTC, millisecond precision
    pub timestamp: String,
    /// Seconds since startup
    pub uptime: f64,
    pub environment: String,
}

pub fn health_record(state: &AppState) -> HealthRecord {
    HealthRecord {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_secs(),
        environment: state.config.site.environment.clone(),
    }
}

pub fn handle_health(state: &AppState) -> HttpResponse {
    http::build_json_response(StatusCode::OK, &health_record(state))
}
