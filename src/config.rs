use std::time::Duration;

use crate::error::{AppError, Result};
use crate::types::CheckKind;

pub const MONITOR_BASE_URL: &str = "http://localhost:5000";

/// App health re-check period once continuous polling begins (seconds).
pub const APP_HEALTH_INTERVAL_SECS: u64 = 10;

/// Active-user count re-check period (seconds).
pub const USER_COUNT_INTERVAL_SECS: u64 = 5;

/// Interface status re-check period (seconds).
pub const INTERFACE_INTERVAL_SECS: u64 = 10;

/// Delay between the staggered startup checks (milliseconds).
pub const STARTUP_STAGGER_MS: u64 = 800;

/// Per-request timeout for status fetches (milliseconds).
pub const REQUEST_TIMEOUT_MS: u64 = 5000;

/// Channel capacity for check failure reports.
pub const FAILURE_CHANNEL_CAPACITY: usize = 1024;

/// Timing of the startup sequence and the three continuous cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadences {
    pub startup_stagger: Duration,
    pub app_health: Duration,
    pub user_count: Duration,
    pub interfaces: Duration,
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            startup_stagger: Duration::from_millis(STARTUP_STAGGER_MS),
            app_health: Duration::from_secs(APP_HEALTH_INTERVAL_SECS),
            user_count: Duration::from_secs(USER_COUNT_INTERVAL_SECS),
            interfaces: Duration::from_secs(INTERFACE_INTERVAL_SECS),
        }
    }
}

impl Cadences {
    pub fn period(&self, check: CheckKind) -> Duration {
        match check {
            CheckKind::AppHealth => self.app_health,
            CheckKind::UserCount => self.user_count,
            CheckKind::Interfaces => self.interfaces,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub app_id: u64,
    /// Interface rows present at startup (INTERFACE_IDS, comma-separated).
    pub interface_ids: Vec<String>,
    pub log_level: String,
    pub api_port: u16,
    pub request_timeout: Duration,
    pub cadences: Cadences,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let app_id = std::env::var("APP_ID")
            .map_err(|_| AppError::Config("APP_ID must be set".to_string()))?
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::Config("APP_ID must be a non-negative integer".to_string()))?;

        let stagger_ms = std::env::var("STARTUP_STAGGER_MS")
            .unwrap_or_else(|_| STARTUP_STAGGER_MS.to_string())
            .parse::<u64>()
            .unwrap_or(STARTUP_STAGGER_MS);

        Ok(Self {
            base_url: std::env::var("MONITOR_BASE_URL")
                .unwrap_or_else(|_| MONITOR_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            app_id,
            interface_ids: parse_id_list(&std::env::var("INTERFACE_IDS").unwrap_or_default()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            request_timeout: Duration::from_millis(
                std::env::var("REQUEST_TIMEOUT_MS")
                    .unwrap_or_else(|_| REQUEST_TIMEOUT_MS.to_string())
                    .parse::<u64>()
                    .unwrap_or(REQUEST_TIMEOUT_MS),
            ),
            cadences: Cadences {
                startup_stagger: Duration::from_millis(stagger_ms),
                ..Cadences::default()
            },
        })
    }
}

/// Split a comma-separated id list, dropping blanks and duplicates while keeping order.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
