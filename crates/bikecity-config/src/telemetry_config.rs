use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "ws://192.168.1.100:8765";
pub const DEFAULT_MAX_BIKE_SPEED: f64 = 30.0;
pub const DEFAULT_MAX_GAME_SPEED: f64 = 100.0;
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Bike speed sensor connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TelemetryConfig {
    /// WebSocket endpoint of the sensor server.
    pub server_url: String,
    /// Bike speed (km/h) that maps to full game speed.
    pub max_bike_speed: f64,
    /// Game speed produced at `max_bike_speed`.
    pub max_game_speed: f64,
    /// Delay between reconnect attempts in milliseconds.
    pub reconnect_interval: u64,
    pub max_reconnect_attempts: u32,
    /// Socket open timeout in milliseconds.
    pub connect_timeout: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            max_bike_speed: DEFAULT_MAX_BIKE_SPEED,
            max_game_speed: DEFAULT_MAX_GAME_SPEED,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl TelemetryConfig {
    /// Config pointing at `server_url` with every other field at its default.
    pub fn with_url(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Replace unusable values with defaults.
    pub fn validate(&mut self) {
        if self.server_url.trim().is_empty() {
            self.server_url = DEFAULT_SERVER_URL.to_string();
        }
        if !self.max_bike_speed.is_finite() || self.max_bike_speed <= 0.0 {
            self.max_bike_speed = DEFAULT_MAX_BIKE_SPEED;
        }
        if !self.max_game_speed.is_finite() || self.max_game_speed < 0.0 {
            self.max_game_speed = DEFAULT_MAX_GAME_SPEED;
        }
        if self.connect_timeout == 0 {
            self.connect_timeout = DEFAULT_CONNECT_TIMEOUT_MS;
        }
    }
}
