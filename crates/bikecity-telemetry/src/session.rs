use std::time::Duration;

use bikecity_config::TelemetryConfig;
use tracing::{debug, warn};

use crate::protocol::{ProtocolError, parse_speed_message};

/// Connection state of the sensor socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// What to do after the socket was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait `delay`, then open the socket again.
    Retry { attempt: u32, delay: Duration },
    /// Attempt cap reached; stay disconnected until a manual restart.
    GiveUp,
}

/// State of one telemetry session across reconnects.
///
/// Transport-free: the client task feeds socket lifecycle events in and acts on the
/// returned decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySession {
    config: TelemetryConfig,
    state: ConnectionState,
    current_speed_kmh: f64,
    reconnect_attempts: u32,
    exhausted: bool,
    /// Successful socket opens over the session's lifetime.
    connections: u64,
    messages_received: u64,
    /// Sensor timestamp of the last accepted frame.
    last_timestamp: Option<f64>,
}

impl TelemetrySession {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            current_speed_kmh: 0.0,
            reconnect_attempts: 0,
            exhausted: false,
            connections: 0,
            messages_received: 0,
            last_timestamp: None,
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn current_speed_kmh(&self) -> f64 {
        self.current_speed_kmh
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Whether the reconnect cap was hit and the session gave up.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn connections(&self) -> u64 {
        self.connections
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// A socket open is starting.
    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// The socket opened.
    pub fn on_open(&mut self) {
        self.state = ConnectionState::Connected;
        self.reconnect_attempts = 0;
        self.exhausted = false;
        self.connections += 1;
    }

    /// Apply an inbound text frame. Malformed frames are dropped without touching state.
    pub fn on_message(&mut self, text: &str) -> Result<f64, ProtocolError> {
        match parse_speed_message(text) {
            Ok(message) => {
                self.current_speed_kmh = message.speed;
                self.last_timestamp = message.timestamp.or(self.last_timestamp);
                self.messages_received += 1;
                debug!("Received speed: {} km/h", message.speed);
                Ok(message.speed)
            }
            Err(e) => {
                warn!("Error parsing speed data: {}", e);
                Err(e)
            }
        }
    }

    /// The socket closed or failed (including a failed open).
    ///
    /// Returns `None` when the session was already disconnected, so an error followed by
    /// a close only counts once.
    pub fn on_connection_lost(&mut self) -> Option<ReconnectDecision> {
        if self.state == ConnectionState::Disconnected {
            return None;
        }
        self.state = ConnectionState::Disconnected;

        if self.reconnect_attempts < self.config.max_reconnect_attempts {
            self.reconnect_attempts += 1;
            Some(ReconnectDecision::Retry {
                attempt: self.reconnect_attempts,
                delay: self.config.reconnect_delay(),
            })
        } else {
            self.exhausted = true;
            Some(ReconnectDecision::GiveUp)
        }
    }

    /// Manual stop. No reconnect follows.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Manual restart after giving up: clears the attempt counter.
    pub fn restart(&mut self) {
        self.reconnect_attempts = 0;
        self.exhausted = false;
    }

    /// Game speed derived from the bike, or `None` to fall back to keyboard/gamepad.
    pub fn speed_input(&self) -> Option<f64> {
        if self.is_connected() && self.current_speed_kmh > 0.0 {
            let normalized = (self.current_speed_kmh / self.config.max_bike_speed).min(1.0);
            Some(normalized * self.config.max_game_speed)
        } else {
            None
        }
    }

    /// Speed text for the HUD.
    pub fn speed_display(&self) -> String {
        if self.is_connected() {
            format!("{:.1}", self.current_speed_kmh)
        } else {
            "Disconnected".to_string()
        }
    }
}
