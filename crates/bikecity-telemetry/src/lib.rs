//! Bike speed telemetry: a reconnecting WebSocket client for the sensor server, the HUD
//! readout, and a local test server.

pub mod client;
pub mod display;
pub mod probe;
pub mod protocol;
pub mod server;
pub mod session;

pub use client::{TelemetryClient, TelemetryCommand};
pub use display::SpeedReadout;
pub use probe::{ProbeReport, probe};
pub use protocol::{ProtocolError, SpeedMessage, parse_speed_message};
pub use server::{SpeedFeed, SpeedServer, SpeedServerHandle};
pub use session::{ConnectionState, ReconnectDecision, TelemetrySession};
