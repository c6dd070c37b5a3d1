//! Configuration for the bikecity game bridge: telemetry connection and input mapping.

pub mod config;
pub mod input_config;
pub mod telemetry_config;

pub use config::Config;
pub use input_config::{InputConfig, KeyBindings};
pub use telemetry_config::TelemetryConfig;
