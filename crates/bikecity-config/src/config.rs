use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::input_config::InputConfig;
use crate::telemetry_config::TelemetryConfig;

/// Top-level configuration file (bikecity.json).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Config {
    pub telemetry: TelemetryConfig,
    pub input: InputConfig,
}

impl Config {
    pub fn validate(&mut self) {
        self.telemetry.validate();
        self.input.validate();
    }

    /// Read config from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&data)?;
        config.validate();
        Ok(config)
    }

    /// Read config from a JSON file, falling back to defaults when it does not exist.
    pub fn read_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write config to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
