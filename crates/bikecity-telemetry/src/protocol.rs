use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit string sent by the sensor server.
pub const SPEED_UNIT: &str = "km/h";

/// Speed frame streamed by the sensor server.
///
/// Only `speed` is required; the Raspberry Pi server also sends a Unix timestamp and the unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedMessage {
    /// Bike speed in km/h.
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl SpeedMessage {
    pub fn new(speed: f64, timestamp: f64) -> Self {
        Self {
            speed,
            timestamp: Some(timestamp),
            unit: Some(SPEED_UNIT.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed speed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid speed value {0}")]
    InvalidSpeed(f64),
    #[error("unsupported speed unit {0:?}")]
    UnsupportedUnit(String),
}

/// Parse one text frame into a speed message.
pub fn parse_speed_message(text: &str) -> Result<SpeedMessage, ProtocolError> {
    let message: SpeedMessage = serde_json::from_str(text)?;
    if !message.speed.is_finite() || message.speed < 0.0 {
        return Err(ProtocolError::InvalidSpeed(message.speed));
    }
    if let Some(unit) = message.unit.as_deref().filter(|u| *u != SPEED_UNIT) {
        return Err(ProtocolError::UnsupportedUnit(unit.to_string()));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_only() {
        let m = parse_speed_message(r#"{"speed": 15}"#).unwrap();
        assert_eq!(m.speed, 15.0);
        assert_eq!(m.timestamp, None);
        assert_eq!(m.unit, None);
    }

    #[test]
    fn full_sensor_frame() {
        let m =
            parse_speed_message(r#"{"speed": 12.5, "timestamp": 1700000000.25, "unit": "km/h"}"#)
                .unwrap();
        assert_eq!(m.speed, 12.5);
        assert_eq!(m.timestamp, Some(1_700_000_000.25));
        assert_eq!(m.unit.as_deref(), Some("km/h"));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let m = parse_speed_message(r#"{"speed": 3, "cadence": 80}"#).unwrap();
        assert_eq!(m.speed, 3.0);
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            parse_speed_message("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            parse_speed_message(r#"{"rpm": 3}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            parse_speed_message(r#"{"speed": "fast"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_negative_speed() {
        assert!(matches!(
            parse_speed_message(r#"{"speed": -1}"#),
            Err(ProtocolError::InvalidSpeed(_))
        ));
    }

    #[test]
    fn rejects_other_units() {
        assert!(matches!(
            parse_speed_message(r#"{"speed": 10, "unit": "mph"}"#),
            Err(ProtocolError::UnsupportedUnit(u)) if u == "mph"
        ));
    }

    #[test]
    fn to_json_includes_unit() {
        let json = SpeedMessage::new(2.5, 10.0).to_json().unwrap();
        let back = parse_speed_message(&json).unwrap();
        assert_eq!(back, SpeedMessage::new(2.5, 10.0));
        assert!(json.contains(r#""unit":"km/h""#));
    }
}
