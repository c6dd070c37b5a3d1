use bikecity_types::{StatusColor, StatusElement, StatusSink};

use crate::session::TelemetrySession;

/// Speed above which the bike is considered to be driving the game.
pub const BIKE_CONTROL_MIN_SPEED: f64 = 0.1;

/// Renders the bike speed and connection status readout.
#[derive(Debug, Default)]
pub struct SpeedReadout;

impl SpeedReadout {
    pub fn render(session: &TelemetrySession, sink: &mut dyn StatusSink) {
        let connected = session.is_connected();
        let speed = session.speed_display();

        sink.show(StatusElement::SpeedValue, &speed, StatusColor::White);
        let bike_speed = if connected { speed.as_str() } else { "--" };
        sink.show(StatusElement::BikeSpeedValue, bike_speed, StatusColor::White);

        if connected {
            sink.show(
                StatusElement::ConnectionStatus,
                "Connected",
                StatusColor::Green,
            );
        } else {
            sink.show(
                StatusElement::ConnectionStatus,
                "Disconnected",
                StatusColor::Red,
            );
        }

        let (mode, color) = match (connected, session.current_speed_kmh()) {
            (true, kmh) if kmh > BIKE_CONTROL_MIN_SPEED => ("Bike Control", StatusColor::Green),
            (true, _) => ("Gamepad/Keyboard", StatusColor::Yellow),
            (false, _) => ("Gamepad/Keyboard", StatusColor::White),
        };
        sink.show(StatusElement::ControlMode, mode, color);
    }
}
