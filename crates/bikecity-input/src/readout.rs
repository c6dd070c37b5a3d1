use std::time::{Duration, Instant};

use bikecity_types::{StatusColor, StatusElement, StatusSink};

use crate::device::ControllerTransition;
use crate::gamepad::GamepadSnapshot;

/// How long the connect/disconnect toast stays visible.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// HUD output for the controller: connection toast and live input percentages.
pub struct ControllerReadout {
    display_threshold: f32,
    toast_hide_at: Option<Instant>,
    inputs_visible: bool,
}

impl ControllerReadout {
    pub fn new(display_threshold: f32) -> Self {
        Self {
            display_threshold,
            toast_hide_at: None,
            inputs_visible: false,
        }
    }

    /// Show the connect/disconnect toast.
    pub fn on_transition(
        &mut self,
        transition: &ControllerTransition,
        now: Instant,
        sink: &mut dyn StatusSink,
    ) {
        let (text, color) = match transition {
            ControllerTransition::Connected { .. } => {
                ("PlayStation Controller Connected!", StatusColor::ToastGreen)
            }
            ControllerTransition::Disconnected => {
                ("PlayStation Controller Disconnected!", StatusColor::ToastRed)
            }
        };
        sink.show(StatusElement::ControllerStatus, text, color);
        self.toast_hide_at = Some(now + TOAST_DURATION);
    }

    /// Refresh the input readout and expire the toast.
    pub fn update(&mut self, snapshot: &GamepadSnapshot, now: Instant, sink: &mut dyn StatusSink) {
        if self.toast_hide_at.is_some_and(|t| now >= t) {
            sink.hide(StatusElement::ControllerStatus);
            self.toast_hide_at = None;
        }

        match self.inputs_text(snapshot) {
            Some(text) => {
                sink.show(StatusElement::ControllerInputs, &text, StatusColor::White);
                self.inputs_visible = true;
            }
            None if self.inputs_visible => {
                sink.hide(StatusElement::ControllerInputs);
                self.inputs_visible = false;
            }
            None => {}
        }
    }

    /// Readout text while any control is past the display threshold.
    pub fn inputs_text(&self, snapshot: &GamepadSnapshot) -> Option<String> {
        let t = self.display_threshold;
        let active = snapshot.connected
            && (snapshot.throttle > t || snapshot.brake > t || snapshot.steering.abs() > t);
        if !active {
            return None;
        }
        Some(format!(
            "Controller Inputs:\nThrottle (R2): {:.0}%\nBrake (L2): {:.0}%\nSteering: {:.0}%",
            snapshot.throttle * 100.0,
            snapshot.brake * 100.0,
            snapshot.steering * 100.0
        ))
    }
}

#[cfg(test)]
mod tests {
    use bikecity_types::MemoryStatusSink;

    use super::*;

    #[test]
    fn toast_shown_then_hidden_after_three_seconds() {
        let mut readout = ControllerReadout::new(0.05);
        let mut sink = MemoryStatusSink::new();
        let t0 = Instant::now();

        readout.on_transition(
            &ControllerTransition::Connected {
                slot: 0,
                name: "DualSense".into(),
            },
            t0,
            &mut sink,
        );
        assert_eq!(
            sink.text(StatusElement::ControllerStatus),
            Some("PlayStation Controller Connected!")
        );
        assert_eq!(
            sink.color(StatusElement::ControllerStatus),
            Some(StatusColor::ToastGreen)
        );

        let idle = GamepadSnapshot::default();
        readout.update(&idle, t0 + Duration::from_secs(2), &mut sink);
        assert!(sink.is_visible(StatusElement::ControllerStatus));
        readout.update(&idle, t0 + Duration::from_secs(3), &mut sink);
        assert!(!sink.is_visible(StatusElement::ControllerStatus));
    }

    #[test]
    fn disconnect_toast_is_red() {
        let mut readout = ControllerReadout::new(0.05);
        let mut sink = MemoryStatusSink::new();
        readout.on_transition(&ControllerTransition::Disconnected, Instant::now(), &mut sink);
        assert_eq!(
            sink.text(StatusElement::ControllerStatus),
            Some("PlayStation Controller Disconnected!")
        );
        assert_eq!(
            sink.color(StatusElement::ControllerStatus),
            Some(StatusColor::ToastRed)
        );
    }

    #[test]
    fn inputs_text_percentages() {
        let readout = ControllerReadout::new(0.05);
        let snapshot = GamepadSnapshot {
            connected: true,
            throttle: 0.5,
            brake: 0.0,
            steering: -0.3,
            ..GamepadSnapshot::default()
        };
        let text = readout.inputs_text(&snapshot).unwrap();
        assert!(text.contains("Throttle (R2): 50%"));
        assert!(text.contains("Brake (L2): 0%"));
        assert!(text.contains("Steering: -30%"));
    }

    #[test]
    fn inputs_hidden_when_idle() {
        let mut readout = ControllerReadout::new(0.05);
        let mut sink = MemoryStatusSink::new();
        let now = Instant::now();
        let active = GamepadSnapshot {
            connected: true,
            throttle: 0.9,
            ..GamepadSnapshot::default()
        };
        readout.update(&active, now, &mut sink);
        assert!(sink.is_visible(StatusElement::ControllerInputs));

        let idle = GamepadSnapshot {
            connected: true,
            steering: 0.04,
            ..GamepadSnapshot::default()
        };
        readout.update(&idle, now, &mut sink);
        assert!(!sink.is_visible(StatusElement::ControllerInputs));

        let writes = sink.writes();
        readout.update(&idle, now, &mut sink);
        assert_eq!(sink.writes(), writes);
    }
}
