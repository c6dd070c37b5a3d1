//! Main input processor that combines keyboard and gamepad into the game's key table.
//!
//! Owned by the game loop: call [`InputProcessor::update`] once per frame, forward
//! keyboard events as they arrive, and read keys with [`InputProcessor::query`].

use std::time::Instant;

use bikecity_config::InputConfig;
use bikecity_types::StatusSink;
use tracing::debug;

use crate::arbitration::arbitrate;
use crate::device::{ControllerTransition, DeviceType, KeyEvent};
use crate::error::Result;
use crate::gamepad::{GamepadBackend, GamepadPoller, GamepadSnapshot};
use crate::key_state::KeyStateTable;
use crate::keyboard::KeyboardListener;
use crate::readout::ControllerReadout;
use crate::virtual_key::{Thresholds, VirtualKeyStates};

pub struct InputProcessor {
    config: InputConfig,
    keyboard: KeyboardListener,
    gamepad: GamepadPoller,
    /// Virtual keys derived by the last poll, present while a gamepad is active.
    gamepad_keys: Option<VirtualKeyStates>,
    /// Merged table read by the game.
    keys: KeyStateTable,
    readout: ControllerReadout,
}

impl InputProcessor {
    pub fn new(config: InputConfig) -> Self {
        Self {
            keyboard: KeyboardListener::new(),
            gamepad: GamepadPoller::new(Thresholds::from(&config)),
            gamepad_keys: None,
            keys: KeyStateTable::new(),
            readout: ControllerReadout::new(config.display_threshold),
            config,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Poll the gamepad and rebuild the key table. Call once per frame.
    pub fn update(
        &mut self,
        backend: &mut dyn GamepadBackend,
        now: Instant,
        sink: &mut dyn StatusSink,
    ) -> Result<Option<ControllerTransition>> {
        let poll = self.gamepad.poll(backend);

        if let Some(transition) = &poll.transition {
            if matches!(transition, ControllerTransition::Connected { .. }) {
                debug!("Gamepad took over, releasing keyboard keys");
                self.keyboard.release_all();
            }
            self.readout.on_transition(transition, now, sink);
        }

        self.gamepad_keys = poll.keys;
        self.publish()?;
        self.readout.update(self.gamepad.snapshot(), now, sink);

        Ok(poll.transition)
    }

    /// Handle a raw keyboard event. Returns whether it changed keyboard state.
    pub fn on_key_event(&mut self, event: KeyEvent) -> Result<bool> {
        let applied = self.keyboard.handle(event, self.gamepad.is_connected())?;
        if applied {
            self.publish()?;
        }
        Ok(applied)
    }

    /// Whether the key is pressed in the merged table.
    pub fn query(&self, code: i32) -> Result<bool> {
        self.keys.query(code)
    }

    pub fn query_char(&self, key: char) -> Result<bool> {
        self.keys.query_char(key)
    }

    /// Set a key from game code. A connected gamepad still wins for its bound keys.
    pub fn set(&mut self, code: i32, pressed: bool) -> Result<()> {
        self.keyboard.set(code, pressed)?;
        self.publish()
    }

    pub fn keys(&self) -> &KeyStateTable {
        &self.keys
    }

    pub fn is_gamepad_connected(&self) -> bool {
        self.gamepad.is_connected()
    }

    /// Device currently driving the game keys.
    pub fn active_device(&self) -> DeviceType {
        if self.gamepad.is_connected() {
            DeviceType::Gamepad
        } else {
            DeviceType::Keyboard
        }
    }

    /// Latest gamepad snapshot (debug panel).
    pub fn gamepad_snapshot(&self) -> &GamepadSnapshot {
        self.gamepad.snapshot()
    }

    fn publish(&mut self) -> Result<()> {
        self.keys = arbitrate(
            self.keyboard.keys(),
            self.gamepad_keys.as_ref(),
            &self.config.keys,
        )?;
        Ok(())
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use bikecity_types::{MemoryStatusSink, StatusElement};

    use super::*;
    use crate::error::InputError;
    use crate::gamepad::VirtualGamepadBackend;

    #[test]
    fn set_then_gamepad_wins() {
        let mut input = InputProcessor::default();
        let mut backend = VirtualGamepadBackend::new();
        let mut sink = MemoryStatusSink::new();

        input.set('W' as i32, true).unwrap();
        assert_eq!(input.query_char('W'), Ok(true));

        // Pad connected with released triggers: forward must read false.
        backend.plug(0, "DualSense");
        input.update(&mut backend, Instant::now(), &mut sink).unwrap();
        assert_eq!(input.query_char('W'), Ok(false));

        // Game code cannot override the pad either.
        input.set('W' as i32, true).unwrap();
        assert_eq!(input.query_char('W'), Ok(false));
    }

    #[test]
    fn keyboard_events_ignored_while_pad_connected() {
        let mut input = InputProcessor::default();
        let mut backend = VirtualGamepadBackend::new();
        let mut sink = MemoryStatusSink::new();
        backend.plug(0, "DualSense");
        input.update(&mut backend, Instant::now(), &mut sink).unwrap();

        assert_eq!(input.on_key_event(KeyEvent::Down(32)), Ok(false));
        assert_eq!(input.query(32), Ok(false));
        assert_eq!(input.active_device(), DeviceType::Gamepad);
    }

    #[test]
    fn keyboard_resumes_after_disconnect_without_stuck_keys() {
        let mut input = InputProcessor::default();
        let mut backend = VirtualGamepadBackend::new();
        let mut sink = MemoryStatusSink::new();

        input.on_key_event(KeyEvent::Down('A' as i32)).unwrap();
        backend.plug(0, "DualSense").right_trigger = 1.0;
        input.update(&mut backend, Instant::now(), &mut sink).unwrap();
        assert_eq!(input.query_char('W'), Ok(true));
        assert_eq!(input.query_char('A'), Ok(false));

        backend.unplug(0);
        let transition = input.update(&mut backend, Instant::now(), &mut sink).unwrap();
        assert_eq!(transition, Some(ControllerTransition::Disconnected));
        assert_eq!(input.query_char('W'), Ok(false));
        assert_eq!(input.query_char('A'), Ok(false));

        input.on_key_event(KeyEvent::Down('D' as i32)).unwrap();
        assert_eq!(input.query_char('D'), Ok(true));
        assert_eq!(input.active_device(), DeviceType::Keyboard);
    }

    #[test]
    fn transition_shown_on_sink() {
        let mut input = InputProcessor::default();
        let mut backend = VirtualGamepadBackend::new();
        let mut sink = MemoryStatusSink::new();
        backend.plug(2, "DualShock 4");

        let transition = input.update(&mut backend, Instant::now(), &mut sink).unwrap();
        assert!(matches!(
            transition,
            Some(ControllerTransition::Connected { slot: 2, .. })
        ));
        assert!(sink.is_visible(StatusElement::ControllerStatus));
    }

    #[test]
    fn invalid_codes_surface_errors() {
        let mut input = InputProcessor::default();
        assert_eq!(input.query(256), Err(InputError::InvalidKeyCode(256)));
        assert_eq!(input.set(-1, true), Err(InputError::InvalidKeyCode(-1)));
        assert_eq!(
            input.on_key_event(KeyEvent::Up(400)),
            Err(InputError::InvalidKeyCode(400))
        );
    }
}
