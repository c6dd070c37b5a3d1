//! Keyboard event listener.
//!
//! Keeps the keyboard's own view of the key table. Events arriving while a gamepad
//! is connected are dropped so the controller stays the only source for the game keys.

use tracing::trace;

use crate::device::KeyEvent;
use crate::error::Result;
use crate::key_state::KeyStateTable;

pub struct KeyboardListener {
    keys: KeyStateTable,
    /// Events dropped because a gamepad had priority.
    dropped: u64,
}

impl KeyboardListener {
    pub fn new() -> Self {
        Self {
            keys: KeyStateTable::new(),
            dropped: 0,
        }
    }

    /// Apply a key-down/key-up event unless a gamepad is connected.
    ///
    /// Returns whether the event was applied. Invalid key codes are rejected
    /// regardless of gamepad state.
    pub fn handle(&mut self, event: KeyEvent, gamepad_connected: bool) -> Result<bool> {
        KeyStateTable::index(event.code())?;
        if gamepad_connected {
            self.dropped += 1;
            trace!("Keyboard event {:?} ignored, gamepad connected", event);
            return Ok(false);
        }
        self.keys.set(event.code(), event.pressed())?;
        Ok(true)
    }

    pub fn on_key_down(&mut self, code: i32, gamepad_connected: bool) -> Result<bool> {
        self.handle(KeyEvent::Down(code), gamepad_connected)
    }

    pub fn on_key_up(&mut self, code: i32, gamepad_connected: bool) -> Result<bool> {
        self.handle(KeyEvent::Up(code), gamepad_connected)
    }

    /// Write a key directly, bypassing the gamepad check.
    pub fn set(&mut self, code: i32, pressed: bool) -> Result<()> {
        self.keys.set(code, pressed)
    }

    /// Release every key (called when a gamepad takes over).
    pub fn release_all(&mut self) {
        self.keys.clear();
    }

    pub fn keys(&self) -> &KeyStateTable {
        &self.keys
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }
}

impl Default for KeyboardListener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;

    #[test]
    fn key_down_and_up_without_gamepad() {
        let mut kb = KeyboardListener::new();
        assert_eq!(kb.on_key_down(87, false), Ok(true));
        assert_eq!(kb.keys().query(87), Ok(true));
        assert_eq!(kb.on_key_up(87, false), Ok(true));
        assert_eq!(kb.keys().query(87), Ok(false));
    }

    #[test]
    fn events_dropped_while_gamepad_connected() {
        let mut kb = KeyboardListener::new();
        assert_eq!(kb.on_key_down(65, true), Ok(false));
        assert_eq!(kb.keys().query(65), Ok(false));

        kb.on_key_down(68, false).unwrap();
        assert_eq!(kb.on_key_up(68, true), Ok(false));
        assert_eq!(kb.keys().query(68), Ok(true));
        assert_eq!(kb.dropped_events(), 2);
    }

    #[test]
    fn invalid_code_rejected_even_when_gamepad_connected() {
        let mut kb = KeyboardListener::new();
        assert_eq!(kb.on_key_down(300, true), Err(InputError::InvalidKeyCode(300)));
        assert_eq!(kb.on_key_up(-5, false), Err(InputError::InvalidKeyCode(-5)));
        assert_eq!(kb.dropped_events(), 0);
    }

    #[test]
    fn release_all() {
        let mut kb = KeyboardListener::new();
        kb.on_key_down(87, false).unwrap();
        kb.set(38, true).unwrap();
        kb.release_all();
        assert!(kb.keys().pressed_codes().is_empty());
    }
}
