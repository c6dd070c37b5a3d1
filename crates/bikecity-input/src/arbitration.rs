use bikecity_config::KeyBindings;

use crate::error::Result;
use crate::key_state::KeyStateTable;
use crate::virtual_key::VirtualKeyStates;

/// Merge keyboard and gamepad state into the table the game reads.
///
/// Keyboard state is the base. When a gamepad is active its derived state replaces
/// the keyboard value for every bound virtual key, pressed or not. Virtual keys bound
/// to the same code are OR-ed.
pub fn arbitrate(
    keyboard: &KeyStateTable,
    gamepad: Option<&VirtualKeyStates>,
    bindings: &KeyBindings,
) -> Result<KeyStateTable> {
    let mut merged = keyboard.clone();
    if let Some(gamepad) = gamepad {
        for (key, _) in gamepad.iter() {
            merged.set(key.code(bindings), false)?;
        }
        for (key, pressed) in gamepad.iter() {
            if pressed {
                merged.set(key.code(bindings), true)?;
            }
        }
    }
    Ok(merged)
}
