use crate::error::{InputError, Result};

/// Pressed state for the 256 key codes the game can query.
///
/// Every entry starts released. Codes outside `0..SIZE` are rejected with
/// [`InputError::InvalidKeyCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStateTable {
    keys: [bool; Self::SIZE],
}

impl KeyStateTable {
    pub const SIZE: usize = 256;

    pub fn new() -> Self {
        Self {
            keys: [false; Self::SIZE],
        }
    }

    /// Validate a key code and convert it to a table index.
    pub fn index(code: i32) -> Result<usize> {
        usize::try_from(code)
            .ok()
            .filter(|&i| i < Self::SIZE)
            .ok_or(InputError::InvalidKeyCode(code))
    }

    /// Whether the key is currently pressed.
    pub fn query(&self, code: i32) -> Result<bool> {
        Ok(self.keys[Self::index(code)?])
    }

    pub fn set(&mut self, code: i32, pressed: bool) -> Result<()> {
        self.keys[Self::index(code)?] = pressed;
        Ok(())
    }

    /// Look up a key by its letter or digit, the way the game asks for `'W'`.
    ///
    /// Letters are case-insensitive (key codes for letters are the upper-case ASCII values).
    pub fn query_char(&self, key: char) -> Result<bool> {
        self.query(char_code(key)?)
    }

    pub fn set_char(&mut self, key: char, pressed: bool) -> Result<()> {
        self.set(char_code(key)?, pressed)
    }

    /// Release every key.
    pub fn clear(&mut self) {
        self.keys.fill(false);
    }

    /// Codes of all pressed keys, ascending.
    pub fn pressed_codes(&self) -> Vec<i32> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(i, _)| i as i32)
            .collect()
    }
}

impl Default for KeyStateTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Key code of a letter or digit key.
pub fn char_code(key: char) -> Result<i32> {
    if key.is_ascii_alphanumeric() {
        Ok(key.to_ascii_uppercase() as i32)
    } else {
        Err(InputError::UnmappedChar(key))
    }
}
