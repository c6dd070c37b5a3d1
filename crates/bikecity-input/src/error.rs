use thiserror::Error;

use crate::key_state::KeyStateTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid key code {0} (expected 0..{max})", max = KeyStateTable::SIZE)]
    InvalidKeyCode(i32),
    #[error("character {0:?} has no key code")]
    UnmappedChar(char),
}

pub type Result<T> = std::result::Result<T, InputError>;
