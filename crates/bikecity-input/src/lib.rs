//! Input handling for the city game: a 256-key state table fed by the keyboard and
//! by a polled gamepad, with the gamepad taking priority while connected.

pub mod arbitration;
pub mod device;
pub mod error;
pub mod gamepad;
pub mod input_processor;
pub mod key_state;
pub mod keyboard;
pub mod readout;
pub mod virtual_key;

pub use arbitration::arbitrate;
pub use device::{ControllerTransition, DeviceType, KeyEvent};
pub use error::InputError;
pub use gamepad::{
    GamepadBackend, GamepadPoll, GamepadPoller, GamepadReading, GamepadSnapshot, GilrsBackend,
    VirtualGamepadBackend,
};
pub use input_processor::InputProcessor;
pub use key_state::KeyStateTable;
pub use keyboard::KeyboardListener;
pub use readout::ControllerReadout;
pub use virtual_key::{Thresholds, VirtualKey, VirtualKeyStates};
