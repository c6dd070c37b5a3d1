/// Input device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Keyboard,
    Gamepad,
}

/// Raw keyboard event delivered by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(i32),
    Up(i32),
}

impl KeyEvent {
    pub fn code(self) -> i32 {
        match self {
            KeyEvent::Down(code) | KeyEvent::Up(code) => code,
        }
    }

    pub fn pressed(self) -> bool {
        matches!(self, KeyEvent::Down(_))
    }
}

/// Change in which controller (if any) is driving the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerTransition {
    Connected { slot: usize, name: String },
    Disconnected,
}
