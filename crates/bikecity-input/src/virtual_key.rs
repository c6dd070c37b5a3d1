use bikecity_config::{InputConfig, KeyBindings};

/// Game-level input flags, independent of the device that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    Forward,
    Backward,
    Left,
    Right,
    CameraUp,
    CameraDown,
    CameraLeft,
    CameraRight,
}

impl VirtualKey {
    pub const COUNT: usize = 8;

    pub const ALL: [VirtualKey; Self::COUNT] = [
        VirtualKey::Forward,
        VirtualKey::Backward,
        VirtualKey::Left,
        VirtualKey::Right,
        VirtualKey::CameraUp,
        VirtualKey::CameraDown,
        VirtualKey::CameraLeft,
        VirtualKey::CameraRight,
    ];

    /// Key code bound to this virtual key.
    pub fn code(self, keys: &KeyBindings) -> i32 {
        match self {
            VirtualKey::Forward => keys.forward,
            VirtualKey::Backward => keys.backward,
            VirtualKey::Left => keys.left,
            VirtualKey::Right => keys.right,
            VirtualKey::CameraUp => keys.camera_up,
            VirtualKey::CameraDown => keys.camera_down,
            VirtualKey::CameraLeft => keys.camera_left,
            VirtualKey::CameraRight => keys.camera_right,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Analog-to-digital cutoffs applied to a gamepad snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub throttle: f32,
    pub brake: f32,
    pub steering: f32,
    pub camera: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&InputConfig::default())
    }
}

impl From<&InputConfig> for Thresholds {
    fn from(config: &InputConfig) -> Self {
        Self {
            throttle: config.throttle_threshold,
            brake: config.brake_threshold,
            steering: config.steering_threshold,
            camera: config.camera_threshold,
        }
    }
}

/// Pressed state of every virtual key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualKeyStates {
    states: [bool; VirtualKey::COUNT],
}

impl VirtualKeyStates {
    pub fn get(&self, key: VirtualKey) -> bool {
        self.states[key.index()]
    }

    pub fn set(&mut self, key: VirtualKey, pressed: bool) {
        self.states[key.index()] = pressed;
    }

    pub fn any(&self) -> bool {
        self.states.iter().any(|&s| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VirtualKey, bool)> + '_ {
        VirtualKey::ALL.iter().map(|&k| (k, self.get(k)))
    }
}
