use gilrs::{Axis, Button, Gilrs};
use tracing::{debug, info, trace, warn};

use crate::device::ControllerTransition;
use crate::virtual_key::{Thresholds, VirtualKey, VirtualKeyStates};

/// Raw state of one gamepad slot as reported by a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadReading {
    pub slot: usize,
    pub name: String,
    pub connected: bool,
    pub left_stick_x: f32,
    pub right_stick_x: f32,
    /// Up is positive.
    pub right_stick_y: f32,
    /// L2 pressure.
    pub left_trigger: f32,
    /// R2 pressure.
    pub right_trigger: f32,
}

/// Platform abstraction for gamepad state queries.
pub trait GamepadBackend {
    /// Current state of every known gamepad slot.
    fn read_slots(&mut self) -> Vec<GamepadReading>;
}

/// Virtual gamepad backend for testing and headless runs.
#[derive(Debug, Default)]
pub struct VirtualGamepadBackend {
    slots: Vec<GamepadReading>,
}

impl VirtualGamepadBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug a controller into `slot`, replacing whatever was there.
    pub fn plug(&mut self, slot: usize, name: &str) -> &mut GamepadReading {
        self.slots.retain(|s| s.slot != slot);
        let index = self.slots.len();
        self.slots.push(GamepadReading {
            slot,
            name: name.to_string(),
            connected: true,
            ..GamepadReading::default()
        });
        &mut self.slots[index]
    }

    pub fn unplug(&mut self, slot: usize) {
        if let Some(reading) = self.slot_mut(slot) {
            reading.connected = false;
        }
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut GamepadReading> {
        self.slots.iter_mut().find(|s| s.slot == slot)
    }
}

impl GamepadBackend for VirtualGamepadBackend {
    fn read_slots(&mut self) -> Vec<GamepadReading> {
        self.slots.clone()
    }
}

/// Hardware backend using gilrs.
pub struct GilrsBackend {
    gilrs: Gilrs,
}

impl GilrsBackend {
    /// Initialize gilrs. Returns `None` (and logs) when the platform has no gamepad support.
    pub fn new() -> Option<Self> {
        match Gilrs::new() {
            Ok(gilrs) => Some(Self { gilrs }),
            Err(e) => {
                warn!("Failed to initialize gamepad support: {}", e);
                None
            }
        }
    }
}

impl GamepadBackend for GilrsBackend {
    fn read_slots(&mut self) -> Vec<GamepadReading> {
        // Drain pending events so the cached gamepad state is current.
        while self.gilrs.next_event().is_some() {}

        self.gilrs
            .gamepads()
            .map(|(id, pad)| GamepadReading {
                slot: usize::from(id),
                name: pad.name().to_string(),
                connected: pad.is_connected(),
                left_stick_x: pad.value(Axis::LeftStickX),
                right_stick_x: pad.value(Axis::RightStickX),
                right_stick_y: pad.value(Axis::RightStickY),
                left_trigger: pad
                    .button_data(Button::LeftTrigger2)
                    .map_or(0.0, |b| b.value()),
                right_trigger: pad
                    .button_data(Button::RightTrigger2)
                    .map_or(0.0, |b| b.value()),
            })
            .collect()
    }
}

/// Per-frame controller values, also read by the debug panel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub connected: bool,
    /// Left stick X, -1 (left) to 1 (right).
    pub steering: f32,
    pub camera_horizontal: f32,
    /// Right stick Y, -1 (down) to 1 (up).
    pub camera_vertical: f32,
    /// R2, 0 to 1.
    pub throttle: f32,
    /// L2, 0 to 1.
    pub brake: f32,
}

impl GamepadSnapshot {
    fn from_reading(reading: &GamepadReading) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        let trigger = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            connected: true,
            steering: axis(reading.left_stick_x),
            camera_horizontal: axis(reading.right_stick_x),
            camera_vertical: axis(reading.right_stick_y),
            throttle: trigger(reading.right_trigger),
            brake: trigger(reading.left_trigger),
        }
    }

    /// Apply the threshold mapping to derive virtual key states.
    pub fn virtual_keys(&self, thresholds: &Thresholds) -> VirtualKeyStates {
        let mut keys = VirtualKeyStates::default();
        if !self.connected {
            return keys;
        }
        keys.set(VirtualKey::Forward, self.throttle > thresholds.throttle);
        keys.set(VirtualKey::Backward, self.brake > thresholds.brake);
        keys.set(VirtualKey::Left, self.steering < -thresholds.steering);
        keys.set(VirtualKey::Right, self.steering > thresholds.steering);
        keys.set(VirtualKey::CameraLeft, self.camera_horizontal < -thresholds.camera);
        keys.set(VirtualKey::CameraRight, self.camera_horizontal > thresholds.camera);
        keys.set(VirtualKey::CameraUp, self.camera_vertical > thresholds.camera);
        keys.set(VirtualKey::CameraDown, self.camera_vertical < -thresholds.camera);
        keys
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct GamepadPoll {
    pub transition: Option<ControllerTransition>,
    /// Derived key states, present while a controller is active.
    pub keys: Option<VirtualKeyStates>,
}

#[derive(Debug, Clone)]
struct ActiveController {
    slot: usize,
    name: String,
}

/// Polls the first connected gamepad once per frame.
pub struct GamepadPoller {
    thresholds: Thresholds,
    active: Option<ActiveController>,
    snapshot: GamepadSnapshot,
}

impl GamepadPoller {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            active: None,
            snapshot: GamepadSnapshot::default(),
        }
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Slot and name of the controller being read.
    pub fn active_controller(&self) -> Option<(usize, &str)> {
        self.active.as_ref().map(|a| (a.slot, a.name.as_str()))
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> &GamepadSnapshot {
        &self.snapshot
    }

    /// Read the backend and update the snapshot.
    pub fn poll(&mut self, backend: &mut dyn GamepadBackend) -> GamepadPoll {
        let readings = backend.read_slots();
        let selected = readings
            .iter()
            .filter(|r| r.connected)
            .min_by_key(|r| r.slot);

        let transition = match (selected, &self.active) {
            (Some(reading), None) => {
                info!("Gamepad detected: {} (slot {})", reading.name, reading.slot);
                Some(ControllerTransition::Connected {
                    slot: reading.slot,
                    name: reading.name.clone(),
                })
            }
            (None, Some(previous)) => {
                info!("Gamepad disconnected: {} (slot {})", previous.name, previous.slot);
                Some(ControllerTransition::Disconnected)
            }
            (Some(reading), Some(previous)) if reading.slot != previous.slot => {
                debug!("Gamepad switched to slot {}", reading.slot);
                None
            }
            _ => None,
        };

        self.active = selected.map(|r| ActiveController {
            slot: r.slot,
            name: r.name.clone(),
        });

        let Some(reading) = selected else {
            self.snapshot = GamepadSnapshot::default();
            return GamepadPoll {
                transition,
                keys: None,
            };
        };

        self.snapshot = GamepadSnapshot::from_reading(reading);
        let keys = self.snapshot.virtual_keys(&self.thresholds);
        if keys.any() {
            trace!("Controller inputs: {:?} -> {:?}", self.snapshot, keys);
        }

        GamepadPoll {
            transition,
            keys: Some(keys),
        }
    }
}

impl Default for GamepadPoller {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
