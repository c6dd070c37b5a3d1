use serde::{Deserialize, Serialize};
use tracing::warn;

/// Key codes the game reads for each virtual key (browser key codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct KeyBindings {
    pub forward: i32,
    pub backward: i32,
    pub left: i32,
    pub right: i32,
    pub camera_up: i32,
    pub camera_down: i32,
    pub camera_left: i32,
    pub camera_right: i32,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: 'W' as i32,
            backward: 'S' as i32,
            left: 'A' as i32,
            right: 'D' as i32,
            camera_up: 38,
            camera_down: 40,
            camera_left: 37,
            camera_right: 39,
        }
    }
}

impl KeyBindings {
    fn codes_mut(&mut self) -> [(&'static str, &mut i32); 8] {
        [
            ("forward", &mut self.forward),
            ("backward", &mut self.backward),
            ("left", &mut self.left),
            ("right", &mut self.right),
            ("cameraUp", &mut self.camera_up),
            ("cameraDown", &mut self.camera_down),
            ("cameraLeft", &mut self.camera_left),
            ("cameraRight", &mut self.camera_right),
        ]
    }
}

/// Gamepad thresholds and key bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct InputConfig {
    /// R2 value above which forward is held.
    pub throttle_threshold: f32,
    /// L2 value above which backward is held.
    pub brake_threshold: f32,
    /// Left stick deflection beyond which left/right is held.
    pub steering_threshold: f32,
    /// Right stick deflection beyond which camera pan keys are held.
    pub camera_threshold: f32,
    /// Minimum input shown in the controller readout.
    pub display_threshold: f32,
    pub keys: KeyBindings,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            throttle_threshold: 0.2,
            brake_threshold: 0.2,
            steering_threshold: 0.4,
            camera_threshold: 0.2,
            display_threshold: 0.05,
            keys: KeyBindings::default(),
        }
    }
}

impl InputConfig {
    /// Replace out-of-range thresholds and key codes with defaults.
    pub fn validate(&mut self) {
        let defaults = InputConfig::default();
        let fix = |value: &mut f32, default: f32| {
            if !value.is_finite() || !(0.0..1.0).contains(&*value) {
                *value = default;
            }
        };
        fix(&mut self.throttle_threshold, defaults.throttle_threshold);
        fix(&mut self.brake_threshold, defaults.brake_threshold);
        fix(&mut self.steering_threshold, defaults.steering_threshold);
        fix(&mut self.camera_threshold, defaults.camera_threshold);
        fix(&mut self.display_threshold, defaults.display_threshold);

        let mut default_keys = KeyBindings::default();
        for ((name, code), (_, default)) in self
            .keys
            .codes_mut()
            .into_iter()
            .zip(default_keys.codes_mut())
        {
            if !(0..=255).contains(&*code) {
                warn!("key binding {} = {} out of range, using {}", name, code, default);
                *code = *default;
            }
        }
    }
}
