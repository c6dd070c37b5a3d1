use std::time::Instant;

use bikecity_config::InputConfig;
use bikecity_input::{
    ControllerTransition, InputProcessor, KeyEvent, VirtualGamepadBackend, VirtualKey,
};
use bikecity_types::MemoryStatusSink;

fn frame(input: &mut InputProcessor, backend: &mut VirtualGamepadBackend) {
    let mut sink = MemoryStatusSink::new();
    input.update(backend, Instant::now(), &mut sink).unwrap();
}

#[test]
fn every_key_starts_released() {
    let input = InputProcessor::default();
    for code in 0..=255 {
        assert_eq!(input.query(code), Ok(false), "code {}", code);
    }
}

#[test]
fn throttle_half_presses_only_forward() {
    let mut input = InputProcessor::default();
    let mut backend = VirtualGamepadBackend::new();
    backend.plug(0, "DualSense").right_trigger = 0.5;
    frame(&mut input, &mut backend);

    let bindings = InputConfig::default().keys;
    for key in VirtualKey::ALL {
        let expected = key == VirtualKey::Forward;
        assert_eq!(input.query(key.code(&bindings)), Ok(expected), "{:?}", key);
    }
}

#[test]
fn steering_left_presses_a_not_d() {
    let mut input = InputProcessor::default();
    let mut backend = VirtualGamepadBackend::new();
    backend.plug(0, "DualSense").left_stick_x = -0.5;
    frame(&mut input, &mut backend);

    assert_eq!(input.query_char('A'), Ok(true));
    assert_eq!(input.query_char('D'), Ok(false));
}

#[test]
fn keyboard_then_gamepad_conflict() {
    let mut input = InputProcessor::default();
    let mut backend = VirtualGamepadBackend::new();

    input.on_key_event(KeyEvent::Down('S' as i32)).unwrap();
    assert_eq!(input.query_char('S'), Ok(true));

    backend.plug(0, "DualSense").left_trigger = 0.0;
    frame(&mut input, &mut backend);
    assert_eq!(input.query_char('S'), Ok(false));

    // Held keyboard key while the pad is connected still does nothing.
    input.on_key_event(KeyEvent::Down('S' as i32)).unwrap();
    assert_eq!(input.query_char('S'), Ok(false));

    backend.slot_mut(0).unwrap().left_trigger = 0.8;
    frame(&mut input, &mut backend);
    assert_eq!(input.query_char('S'), Ok(true));
}

#[test]
fn custom_thresholds_and_bindings() {
    let mut config = InputConfig::default();
    config.steering_threshold = 0.1;
    config.keys.right = 39;
    let mut input = InputProcessor::new(config);
    let mut backend = VirtualGamepadBackend::new();
    backend.plug(0, "DualSense").left_stick_x = 0.2;

    let mut sink = MemoryStatusSink::new();
    let transition = input
        .update(&mut backend, Instant::now(), &mut sink)
        .unwrap();
    assert!(matches!(transition, Some(ControllerTransition::Connected { .. })));
    assert_eq!(input.query(39), Ok(true));
    assert_eq!(input.query_char('D'), Ok(false));
}
