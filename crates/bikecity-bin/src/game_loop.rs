use std::time::{Duration, Instant};

use anyhow::Result;
use bikecity_config::Config;
use bikecity_input::{
    GamepadBackend, GilrsBackend, InputProcessor, VirtualGamepadBackend, VirtualKey,
};
use bikecity_telemetry::{SpeedReadout, TelemetryClient, TelemetrySession};
use bikecity_types::StatusSink;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::status_log::LogStatusSink;

/// Roughly one animation frame.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Controls sampled for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveInput {
    /// Vehicle speed from the bike; `None` means the keys drive.
    pub bike_speed: Option<f64>,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub camera_up: bool,
    pub camera_down: bool,
    pub camera_left: bool,
    pub camera_right: bool,
}

impl DriveInput {
    pub fn sample(input: &InputProcessor, bike_speed: Option<f64>) -> Result<Self> {
        let keys = &input.config().keys;
        let pressed = |key: VirtualKey| input.query(key.code(keys));
        Ok(Self {
            bike_speed,
            forward: pressed(VirtualKey::Forward)?,
            backward: pressed(VirtualKey::Backward)?,
            left: pressed(VirtualKey::Left)?,
            right: pressed(VirtualKey::Right)?,
            camera_up: pressed(VirtualKey::CameraUp)?,
            camera_down: pressed(VirtualKey::CameraDown)?,
            camera_left: pressed(VirtualKey::CameraLeft)?,
            camera_right: pressed(VirtualKey::CameraRight)?,
        })
    }
}

/// Per-frame glue between input, telemetry, and the HUD.
///
/// The headless runner has no window, so keyboard events only arrive when an embedding
/// host forwards them through [`GameLoop::input_mut`] and [`InputProcessor::on_key_event`].
pub struct GameLoop {
    input: InputProcessor,
    last_drive: Option<DriveInput>,
}

impl GameLoop {
    pub fn new(input: InputProcessor) -> Self {
        Self {
            input,
            last_drive: None,
        }
    }

    pub fn input_mut(&mut self) -> &mut InputProcessor {
        &mut self.input
    }

    /// Run one frame: poll the pad, rebuild keys, render readouts, sample controls.
    pub fn frame(
        &mut self,
        backend: &mut dyn GamepadBackend,
        telemetry: &TelemetrySession,
        now: Instant,
        sink: &mut dyn StatusSink,
    ) -> Result<DriveInput> {
        if let Some(transition) = self.input.update(backend, now, sink)? {
            info!("Controller: {:?}", transition);
        }
        SpeedReadout::render(telemetry, sink);

        let drive = DriveInput::sample(&self.input, telemetry.speed_input())?;
        if self.last_drive != Some(drive) {
            debug!("Drive input: {:?}", drive);
            self.last_drive = Some(drive);
        }
        Ok(drive)
    }
}

fn gamepad_backend() -> Box<dyn GamepadBackend> {
    match GilrsBackend::new() {
        Some(backend) => Box::new(backend),
        None => {
            warn!("Gamepad support unavailable, keyboard only");
            Box::new(VirtualGamepadBackend::new())
        }
    }
}

/// Run the frame loop until Ctrl-C or `duration` elapses.
pub async fn run(config: Config, duration: Option<Duration>) -> Result<()> {
    let mut game = GameLoop::new(InputProcessor::new(config.input.clone()));
    let mut backend = gamepad_backend();
    let mut sink = LogStatusSink::new();

    let telemetry = TelemetryClient::new(config.telemetry.clone());
    telemetry.connect()?;

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let stop = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    tokio::pin!(stop);

    info!("Game loop running");
    let mut frames: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut stop => break,
        }
        let session = telemetry.session();
        game.frame(backend.as_mut(), &session, Instant::now(), &mut sink)?;
        frames += 1;
    }

    info!("Game loop stopped after {} frames", frames);
    telemetry.shutdown().await;
    Ok(())
}
