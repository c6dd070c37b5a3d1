// bikecity: city driving game input and bike telemetry runner.
//
// Runs the frame loop headless (readouts go to the log), probes a bike speed server, or serves
// fake speed data for testing.

mod game_loop;
mod logging;
mod status_log;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use bikecity_config::Config;
use bikecity_telemetry::{SpeedFeed, SpeedServer, probe};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "bikecity", about = "Bike-controlled city driving: input and telemetry")]
struct Args {
    /// Directory for the daily rolling log file.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Enable debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the game input loop with bike telemetry.
    Run {
        /// Path to config JSON file.
        #[arg(long, default_value = "bikecity.json")]
        config: PathBuf,

        /// Override the bike speed server URL.
        #[arg(long, env = "BIKECITY_SERVER_URL")]
        server_url: Option<String>,

        /// Stop after this many seconds.
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Connect to a speed server and print the first few speeds.
    Probe {
        #[arg(long, default_value = bikecity_config::telemetry_config::DEFAULT_SERVER_URL)]
        url: String,

        /// Messages to read.
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Per-message timeout in milliseconds.
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
    },
    /// Serve fake speed data on a local WebSocket.
    ServeTest {
        #[arg(long, default_value = "0.0.0.0:8765")]
        bind: String,

        /// Milliseconds between frames.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Ramp step in km/h per frame.
        #[arg(long, default_value_t = 2.5, conflicts_with = "constant")]
        step: f64,

        /// Send a constant speed instead of a ramp.
        #[arg(long)]
        constant: Option<f64>,
    },
    /// Write a config file with default values.
    InitConfig {
        #[arg(default_value = "bikecity.json")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_dir.as_deref(), args.verbose)?;
    info!("bikecity starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_command(args.command))
}

async fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Run {
            config,
            server_url,
            seconds,
        } => {
            let mut config = Config::read_or_default(&config)?;
            if let Some(url) = server_url {
                config.telemetry.server_url = url;
            }
            info!(url = %config.telemetry.server_url, "Bike speed server");
            game_loop::run(config, seconds.map(Duration::from_secs)).await
        }
        Command::Probe {
            url,
            count,
            timeout_ms,
        } => {
            let report = probe(&url, count, Duration::from_millis(timeout_ms)).await?;
            for speed in &report.speeds {
                println!("Speed = {:.1} km/h", speed);
            }
            if report.timed_out {
                warn!("Timeout waiting for message");
            }
            if report.closed {
                warn!("Server closed the connection");
            }
            info!(
                "Received {} of {} messages ({} rejected)",
                report.speeds.len(),
                count,
                report.rejected
            );
            Ok(())
        }
        Command::ServeTest {
            bind,
            interval_ms,
            step,
            constant,
        } => {
            let feed = match constant {
                Some(speed) => SpeedFeed::Constant(speed),
                None => SpeedFeed::Ramp { step },
            };
            let server =
                SpeedServer::bind(&bind, feed, Duration::from_millis(interval_ms)).await?;
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Server stopped by user");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(e) => {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            });
            server.run(shutdown_rx).await
        }
        Command::InitConfig { path, force } => init_config(&path, force),
    }
}

fn init_config(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().write(path)?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_config_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bikecity.json");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime
            .block_on(run_command(Command::InitConfig {
                path: path.clone(),
                force: false,
            }))
            .unwrap();
        assert_eq!(Config::read(&path).unwrap(), Config::default());

        assert!(init_config(&path, false).is_err());
        init_config(&path, true).unwrap();
    }

    #[test]
    fn parses_subcommands() {
        let args = Args::parse_from(["bikecity", "init-config", "out.json", "--force"]);
        assert!(matches!(
            args.command,
            Command::InitConfig { ref path, force: true } if path == &PathBuf::from("out.json")
        ));

        let args = Args::parse_from(["bikecity", "-v", "serve-test", "--constant", "12"]);
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::ServeTest { constant: Some(c), .. } if c == 12.0
        ));
    }
}
