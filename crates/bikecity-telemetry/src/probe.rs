use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::protocol::parse_speed_message;

/// Outcome of a [`probe`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    /// Speeds received, in order.
    pub speeds: Vec<f64>,
    /// Frames that failed to parse.
    pub rejected: usize,
    /// The server went quiet for longer than the per-message timeout.
    pub timed_out: bool,
    /// The server closed the socket before `count` frames arrived.
    pub closed: bool,
}

/// Connect to a speed server and read up to `count` frames.
///
/// A connect failure is an error; silence or an early close is reported in the result.
pub async fn probe(url: &str, count: usize, message_timeout: Duration) -> Result<ProbeReport> {
    info!("Testing connection to {}", url);
    let (mut ws, _response) = tokio::time::timeout(message_timeout, connect_async(url))
        .await
        .with_context(|| format!("timed out connecting to {}", url))?
        .with_context(|| format!("connection to {} failed", url))?;
    info!("Connected successfully");

    let mut report = ProbeReport::default();
    while report.speeds.len() < count {
        let msg = match tokio::time::timeout(message_timeout, ws.next()).await {
            Ok(msg) => msg,
            Err(_) => {
                warn!("Timeout waiting for message");
                report.timed_out = true;
                break;
            }
        };

        match msg {
            Some(Ok(Message::Text(text))) => match parse_speed_message(&text) {
                Ok(message) => {
                    info!("Received: Speed = {:.1} km/h", message.speed);
                    report.speeds.push(message.speed);
                }
                Err(e) => {
                    warn!("Rejected frame {:?}: {}", text, e);
                    report.rejected += 1;
                }
            },
            Some(Ok(Message::Close(_))) | None => {
                report.closed = true;
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(anyhow::Error::new(e).context("error reading from speed server"));
            }
        }
    }

    if let Err(e) = ws.close(None).await {
        warn!("Error closing probe socket: {}", e);
    }
    Ok(report)
}
