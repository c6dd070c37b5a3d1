//! Stand-in for the Raspberry Pi sensor server.
//!
//! Streams speed frames to every connected client so the game and the probe can be tested
//! without the bike.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::protocol::SpeedMessage;

/// Speed values streamed to each client, indexed by frame count.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedFeed {
    Constant(f64),
    /// `count * step`, counting from zero per client.
    Ramp { step: f64 },
    /// Cycles through the given values.
    Sequence(Vec<f64>),
}

impl SpeedFeed {
    pub fn speed_at(&self, count: u64) -> f64 {
        match self {
            Self::Constant(speed) => *speed,
            Self::Ramp { step } => count as f64 * step,
            Self::Sequence(values) if values.is_empty() => 0.0,
            Self::Sequence(values) => values[(count % values.len() as u64) as usize],
        }
    }
}

impl Default for SpeedFeed {
    fn default() -> Self {
        Self::Ramp { step: 2.5 }
    }
}

fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

pub struct SpeedServer {
    listener: TcpListener,
    feed: SpeedFeed,
    interval: Duration,
    close_after: Option<u64>,
}

impl SpeedServer {
    pub async fn bind(addr: &str, feed: SpeedFeed, interval: Duration) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind speed server to {}", addr))?;
        Ok(Self {
            listener,
            feed,
            interval,
            close_after: None,
        })
    }

    /// Close each client connection after sending `frames` frames.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn url(&self) -> Result<String> {
        Ok(format!("ws://{}", self.local_addr()?))
    }

    /// Spawn the accept loop on the current runtime.
    pub fn start(self) -> Result<SpeedServerHandle> {
        let url = self.url()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            if let Err(e) = self.run(shutdown_rx).await {
                warn!("Speed server error: {}", e);
            }
        });
        Ok(SpeedServerHandle {
            url,
            shutdown_tx,
            task,
        })
    }

    /// Accept clients until the shutdown flag flips to `true`.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        info!("Speed server listening on {}", self.url()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.context("failed to accept client")?;
                    tokio::spawn(serve_client(
                        stream,
                        peer,
                        self.feed.clone(),
                        self.interval,
                        self.close_after,
                        shutdown_rx.clone(),
                    ));
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Speed server shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Handle to a spawned [`SpeedServer`].
pub struct SpeedServerHandle {
    url: String,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SpeedServerHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop accepting, close all client sockets, and wait for the accept loop.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Speed server task failed: {}", e);
        }
    }
}

async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    feed: SpeedFeed,
    interval: Duration,
    close_after: Option<u64>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };
    info!("Client connected from {}", peer);

    let (mut sink, mut source) = ws.split();
    let mut ticker = tokio::time::interval(interval);
    let mut count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if close_after.is_some_and(|limit| count >= limit) {
                    debug!("Closing {} after {} frames", peer, count);
                    break;
                }
                let frame = SpeedMessage::new(feed.speed_at(count), unix_timestamp());
                let json = match frame.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode speed frame for {}: {}", peer, e);
                        count += 1;
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json)).await {
                    debug!("Send to {} failed: {}", peer, e);
                    break;
                }
                debug!("Sent test data: {} km/h", frame.speed);
                count += 1;
            }
            msg = source.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Receive from {} failed: {}", peer, e);
                    break;
                }
            },
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    if let Err(e) = sink.close().await {
        debug!("Error closing socket to {}: {}", peer, e);
    }
    info!("Client disconnected: {}", peer);
}
