use anyhow::{Result, anyhow};
use bikecity_config::TelemetryConfig;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::session::{ConnectionState, ReconnectDecision, TelemetrySession};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands that can be sent to the telemetry client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryCommand {
    /// Open the socket (no-op while connecting or connected).
    Connect,
    /// Clear the attempt counter and connect again.
    Restart,
    /// Close the socket and cancel any pending reconnect.
    Disconnect,
}

/// Bike speed client that runs a background task for connection management.
///
/// The task owns the [`TelemetrySession`] and publishes a copy after every change, so the
/// game loop reads speed without blocking.
pub struct TelemetryClient {
    command_tx: mpsc::UnboundedSender<TelemetryCommand>,
    session_rx: watch::Receiver<TelemetrySession>,
    task: JoinHandle<()>,
}

impl TelemetryClient {
    /// Create a new client and spawn the background connection task.
    ///
    /// Must be called from within a tokio runtime. The client stays idle until
    /// [`connect`](Self::connect).
    pub fn new(config: TelemetryConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(TelemetrySession::new(config.clone()));
        let task = tokio::spawn(connection_task(config, command_rx, session_tx));
        Self {
            command_tx,
            session_rx,
            task,
        }
    }

    /// Send a command to the background task.
    pub fn send(&self, cmd: TelemetryCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|_| anyhow!("telemetry command channel closed"))
    }

    pub fn connect(&self) -> Result<()> {
        self.send(TelemetryCommand::Connect)
    }

    pub fn restart(&self) -> Result<()> {
        self.send(TelemetryCommand::Restart)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.send(TelemetryCommand::Disconnect)
    }

    /// Latest published session.
    pub fn session(&self) -> TelemetrySession {
        self.session_rx.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySession> {
        self.session_rx.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session_rx.borrow().state()
    }

    pub fn is_connected(&self) -> bool {
        self.session_rx.borrow().is_connected()
    }

    /// Game speed from the bike, `None` when the keyboard/gamepad should drive.
    pub fn speed_input(&self) -> Option<f64> {
        self.session_rx.borrow().speed_input()
    }

    pub fn speed_display(&self) -> String {
        self.session_rx.borrow().speed_display()
    }

    /// Close the socket and wait for the background task to exit.
    pub async fn shutdown(self) {
        drop(self.command_tx);
        if let Err(e) = self.task.await {
            error!("Telemetry task failed: {}", e);
        }
    }
}

/// How a connection run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEnd {
    /// Wait for the next command.
    Idle,
    /// Command channel closed.
    Shutdown,
}

/// How an open socket ended.
enum SocketEnd {
    Lost,
    Stopped,
    Shutdown,
}

fn publish(tx: &watch::Sender<TelemetrySession>, session: &TelemetrySession) {
    tx.send_replace(session.clone());
}

/// Background task that manages the WebSocket connection.
async fn connection_task(
    config: TelemetryConfig,
    mut rx: mpsc::UnboundedReceiver<TelemetryCommand>,
    tx: watch::Sender<TelemetrySession>,
) {
    let mut session = TelemetrySession::new(config.clone());

    while let Some(cmd) = rx.recv().await {
        match cmd {
            TelemetryCommand::Connect => {}
            TelemetryCommand::Restart => {
                session.restart();
                publish(&tx, &session);
            }
            TelemetryCommand::Disconnect => {
                debug!("Telemetry already disconnected");
                continue;
            }
        }

        if run_connection(&config, &mut session, &mut rx, &tx).await == RunEnd::Shutdown {
            break;
        }
    }

    if session.state() != ConnectionState::Disconnected {
        session.disconnect();
        publish(&tx, &session);
    }
    info!("Telemetry client stopped");
}

/// Connect, read, and reconnect until stopped or out of attempts.
async fn run_connection(
    config: &TelemetryConfig,
    session: &mut TelemetrySession,
    rx: &mut mpsc::UnboundedReceiver<TelemetryCommand>,
    tx: &watch::Sender<TelemetrySession>,
) -> RunEnd {
    loop {
        session.begin_connect();
        publish(tx, session);
        info!("Connecting to bike speed server: {}", config.server_url);

        let connect = tokio::time::timeout(
            config.connect_timeout(),
            connect_async(config.server_url.as_str()),
        );
        tokio::pin!(connect);

        let result = loop {
            tokio::select! {
                result = &mut connect => break result,
                cmd = rx.recv() => match cmd {
                    Some(TelemetryCommand::Disconnect) => {
                        info!("Connect to bike speed server cancelled");
                        session.disconnect();
                        publish(tx, session);
                        return RunEnd::Idle;
                    }
                    Some(cmd) => debug!("Ignoring {:?} while connecting", cmd),
                    None => return RunEnd::Shutdown,
                },
            }
        };

        match result {
            Ok(Ok((ws, _response))) => {
                session.on_open();
                publish(tx, session);
                info!("Connected to bike speed server!");

                match read_socket(ws, session, rx, tx).await {
                    SocketEnd::Lost => info!("Disconnected from bike speed server"),
                    SocketEnd::Stopped => return RunEnd::Idle,
                    SocketEnd::Shutdown => return RunEnd::Shutdown,
                }
            }
            Ok(Err(e)) => warn!("Bike speed server connection failed: {}", e),
            Err(_) => warn!(
                "Bike speed server connection timed out after {:?}",
                config.connect_timeout()
            ),
        }

        match session.on_connection_lost() {
            Some(ReconnectDecision::Retry { attempt, delay }) => {
                publish(tx, session);
                info!(
                    "Attempting to reconnect ({}/{}) in {:?}...",
                    attempt, config.max_reconnect_attempts, delay
                );

                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);
                loop {
                    tokio::select! {
                        _ = &mut sleep => break,
                        cmd = rx.recv() => match cmd {
                            Some(TelemetryCommand::Disconnect) => {
                                info!("Pending reconnect cancelled");
                                return RunEnd::Idle;
                            }
                            Some(TelemetryCommand::Restart) => {
                                session.restart();
                                break;
                            }
                            Some(TelemetryCommand::Connect) => break,
                            None => return RunEnd::Shutdown,
                        },
                    }
                }
            }
            Some(ReconnectDecision::GiveUp) => {
                publish(tx, session);
                error!("Max reconnection attempts reached. Falling back to keyboard controls.");
                return RunEnd::Idle;
            }
            None => return RunEnd::Idle,
        }
    }
}

/// Read speed frames until the socket closes or a command stops it.
async fn read_socket(
    mut ws: WsStream,
    session: &mut TelemetrySession,
    rx: &mut mpsc::UnboundedReceiver<TelemetryCommand>,
    tx: &watch::Sender<TelemetrySession>,
) -> SocketEnd {
    loop {
        tokio::select! {
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if session.on_message(&text).is_ok() {
                        publish(tx, session);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Bike speed server closed the socket: {:?}", frame);
                    return SocketEnd::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    return SocketEnd::Lost;
                }
                None => return SocketEnd::Lost,
            },
            cmd = rx.recv() => match cmd {
                Some(TelemetryCommand::Disconnect) => {
                    close_socket(&mut ws).await;
                    session.disconnect();
                    publish(tx, session);
                    info!("Disconnected from bike speed server");
                    return SocketEnd::Stopped;
                }
                Some(cmd) => debug!("Ignoring {:?} while connected", cmd),
                None => {
                    close_socket(&mut ws).await;
                    return SocketEnd::Shutdown;
                }
            },
        }
    }
}

async fn close_socket(ws: &mut WsStream) {
    if let Err(e) = ws.close(None).await {
        debug!("Error closing telemetry socket: {}", e);
    }
}
