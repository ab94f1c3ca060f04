//! WebSocket serving over turmoil's simulated TCP.
//!
//! [`SimNetworkServer`] runs the real [`ServerDriver`] behind real WebSocket
//! framing, but on a turmoil host. Everything happens on one task: accepts,
//! inbound frames and ticks are multiplexed, so a run with the same seed and
//! the same client schedule is reproducible.
//!
//! The driver's [`SimEnv`] clock follows turmoil's simulated clock, one tick
//! at a time, so grace periods expire on network time.

use std::{collections::BTreeMap, pin::Pin, time::Duration};

use fadu_server::{DriverConfig, LogLevel, ServerAction, ServerDriver, ServerEvent};
use futures::{
    SinkExt, Stream, StreamExt,
    stream::{self, SelectAll, SplitSink},
};
use tokio_tungstenite::{
    WebSocketStream,
    tungstenite::{Error as WsError, Message},
};
use turmoil::net::{TcpListener, TcpStream};

use crate::{SimEnv, SimInstant};

/// Port the simulated server listens on.
pub const SIM_PORT: u16 = 8080;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type Inbound = Pin<Box<dyn Stream<Item = (u64, Option<Result<Message, WsError>>)> + Send>>;

enum Wake {
    Accepted(TcpStream),
    Frame(u64, Option<Result<Message, WsError>>),
    Tick(tokio::time::Instant),
}

/// Single-task WebSocket server for turmoil hosts.
pub struct SimNetworkServer {
    driver: ServerDriver<SimEnv>,
    env: SimEnv,
    sinks: BTreeMap<u64, WsSink>,
    next_session_id: u64,
    tick_interval: Duration,
}

impl SimNetworkServer {
    /// Server with the given config and seed, ticking once per simulated
    /// second.
    pub fn new(config: DriverConfig, seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        Self {
            driver: ServerDriver::new(env.clone(), config),
            env,
            sinks: BTreeMap::new(),
            next_session_id: 1,
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Bind on [`SIM_PORT`] and serve forever.
    pub async fn run(self) -> turmoil::Result {
        let listener = TcpListener::bind(format!("0.0.0.0:{SIM_PORT}").as_str()).await?;
        self.serve(listener).await
    }

    /// Serve connections from `listener` until an unrecoverable error.
    pub async fn serve(mut self, listener: TcpListener) -> turmoil::Result {
        let mut inbound: SelectAll<Inbound> = SelectAll::new();
        let mut ticks = tokio::time::interval(self.tick_interval);
        let mut last_tick = tokio::time::Instant::now();

        loop {
            let wake = tokio::select! {
                accepted = listener.accept() => Wake::Accepted(accepted?.0),
                Some((session_id, frame)) = inbound.next(), if !inbound.is_empty() => {
                    Wake::Frame(session_id, frame)
                },
                at = ticks.tick() => Wake::Tick(at),
            };

            match wake {
                Wake::Accepted(tcp) => {
                    let ws = tokio_tungstenite::accept_async(tcp).await?;
                    let session_id = self.next_session_id;
                    self.next_session_id += 1;

                    let (sink, read) = ws.split();
                    self.sinks.insert(session_id, sink);
                    inbound.push(Box::pin(
                        read.map(move |frame| (session_id, Some(frame)))
                            .chain(stream::once(async move { (session_id, None) })),
                    ));

                    self.handle(ServerEvent::ConnectionAccepted { session_id }).await?;
                },

                Wake::Frame(session_id, Some(Ok(Message::Text(text)))) => {
                    let text = text.as_str().to_string();
                    self.handle(ServerEvent::MessageReceived { session_id, text }).await?;
                },

                Wake::Frame(session_id, Some(Ok(Message::Close(_)) | Err(_)) | None) => {
                    if self.sinks.remove(&session_id).is_some() {
                        self.handle(ServerEvent::ConnectionClosed {
                            session_id,
                            reason: "connection closed".to_string(),
                        })
                        .await?;
                    }
                },

                Wake::Frame(..) => {},

                Wake::Tick(at) => {
                    self.env.advance(at.saturating_duration_since(last_tick));
                    last_tick = at;
                    self.handle(ServerEvent::Tick).await?;
                },
            }
        }
    }

    async fn handle(&mut self, event: ServerEvent) -> turmoil::Result {
        let actions = self.driver.process_event(event)?;

        for action in actions {
            match action {
                ServerAction::SendToSession { session_id, message } => {
                    self.send(session_id, message.encode()?).await;
                },

                ServerAction::BroadcastToRoom { room, message, exclude_session } => {
                    let text = message.encode()?;
                    let sessions: Vec<u64> = self.driver.sessions_in_room(&room).collect();
                    for session_id in sessions {
                        if Some(session_id) != exclude_session {
                            self.send(session_id, text.clone()).await;
                        }
                    }
                },

                ServerAction::CloseConnection { session_id, reason } => {
                    tracing::debug!("sim server closing session {}: {}", session_id, reason);
                    if let Some(mut sink) = self.sinks.remove(&session_id) {
                        let _ = sink.send(Message::Close(None)).await;
                    }
                },

                ServerAction::Log { level, message, timestamp } => log(level, timestamp, &message),
            }
        }

        Ok(())
    }

    async fn send(&mut self, session_id: u64, text: String) {
        let Some(sink) = self.sinks.get_mut(&session_id) else {
            return;
        };
        if let Err(e) = sink.send(Message::text(text)).await {
            tracing::debug!("sim write to session {} failed: {}", session_id, e);
        }
    }
}

fn log(level: LogLevel, at: SimInstant, message: &str) {
    let at = at.elapsed_since_start().as_millis() as u64;
    match level {
        LogLevel::Debug => tracing::debug!(at, "{}", message),
        LogLevel::Info => tracing::info!(at, "{}", message),
        LogLevel::Warn => tracing::warn!(at, "{}", message),
        LogLevel::Error => tracing::error!(at, "{}", message),
    }
}
