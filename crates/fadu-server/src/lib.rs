//! Fadu game server.
//!
//! Hosts Fadu rooms for browser clients over WebSocket. One JSON text frame
//! carries one event in each direction.
//!
//! # Architecture
//!
//! [`ServerDriver`] owns all game state and does no I/O: it takes
//! [`ServerEvent`]s (connection opened, frame received, connection closed,
//! tick) and returns [`ServerAction`]s (unicast, room broadcast, close, log).
//! [`Server`] is the tokio runtime around it: one task per socket, one writer
//! task per socket so frames to a client stay ordered, and a ticker that
//! drives reconnect grace periods.
//!
//! # Components
//!
//! - [`ServerDriver`]: event-in, action-out session orchestrator
//! - [`RoomManager`]: room codes to game sessions, grace checks, cleanup
//! - [`ConnectionRegistry`]: which connection holds which seat
//! - [`dispatch`]: game events to outbound messages, hands kept private
//! - [`WsTransport`]: WebSocket listener via tokio-tungstenite
//! - [`SystemEnv`]: wall clock and OS randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod dispatcher;
mod driver;
mod error;
mod registry;
mod room_manager;
mod server_error;
mod system_env;
mod transport;

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
    time::Duration,
};

pub use dispatcher::{Outbound, dispatch, game_state_for, player_views};
pub use driver::{LogLevel, ServerAction, ServerConfig as DriverConfig, ServerDriver, ServerEvent};
pub use error::ServerError;
use fadu_core::Environment;
use futures::{SinkExt, StreamExt};
pub use registry::{ConnectionRegistry, SeatBinding, SessionInfo};
pub use room_manager::{Joined, RoomError, RoomManager, RoomMetadata};
pub use server_error::DriverError;
pub use system_env::SystemEnv;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_tungstenite::tungstenite::Message;
pub use transport::{WsConnection, WsTransport};

/// Outbound frames buffered per connection before it counts as stalled.
const OUTBOUND_BUFFER: usize = 256;

type SharedDriver = Arc<Mutex<ServerDriver<SystemEnv>>>;

/// Shared state for all connections.
///
/// Holds one outbound queue per session. A dedicated writer task drains each
/// queue into its socket, so all messages to a client go out in order.
#[derive(Default)]
struct SharedState {
    outbound: RwLock<HashMap<u64, mpsc::Sender<Message>>>,
}

impl SharedState {
    async fn send(&self, session_id: u64, frame: Message) {
        let outbound = self.outbound.read().await;
        match outbound.get(&session_id) {
            Some(tx) => {
                if let Err(e) = tx.try_send(frame) {
                    tracing::warn!("send to session {} failed: {}", session_id, e);
                }
            },
            None => tracing::debug!("send: session {} not found", session_id),
        }
    }

    /// Install `tx` under a fresh session id.
    ///
    /// Draws from `next_id` until it finds an id that neither has a queue
    /// nor is `live`, so a collision never replaces another session's queue.
    async fn register(
        &self,
        tx: mpsc::Sender<Message>,
        live: impl Fn(u64) -> bool,
        mut next_id: impl FnMut() -> u64,
    ) -> u64 {
        let mut outbound = self.outbound.write().await;
        loop {
            let session_id = next_id();
            if live(session_id) {
                continue;
            }
            if let Entry::Vacant(slot) = outbound.entry(session_id) {
                slot.insert(tx);
                return session_id;
            }
        }
    }
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Interval between grace-period checks
    pub tick_interval: Duration,
    /// Driver configuration (game rules, limits)
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tick_interval: Duration::from_secs(1),
            driver: DriverConfig::default(),
        }
    }
}

/// Production Fadu server.
///
/// Wraps `ServerDriver` with WebSocket transport and system environment.
pub struct Server {
    /// The action-based server driver
    driver: ServerDriver<SystemEnv>,
    /// WebSocket listener
    transport: WsTransport,
    /// Environment
    env: SystemEnv,
    /// Interval between ticks
    tick_interval: Duration,
}

impl Server {
    /// Validate configuration and bind a new server.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        config.driver.game.validate()?;
        if config.tick_interval.is_zero() {
            return Err(ServerError::Config("tick interval must be non-zero".to_string()));
        }

        let env = SystemEnv::new();
        let driver = ServerDriver::new(env.clone(), config.driver);
        let transport = WsTransport::bind(&config.bind_address).await?;

        Ok(Self { driver, transport, env, tick_interval: config.tick_interval })
    }

    /// Run the server, accepting connections and processing messages.
    ///
    /// This method runs until the server is shut down or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.transport.local_addr()?);

        let env = self.env;
        let driver: SharedDriver = Arc::new(Mutex::new(self.driver));
        let shared = Arc::new(SharedState::default());

        tokio::spawn(run_ticks(
            Arc::clone(&driver),
            Arc::clone(&shared),
            env.clone(),
            self.tick_interval,
        ));

        loop {
            match self.transport.accept().await {
                Ok((ws, peer)) => {
                    let driver = Arc::clone(&driver);
                    let shared = Arc::clone(&shared);
                    let env = env.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(ws, driver, shared, env).await {
                            tracing::error!("Connection error from {}: {}", peer, e);
                        }
                    });
                },
                Err(e) => {
                    tracing::warn!("Accept error: {}", e);
                },
            }
        }
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

/// Drive grace-period expiry and room cleanup.
async fn run_ticks(
    driver: SharedDriver,
    shared: Arc<SharedState>,
    env: SystemEnv,
    interval: Duration,
) {
    loop {
        env.sleep(interval).await;

        let mut driver = driver.lock().await;
        match driver.process_event(ServerEvent::Tick) {
            Ok(actions) => execute_actions(&driver, actions, &shared).await,
            Err(e) => tracing::error!("Tick failed: {}", e),
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    ws: WsConnection,
    driver: SharedDriver,
    shared: Arc<SharedState>,
    env: SystemEnv,
) -> Result<(), ServerError> {
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

    // Held until the driver has seen the session, so the id stays unique.
    let driver_guard = driver.lock().await;
    let session_id = shared
        .register(tx, |id| driver_guard.has_session(id), || env.random_u64())
        .await;
    tracing::debug!("New connection: {}", session_id);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if let Err(e) = sink.send(frame).await {
                tracing::debug!("Write error on session {}: {}", session_id, e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    {
        let mut driver = driver_guard;
        let actions = match driver.process_event(ServerEvent::ConnectionAccepted { session_id }) {
            Ok(actions) => actions,
            Err(e) => {
                shared.outbound.write().await.remove(&session_id);
                drop(driver);
                let _ = writer.await;
                return Err(e.into());
            },
        };
        execute_actions(&driver, actions, &shared).await;

        // Rejected at capacity: the close frame is already queued.
        if !driver.has_session(session_id) {
            drop(driver);
            let _ = writer.await;
            return Ok(());
        }
    }

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_string(),
            Ok(Message::Binary(_)) => {
                tracing::debug!("Ignoring binary frame from session {}", session_id);
                continue;
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Read error on session {}: {}", session_id, e);
                break;
            },
        };

        let mut driver = driver.lock().await;
        match driver.process_event(ServerEvent::MessageReceived { session_id, text }) {
            Ok(actions) => execute_actions(&driver, actions, &shared).await,
            Err(e) => {
                tracing::warn!("Message processing error: {}", e);
                break;
            },
        }
    }

    shared.outbound.write().await.remove(&session_id);

    {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(ServerEvent::ConnectionClosed {
            session_id,
            reason: "connection closed".to_string(),
        })?;
        execute_actions(&driver, actions, &shared).await;
    }

    let _ = writer.await;
    Ok(())
}

/// Execute server actions.
///
/// Delivery failures are logged and skipped.
async fn execute_actions(
    driver: &ServerDriver<SystemEnv>,
    actions: Vec<ServerAction>,
    shared: &SharedState,
) {
    for action in actions {
        match action {
            ServerAction::SendToSession { session_id, message } => {
                match message.encode() {
                    Ok(text) => shared.send(session_id, Message::text(text)).await,
                    Err(e) => tracing::error!("Failed to encode {}: {}", message.event_name(), e),
                }
            },

            ServerAction::BroadcastToRoom { room, message, exclude_session } => {
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode {}: {}", message.event_name(), e);
                        continue;
                    },
                };

                let sessions: Vec<u64> = driver.sessions_in_room(&room).collect();
                for session_id in sessions {
                    if Some(session_id) != exclude_session {
                        shared.send(session_id, Message::text(text.clone())).await;
                    }
                }
            },

            ServerAction::CloseConnection { session_id, reason } => {
                tracing::info!("Closing connection {}: {}", session_id, reason);
                shared.send(session_id, Message::Close(None)).await;
                shared.outbound.write().await.remove(&session_id);
            },

            ServerAction::Log { level, message, .. } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }
}
