//! WebSocket transport.
//!
//! Plain TCP listener with a WebSocket upgrade per connection. Every message
//! is one text frame of JSON. TLS termination is left to a reverse proxy in
//! front of the server.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;

use crate::error::ServerError;

/// An accepted, upgraded client connection.
pub type WsConnection = WebSocketStream<TcpStream>;

/// WebSocket transport bound to a TCP address.
pub struct WsTransport {
    listener: TcpListener,
}

impl WsTransport {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// - `Config` if `address` is not a socket address
    /// - `Transport` if the address cannot be bound
    pub async fn bind(address: &str) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Transport(format!("failed to bind {addr}: {e}")))?;

        tracing::info!("WebSocket transport bound to {}", addr);

        Ok(Self { listener })
    }

    /// Accept a connection and complete the WebSocket handshake.
    ///
    /// Blocks until a peer connects. A failed handshake is returned as an
    /// error for that peer only; the listener stays usable.
    pub async fn accept(&self) -> Result<(WsConnection, SocketAddr), ServerError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| ServerError::Transport(format!("accept failed: {e}")))?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| ServerError::Transport(format!("handshake with {peer} failed: {e}")))?;

        Ok((ws, peer))
    }

    /// Local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(|e| ServerError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let result = WsTransport::bind("not an address").await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn bind_to_ephemeral_port() {
        let transport = WsTransport::bind("127.0.0.1:0").await.unwrap();
        assert_ne!(transport.local_addr().unwrap().port(), 0);
    }
}
