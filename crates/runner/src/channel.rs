//! WebSocket event channel to the job runner.
//!
//! [`RunnerChannel`] holds the transport address for the runner's push
//! channel. Call [`RunnerChannel::subscribe`] to open a live
//! [`RunnerSubscription`]; dropping the subscription (or cancelling the
//! processing task that owns it) is the unsubscribe.

use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// Configuration handle for the runner's event channel.
pub struct RunnerChannel {
    ws_url: String,
}

/// A live channel subscription.
///
/// Holds the underlying `WebSocketStream` plus the client id sent
/// during the handshake so the runner can address this subscriber.
pub struct RunnerSubscription {
    /// Unique client id generated for this subscription.
    pub client_id: String,
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl RunnerChannel {
    /// Create a channel handle for the given transport address
    /// (e.g. `ws://host:5000`).
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    /// Event-channel transport address.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Open a subscription to the runner's event stream.
    ///
    /// Generates a fresh client id (UUID v4) and appends it as a query
    /// parameter so the runner can scope pushed events to this
    /// subscriber.
    pub async fn subscribe(&self) -> Result<RunnerSubscription, ChannelError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/events?client_id={}", self.ws_url, client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            ChannelError::Connection(format!(
                "Failed to connect to job runner at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(
            client_id = %client_id,
            "Subscribed to runner event channel at {}",
            self.ws_url,
        );

        Ok(RunnerSubscription {
            client_id,
            ws_stream,
        })
    }
}

/// Errors that can occur when working with the event channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to establish the channel subscription.
    #[error("Connection error: {0}")]
    Connection(String),
}
