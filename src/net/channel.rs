//! Duplex text message channel to the hub
//!
//! The outbound half is a bounded queue drained by a writer task; the inbound
//! half is a stream of channel events that always ends with `Closed` or `Error`.

use std::future::Future;
use std::pin::Pin;

use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

/// Outbound queue depth
const OUTBOUND_CAPACITY: usize = 64;

/// Something observed on the inbound side of the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A complete text message
    Message(String),
    /// Transport failure; no further events follow
    Error(String),
    /// Orderly close by the peer; no further events follow
    Closed,
}

/// Channel errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Channel closed")]
    Closed,
}

/// Inbound half of a channel
pub type InboundStream = Pin<Box<dyn Stream<Item = ChannelEvent> + Send>>;

/// Sending half used by the session's send loop
pub trait OutboundChannel: Send + 'static {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

impl OutboundChannel for mpsc::Sender<String> {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send {
        let tx = self.clone();
        async move { tx.send(text).await.map_err(|_| ChannelError::Closed) }
    }
}

/// A connected duplex channel
pub struct MessageChannel {
    pub outbound: mpsc::Sender<String>,
    pub inbound: InboundStream,
}

impl MessageChannel {
    /// Connect to a WebSocket hub; each text frame is one message
    pub async fn connect_ws(url: &str) -> Result<Self, ChannelError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url).await?;
        info!(hub = %url, "Connected to hub");

        let (mut ws_sink, ws_stream) = socket.split();
        let (outbound, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);

        // Writer task: outbound queue -> WebSocket
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(text)).await {
                    debug!(error = %e, "Hub send failed");
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        let inbound = futures::stream::unfold(Some(ws_stream), |state| async move {
            let mut ws_stream = state?;
            loop {
                match ws_stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Some((ChannelEvent::Message(text), Some(ws_stream)));
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Received binary message, ignoring");
                    }
                    // Pings are answered by tungstenite on the next write
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => return Some((ChannelEvent::Closed, None)),
                    Some(Err(e)) => return Some((ChannelEvent::Error(e.to_string()), None)),
                }
            }
        });

        Ok(Self {
            outbound,
            inbound: Box::pin(inbound),
        })
    }

    /// In-process channel; the returned `HubEnd` plays the hub
    pub fn loopback() -> (Self, HubEnd) {
        let (outbound, from_client) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        let (to_client, inbound_rx) = mpsc::channel::<ChannelEvent>(OUTBOUND_CAPACITY);

        let inbound = futures::stream::unfold(Some(inbound_rx), |state| async move {
            let mut rx = state?;
            match rx.recv().await {
                Some(event @ (ChannelEvent::Error(_) | ChannelEvent::Closed)) => Some((event, None)),
                Some(event) => Some((event, Some(rx))),
                // Hub end dropped
                None => Some((ChannelEvent::Closed, None)),
            }
        });

        let channel = Self {
            outbound,
            inbound: Box::pin(inbound),
        };
        (channel, HubEnd { to_client, from_client })
    }
}

/// Hub side of a loopback channel
pub struct HubEnd {
    pub to_client: mpsc::Sender<ChannelEvent>,
    pub from_client: mpsc::Receiver<String>,
}

impl HubEnd {
    pub async fn send(&self, text: impl Into<String>) -> Result<(), ChannelError> {
        self.to_client
            .send(ChannelEvent::Message(text.into()))
            .await
            .map_err(|_| ChannelError::Closed)
    }

    pub async fn fail(&self, reason: impl Into<String>) -> Result<(), ChannelError> {
        self.to_client
            .send(ChannelEvent::Error(reason.into()))
            .await
            .map_err(|_| ChannelError::Closed)
    }

    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }
}
