//! Duplex text-frame transports.
//!
//! Both sides of a call are JSON-over-WebSocket. The relay only needs to pull
//! text frames from one side and push text frames to the other, so each
//! connection is split into a [`FrameSource`] and a [`FrameSink`] half that can
//! be owned by different tasks.

use async_trait::async_trait;
use axum::extract::ws::{Message as AxumMessage, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::trace;

use crate::errors::{BridgeError, BridgeResult};

/// Client stream to the realtime AI endpoint.
pub type RealtimeStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Receiving half of a connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next text frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection. Control
    /// and binary frames are skipped.
    async fn recv_text(&mut self) -> BridgeResult<Option<String>>;
}

/// Sending half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> BridgeResult<()>;

    /// Start the close handshake and release the connection.
    async fn close(&mut self) -> BridgeResult<()>;
}

// =============================================================================
// Call side (server socket accepted by axum)
// =============================================================================

pub struct CallSocketSource {
    inner: SplitStream<WebSocket>,
}

pub struct CallSocketSink {
    inner: SplitSink<WebSocket, AxumMessage>,
}

/// Split an upgraded call socket into independently owned halves.
pub fn split_call_socket(socket: WebSocket) -> (CallSocketSource, CallSocketSink) {
    let (sink, stream) = socket.split();
    (
        CallSocketSource { inner: stream },
        CallSocketSink { inner: sink },
    )
}

#[async_trait]
impl FrameSource for CallSocketSource {
    async fn recv_text(&mut self) -> BridgeResult<Option<String>> {
        while let Some(msg) = self.inner.next().await {
            match msg.map_err(|e| BridgeError::WebSocket(e.to_string()))? {
                AxumMessage::Text(text) => return Ok(Some(text.as_str().to_owned())),
                AxumMessage::Close(_) => return Ok(None),
                AxumMessage::Binary(data) => {
                    trace!("Skipping {} byte binary frame from call socket", data.len());
                }
                AxumMessage::Ping(_) | AxumMessage::Pong(_) => {}
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl FrameSink for CallSocketSink {
    async fn send_text(&mut self, text: String) -> BridgeResult<()> {
        self.inner
            .send(AxumMessage::Text(text.into()))
            .await
            .map_err(|e| BridgeError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.inner
            .close()
            .await
            .map_err(|e| BridgeError::WebSocket(e.to_string()))
    }
}

// =============================================================================
// AI side (client socket opened with tokio-tungstenite)
// =============================================================================

pub struct RealtimeSource {
    inner: SplitStream<RealtimeStream>,
}

pub struct RealtimeSink {
    inner: SplitSink<RealtimeStream, WsMessage>,
}

/// Split a connected realtime stream into independently owned halves.
pub fn split_realtime_stream(stream: RealtimeStream) -> (RealtimeSource, RealtimeSink) {
    let (sink, stream) = stream.split();
    (
        RealtimeSource { inner: stream },
        RealtimeSink { inner: sink },
    )
}

#[async_trait]
impl FrameSource for RealtimeSource {
    async fn recv_text(&mut self) -> BridgeResult<Option<String>> {
        while let Some(msg) = self.inner.next().await {
            match msg.map_err(|e| BridgeError::WebSocket(e.to_string()))? {
                WsMessage::Text(text) => return Ok(Some(text.as_str().to_owned())),
                WsMessage::Close(_) => return Ok(None),
                WsMessage::Binary(data) => {
                    trace!("Skipping {} byte binary frame from realtime socket", data.len());
                }
                // Pong replies are queued by tungstenite and flushed on the next send
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl FrameSink for RealtimeSink {
    async fn send_text(&mut self, text: String) -> BridgeResult<()> {
        self.inner
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| BridgeError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.inner
            .close()
            .await
            .map_err(|e| BridgeError::WebSocket(e.to_string()))
    }
}
