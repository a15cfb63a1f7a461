//! In-memory connection doubles
//!
//! Stand-ins for the two WebSocket connections of a call:
//! - [`ChannelSource`] yields whatever a [`FrameFeeder`] pushes into it
//! - [`RecordingSink`] records every frame sent and every close call
//!
//! A sink can also be told to fail its sends or to stall forever, to drive
//! the error and shutdown paths of the relay.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use call_bridge::core::realtime::RealtimeSettings;
use call_bridge::core::transport::{FrameSink, FrameSource};
use call_bridge::errors::{BridgeError, BridgeResult};

// =============================================================================
// Source
// =============================================================================

pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<BridgeResult<Option<String>>>,
}

/// Producer side of a [`ChannelSource`]. Dropping it closes the source.
pub struct FrameFeeder {
    tx: mpsc::UnboundedSender<BridgeResult<Option<String>>>,
}

pub fn channel_source() -> (FrameFeeder, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FrameFeeder { tx }, ChannelSource { rx })
}

impl FrameFeeder {
    pub fn text(&self, text: impl Into<String>) {
        let _ = self.tx.send(Ok(Some(text.into())));
    }

    pub fn json(&self, value: Value) {
        self.text(value.to_string());
    }

    /// Make the next receive fail.
    pub fn fail(&self, error: BridgeError) {
        let _ = self.tx.send(Err(error));
    }

    /// Report a clean close from the peer.
    pub fn close(&self) {
        let _ = self.tx.send(Ok(None));
    }
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn recv_text(&mut self) -> BridgeResult<Option<String>> {
        match self.rx.recv().await {
            Some(frame) => frame,
            None => Ok(None),
        }
    }
}

// =============================================================================
// Sink
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkMode {
    Record,
    FailSends,
    Stall,
}

pub struct RecordingSink {
    mode: SinkMode,
    recorder: SinkRecorder,
}

/// Inspection handle shared with a [`RecordingSink`].
#[derive(Clone, Default)]
pub struct SinkRecorder {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    close_calls: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn new() -> (Self, SinkRecorder) {
        Self::with_mode(SinkMode::Record)
    }

    /// Every send returns a WebSocket error.
    pub fn failing() -> (Self, SinkRecorder) {
        Self::with_mode(SinkMode::FailSends)
    }

    /// Every send waits forever.
    pub fn stalling() -> (Self, SinkRecorder) {
        Self::with_mode(SinkMode::Stall)
    }

    fn with_mode(mode: SinkMode) -> (Self, SinkRecorder) {
        let recorder = SinkRecorder::default();
        (
            Self {
                mode,
                recorder: recorder.clone(),
            },
            recorder,
        )
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send_text(&mut self, text: String) -> BridgeResult<()> {
        match self.mode {
            SinkMode::Record => {
                self.recorder.sent.lock().push(text);
                Ok(())
            }
            SinkMode::FailSends => Err(BridgeError::WebSocket("connection reset".to_string())),
            SinkMode::Stall => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.recorder.close_calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl SinkRecorder {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("sink received invalid JSON"))
            .collect()
    }

    /// `type` field of every frame sent, in order.
    pub fn sent_types(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .map(|value| value["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Poll `condition` until it holds, panicking after `limit`.
pub async fn wait_until<F>(limit: Duration, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {limit:?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn test_settings() -> RealtimeSettings {
    RealtimeSettings {
        api_key: "sk-test".to_string(),
        url: "wss://realtime.invalid/v1/realtime".to_string(),
        model: "gpt-4o-realtime-preview-2024-10-01".to_string(),
        voice: "alloy".to_string(),
        instructions: "You are a test assistant.".to_string(),
        temperature: 0.8,
    }
}
