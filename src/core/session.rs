//! Per-call session state.
//!
//! One [`CallSession`] exists per accepted media stream and is shared by the
//! two relay tasks of that call only. Each field has a single writer:
//!
//! | Field | Writer |
//! |---|---|
//! | `stream_sid`, `latest_media_timestamp` | inbound relay |
//! | `last_assistant_item`, `realtime_open` | outbound relay |
//! | `state` | session driver |
//! | `last_activity` | both relays, as a running maximum |

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

/// Lifecycle of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallState {
    /// Realtime handshake in flight
    Connecting = 0,
    /// Session configured, both relays running
    Active = 1,
    /// Either relay has exited
    Terminated = 2,
}

impl CallState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CallState::Connecting,
            1 => CallState::Active,
            _ => CallState::Terminated,
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallState::Connecting => write!(f, "CONNECTING"),
            CallState::Active => write!(f, "ACTIVE"),
            CallState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

#[derive(Debug)]
pub struct CallSession {
    call_id: String,
    state: AtomicU8,
    stream_sid: RwLock<Option<String>>,
    latest_media_timestamp: AtomicU64,
    last_assistant_item: RwLock<Option<String>>,
    mark_queue: Mutex<VecDeque<String>>,
    realtime_open: AtomicBool,
    created_at: Instant,
    /// Milliseconds after `created_at` at which either side last sent a frame
    last_activity: AtomicU64,
}

impl CallSession {
    /// New session in the `Connecting` state with a random call id.
    pub fn new() -> Self {
        Self::with_call_id(Uuid::new_v4().to_string())
    }

    pub fn with_call_id(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            state: AtomicU8::new(CallState::Connecting as u8),
            stream_sid: RwLock::new(None),
            latest_media_timestamp: AtomicU64::new(0),
            last_assistant_item: RwLock::new(None),
            mark_queue: Mutex::new(VecDeque::new()),
            realtime_open: AtomicBool::new(true),
            created_at: Instant::now(),
            last_activity: AtomicU64::new(0),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn state(&self) -> CallState {
        CallState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: CallState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn stream_sid(&self) -> Option<String> {
        self.stream_sid.read().clone()
    }

    pub fn set_stream_sid(&self, stream_sid: impl Into<String>) {
        *self.stream_sid.write() = Some(stream_sid.into());
    }

    pub fn latest_media_timestamp(&self) -> u64 {
        self.latest_media_timestamp.load(Ordering::Acquire)
    }

    /// Record a media timestamp. The stored value never decreases, so an
    /// out-of-order frame cannot move it backwards.
    pub fn observe_media_timestamp(&self, timestamp: u64) {
        self.latest_media_timestamp
            .fetch_max(timestamp, Ordering::AcqRel);
    }

    pub fn last_assistant_item(&self) -> Option<String> {
        self.last_assistant_item.read().clone()
    }

    pub fn set_last_assistant_item(&self, item_id: impl Into<String>) {
        *self.last_assistant_item.write() = Some(item_id.into());
    }

    /// Queue a playback mark awaiting acknowledgement from the caller side.
    pub fn push_mark(&self, name: impl Into<String>) {
        self.mark_queue.lock().push_back(name.into());
    }

    pub fn pop_mark(&self) -> Option<String> {
        self.mark_queue.lock().pop_front()
    }

    pub fn pending_marks(&self) -> usize {
        self.mark_queue.lock().len()
    }

    /// Whether the realtime connection is still accepting audio.
    pub fn is_realtime_open(&self) -> bool {
        self.realtime_open.load(Ordering::Acquire)
    }

    pub fn mark_realtime_closed(&self) {
        self.realtime_open.store(false, Ordering::Release);
    }

    /// Note that a frame arrived from either connection.
    pub fn touch(&self) {
        let now = self.created_at.elapsed().as_millis() as u64;
        self.last_activity.fetch_max(now, Ordering::AcqRel);
    }

    /// Time since a frame last arrived on either connection, or since the
    /// session was created if none has.
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_activity.load(Ordering::Acquire));
        self.created_at.elapsed().saturating_sub(last)
    }
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}
