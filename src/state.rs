use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ServerConfig;

/// Application state shared by every handler.
///
/// Built once in `main` and injected through axum's `State` extractor. Calls
/// never share per-call data through here; each call owns its own
/// [`crate::core::CallSession`].
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    active_calls: AtomicUsize,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            active_calls: AtomicUsize::new(0),
        })
    }

    /// Number of calls currently being relayed.
    pub fn active_calls(&self) -> usize {
        self.active_calls.load(Ordering::Relaxed)
    }

    /// Count a call for as long as the returned guard lives.
    pub fn track_call(self: &Arc<Self>) -> ActiveCallGuard {
        self.active_calls.fetch_add(1, Ordering::Relaxed);
        ActiveCallGuard {
            state: Arc::clone(self),
        }
    }
}

pub struct ActiveCallGuard {
    state: Arc<AppState>,
}

impl Drop for ActiveCallGuard {
    fn drop(&mut self) {
        self.state.active_calls.fetch_sub(1, Ordering::Relaxed);
    }
}
