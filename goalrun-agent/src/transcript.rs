//! Shared, append-only run log

use goalrun_backend::LogEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Events a slow live subscriber may fall behind by before it starts missing some
pub const LIVE_BUFFER: usize = 1024;

/// Thread-safe log every run appends to.
///
/// Cloning yields another handle to the same log. Each append is atomic, so
/// events from concurrent runs may interleave but are never split.
#[derive(Clone)]
pub struct Transcript {
    inner: Arc<Inner>,
}

struct Inner {
    events: Mutex<Vec<String>>,
    live: broadcast::Sender<String>,
}

impl Transcript {
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(LIVE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                events: Mutex::new(Vec::new()),
                live,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.inner.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one rendered event
    pub fn append(&self, event: impl Into<String>) {
        let event = event.into();
        let mut events = self.lock();
        // Publish under the lock so live subscribers see the stored order.
        // Having no subscriber is the usual case and not an error.
        let _ = self.inner.live.send(event.clone());
        events.push(event);
    }

    pub fn emit(&self, event: LogEvent) {
        self.append(event);
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// All events concatenated in order
    pub fn text(&self) -> String {
        self.lock().concat()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget everything; only ever done on explicit user request
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Receive events appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.live.subscribe()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript").field("events", &self.len()).finish()
    }
}
