//! Danmaku (scrolling comment) overlay
//!
//! `DanmakuOverlay` ties a comment renderer to the playback lifecycle:
//! comments scroll while media plays, freeze while paused and are dropped
//! when the session ends. The renderer itself sits behind `DanmakuSink`;
//! `DanmakuQueue` is an in-memory sink a UI layer can poll.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::player::{PlayerObserver, PlayerState};

/// One scrolling comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanmakuItem {
    pub content: String,

    /// Sent by the local user; renderers usually highlight these
    pub own: bool,
}

/// Comment renderer driven by the overlay
pub trait DanmakuSink: Send {
    fn initialize(&mut self);

    fn add_batch(&mut self, contents: Vec<String>);

    fn add_single(&mut self, content: String, own: bool);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Drop every comment and stop
    fn release(&mut self);
}

struct OverlayState {
    sink: Box<dyn DanmakuSink>,
    open: bool,
}

/// Lifecycle-aware danmaku layer
pub struct DanmakuOverlay {
    state: Mutex<OverlayState>,
}

impl DanmakuOverlay {
    /// Create an overlay; comments are shown by default
    pub fn new(sink: impl DanmakuSink + 'static) -> Self {
        Self {
            state: Mutex::new(OverlayState {
                sink: Box::new(sink),
                open: true,
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Show comments and let them scroll
    pub fn open(&self) {
        let mut overlay = self.state.lock();
        overlay.open = true;
        overlay.sink.resume();
    }

    /// Freeze and hide comments
    pub fn close(&self) {
        let mut overlay = self.state.lock();
        overlay.sink.pause();
        overlay.open = false;
    }

    /// Queue a batch of comments
    pub fn set_data(&self, contents: Vec<String>) {
        self.state.lock().sink.add_batch(contents);
    }

    /// Append a single comment
    pub fn add_item(&self, content: impl Into<String>, own: bool) {
        self.state.lock().sink.add_single(content.into(), own);
    }
}

impl PlayerObserver for DanmakuOverlay {
    fn on_player_state(&self, state: PlayerState, _message: &str) {
        let mut overlay = self.state.lock();
        match state {
            PlayerState::Prepare => overlay.sink.initialize(),
            PlayerState::Reset
            | PlayerState::Stop
            | PlayerState::Completion
            | PlayerState::Destroy => overlay.sink.release(),
            PlayerState::Start | PlayerState::Play | PlayerState::OnPlay => {
                if overlay.open {
                    overlay.sink.resume();
                }
            }
            PlayerState::Pause | PlayerState::OnPause => overlay.sink.pause(),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    initialized: bool,
    running: bool,
    items: VecDeque<DanmakuItem>,
}

/// In-memory sink; clones share the same queue
#[derive(Debug, Clone, Default)]
pub struct DanmakuQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl DanmakuQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take up to `max` comments for display; nothing while paused
    pub fn take_ready(&self, max: usize) -> Vec<DanmakuItem> {
        let mut queue = self.inner.lock();
        if !queue.running {
            return Vec::new();
        }
        let count = max.min(queue.items.len());
        queue.items.drain(..count).collect()
    }
}

impl DanmakuSink for DanmakuQueue {
    fn initialize(&mut self) {
        let mut queue = self.inner.lock();
        queue.initialized = true;
        queue.running = false;
    }

    fn add_batch(&mut self, contents: Vec<String>) {
        let mut queue = self.inner.lock();
        queue
            .items
            .extend(contents.into_iter().map(|content| DanmakuItem { content, own: false }));
    }

    fn add_single(&mut self, content: String, own: bool) {
        let mut queue = self.inner.lock();
        let item = DanmakuItem { content, own };
        // Own comments jump the queue so the sender sees them immediately
        if own {
            queue.items.push_front(item);
        } else {
            queue.items.push_back(item);
        }
    }

    fn pause(&mut self) {
        self.inner.lock().running = false;
    }

    fn resume(&mut self) {
        let mut queue = self.inner.lock();
        if queue.initialized {
            queue.running = true;
        }
    }

    fn release(&mut self) {
        let mut queue = self.inner.lock();
        queue.initialized = false;
        queue.running = false;
        queue.items.clear();
    }
}
