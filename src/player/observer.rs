//! Observer fan-out
//!
//! Observers are held weakly: dropping the last strong reference is as good
//! as unregistering. Notifications snapshot the live set first and then
//! call out without holding the lock, so an observer may register or
//! unregister (itself or others) from inside a callback. Such changes take
//! effect from the next notification on.
//!
//! Callbacks run on the engine thread and must not block.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

use super::PlayerState;

/// Receives engine notifications
pub trait PlayerObserver: Send + Sync {
    /// Called for every decided transition, in order
    fn on_player_state(&self, state: PlayerState, message: &str);

    /// Buffered percentage
    fn on_buffer(&self, _percent: u8) {}

    /// Playback position and duration in milliseconds; duration is 0 for live
    fn on_progress(&self, _position_ms: u64, _duration_ms: u64) {}

    fn on_video_size_changed(&self, _width: u32, _height: u32) {}

    fn on_orientation(&self, _orientation: Orientation) {}

    fn on_player_scene(&self, _scene: PlayerScene) {}
}

/// Presentation context the player is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerScene {
    /// Embedded in a regular page
    #[default]
    Normal,

    /// Floating window inside the application
    ActivityWindow,

    /// Floating window above other applications
    GlobalWindow,

    /// Picture-in-picture
    PictureInPicture,

    /// Inline in a scrolling list
    List,
}

impl PlayerScene {
    /// Small floating presentations that hide most controls
    pub fn is_window(self) -> bool {
        matches!(
            self,
            PlayerScene::ActivityWindow | PlayerScene::GlobalWindow | PlayerScene::PictureInPicture
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Ordered set of weakly held observers
#[derive(Clone, Default)]
pub struct ObserverSet {
    entries: Arc<Mutex<Vec<Weak<dyn PlayerObserver>>>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer at the end; returns false if it was already present
    pub fn register(&self, observer: Arc<dyn PlayerObserver>) -> bool {
        let weak = Arc::downgrade(&observer);
        let mut entries = self.entries.lock();
        entries.retain(|entry| entry.strong_count() > 0);

        if entries.iter().any(|entry| Weak::ptr_eq(entry, &weak)) {
            return false;
        }
        entries.push(weak);
        true
    }

    /// Remove an observer; returns false if it was not registered
    pub fn unregister(&self, observer: &Arc<dyn PlayerObserver>) -> bool {
        let weak = Arc::downgrade(observer);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.strong_count() > 0 && !Weak::ptr_eq(entry, &weak));
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Live observers in registration order
    pub fn snapshot(&self) -> Vec<Arc<dyn PlayerObserver>> {
        let mut entries = self.entries.lock();
        entries.retain(|entry| entry.strong_count() > 0);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn notify_state(&self, state: PlayerState, message: &str) {
        for observer in self.snapshot() {
            observer.on_player_state(state, message);
        }
    }

    pub fn notify_buffer(&self, percent: u8) {
        for observer in self.snapshot() {
            observer.on_buffer(percent);
        }
    }

    pub fn notify_progress(&self, position_ms: u64, duration_ms: u64) {
        for observer in self.snapshot() {
            observer.on_progress(position_ms, duration_ms);
        }
    }

    pub fn notify_video_size(&self, width: u32, height: u32) {
        for observer in self.snapshot() {
            observer.on_video_size_changed(width, height);
        }
    }

    pub fn notify_orientation(&self, orientation: Orientation) {
        for observer in self.snapshot() {
            observer.on_orientation(orientation);
        }
    }

    pub fn notify_scene(&self, scene: PlayerScene) {
        for observer in self.snapshot() {
            observer.on_player_scene(scene);
        }
    }
}
