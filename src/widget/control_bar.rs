//! Bottom control bar: play/pause icon, progress and buffered amount

use parking_lot::Mutex;
use serde::Serialize;

use crate::player::{Orientation, PlayerObserver, PlayerScene, PlayerState};
use crate::utils::format_millis;

/// What the control bar currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlBarSnapshot {
    pub visible: bool,

    /// Play/pause button shows the "playing" icon
    pub playing: bool,

    pub position_ms: u64,

    /// 0 for live streams
    pub duration_ms: u64,

    pub buffered_percent: u8,

    /// Title row is shown in landscape only
    pub title_visible: bool,
}

impl ControlBarSnapshot {
    /// "MM:SS / MM:SS", or just the position for live streams
    pub fn time_label(&self) -> String {
        if self.duration_ms == 0 {
            format_millis(self.position_ms)
        } else {
            format!("{} / {}", format_millis(self.position_ms), format_millis(self.duration_ms))
        }
    }
}

#[derive(Debug, Default)]
struct ControlBarState {
    snapshot: ControlBarSnapshot,
    scene: PlayerScene,
}

#[derive(Debug, Default)]
pub struct ControlBar {
    state: Mutex<ControlBarState>,
}

impl ControlBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ControlBarSnapshot {
        self.state.lock().snapshot.clone()
    }

    fn reset(bar: &mut ControlBarState) {
        bar.snapshot = ControlBarSnapshot {
            title_visible: bar.snapshot.title_visible,
            ..ControlBarSnapshot::default()
        };
    }
}

impl PlayerObserver for ControlBar {
    fn on_player_state(&self, state: PlayerState, _message: &str) {
        let mut bar = self.state.lock();
        match state {
            PlayerState::Reset | PlayerState::Stop => Self::reset(&mut bar),
            PlayerState::Start => {
                bar.snapshot.visible = !bar.scene.is_window();
                bar.snapshot.playing = true;
            }
            PlayerState::Play | PlayerState::OnPlay => bar.snapshot.playing = true,
            PlayerState::Pause | PlayerState::OnPause | PlayerState::Completion | PlayerState::Error => {
                bar.snapshot.playing = false
            }
            PlayerState::Prepare => bar.snapshot.visible = false,
            _ => {}
        }
    }

    fn on_buffer(&self, percent: u8) {
        self.state.lock().snapshot.buffered_percent = percent;
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        let mut bar = self.state.lock();
        bar.snapshot.position_ms = position_ms;
        bar.snapshot.duration_ms = duration_ms;
    }

    fn on_orientation(&self, orientation: Orientation) {
        self.state.lock().snapshot.title_visible = orientation == Orientation::Landscape;
    }

    fn on_player_scene(&self, scene: PlayerScene) {
        let mut bar = self.state.lock();
        bar.scene = scene;
        if scene.is_window() {
            bar.snapshot.visible = false;
        } else if bar.snapshot.playing {
            bar.snapshot.visible = true;
        }
    }
}
