//! Loading indicator and centered play button

use parking_lot::Mutex;

use crate::player::{PlayerObserver, PlayerScene, PlayerState};

#[derive(Debug, Default)]
struct LoadingState {
    loading: bool,
    play_button: bool,
    scene: PlayerScene,
}

/// Spinner shown while preparing or buffering, play button while idle or paused
#[derive(Debug, Default)]
pub struct LoadingView {
    state: Mutex<LoadingState>,
}

impl LoadingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading_visible(&self) -> bool {
        self.state.lock().loading
    }

    pub fn is_play_button_visible(&self) -> bool {
        self.state.lock().play_button
    }
}

impl PlayerObserver for LoadingView {
    fn on_player_state(&self, state: PlayerState, _message: &str) {
        let mut view = self.state.lock();
        if view.scene.is_window() {
            view.loading = false;
            view.play_button = false;
            return;
        }

        let (loading, play_button) = match state {
            PlayerState::Reset | PlayerState::Stop | PlayerState::Pause | PlayerState::OnPause => {
                (false, true)
            }
            PlayerState::Prepare | PlayerState::Buffer => (true, false),
            _ => (false, false),
        };
        view.loading = loading;
        view.play_button = play_button;
    }

    fn on_player_scene(&self, scene: PlayerScene) {
        let mut view = self.state.lock();
        view.scene = scene;
        if scene.is_window() {
            view.loading = false;
            view.play_button = false;
        }
    }
}
