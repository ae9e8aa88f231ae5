//! Status prompt: cellular warning, end of preview and playback failure
//!
//! The prompt's button posts commands back to the engine through an
//! `EngineHandle`, the same way any other thread would.

use parking_lot::Mutex;

use crate::player::{EngineHandle, PlayerObserver, PlayerScene, PlayerState};
use crate::utils::error::Result;

/// Prompt currently shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPrompt {
    /// Playing would use the cellular network
    Mobile,

    /// Preview finished
    Completion,

    /// Playback failed, with the engine's message
    Error(String),
}

impl StatusPrompt {
    pub fn tip(&self) -> &str {
        match self {
            StatusPrompt::Mobile => "You are on a cellular network",
            StatusPrompt::Completion => "Preview finished",
            StatusPrompt::Error(message) => message,
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            StatusPrompt::Mobile => "Continue",
            StatusPrompt::Completion => "Replay",
            StatusPrompt::Error(_) => "Retry",
        }
    }
}

#[derive(Debug, Default)]
struct StatusState {
    prompt: Option<StatusPrompt>,
    scene: PlayerScene,
}

pub struct StatusView {
    engine: Option<EngineHandle>,
    preview: bool,
    state: Mutex<StatusState>,
}

impl StatusView {
    pub fn new() -> Self {
        Self {
            engine: None,
            preview: false,
            state: Mutex::new(StatusState::default()),
        }
    }

    /// Let the prompt's button drive the engine
    pub fn with_engine(mut self, engine: EngineHandle) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Show the completion prompt (only meaningful for previews)
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn prompt(&self) -> Option<StatusPrompt> {
        self.state.lock().prompt.clone()
    }

    /// Press the prompt's button; the prompt is dismissed
    pub fn press(&self) -> Result<()> {
        let Some(engine) = &self.engine else {
            log::debug!("Status prompt pressed with no engine attached");
            return Ok(());
        };
        let Some(prompt) = self.state.lock().prompt.take() else {
            return Ok(());
        };

        match prompt {
            StatusPrompt::Mobile => engine.continue_on_mobile(),
            StatusPrompt::Completion => engine.start(),
            StatusPrompt::Error(_) => engine.toggle_play(),
        }
    }
}

impl Default for StatusView {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerObserver for StatusView {
    fn on_player_state(&self, state: PlayerState, message: &str) {
        let mut view = self.state.lock();
        let window = view.scene.is_window();
        let prompt = match state {
            PlayerState::Completion if self.preview => Some(StatusPrompt::Completion),
            PlayerState::Mobile if !window => Some(StatusPrompt::Mobile),
            PlayerState::Error if !window => Some(StatusPrompt::Error(message.to_string())),
            PlayerState::Mobile | PlayerState::Error => return,
            _ => None,
        };
        view.prompt = prompt;
    }

    fn on_player_scene(&self, scene: PlayerScene) {
        self.state.lock().scene = scene;
    }
}
