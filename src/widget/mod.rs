//! Overlay widgets for xplayer
//!
//! Each widget is a `PlayerObserver` that keeps its own presentation state
//! (what would be visible) in reaction to engine notifications. Widgets
//! are rendering-agnostic: a UI layer reads their state and draws it.

mod control_bar;
mod danmaku;
mod loading;
mod status;

pub use control_bar::{ControlBar, ControlBarSnapshot};
pub use danmaku::{DanmakuItem, DanmakuOverlay, DanmakuQueue, DanmakuSink};
pub use loading::LoadingView;
pub use status::{StatusPrompt, StatusView};
