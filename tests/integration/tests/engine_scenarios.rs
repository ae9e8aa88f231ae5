//! End-to-end scenarios for the playback engine
//!
//! These tests verify the complete session flow including:
//! - Preparation, buffering and the first frame
//! - User versus host pauses
//! - Rebinding and stale decoder callbacks
//! - Network gating and the status prompt
//! - Teardown

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use xplayer::decoder::{BridgeCommand, DecoderFailure, FailureKind, MediaSource, TimelineFactory, TimelineProfile};
use xplayer::player::{EngineBuilder, NetworkType, PlayerContext, PlayerObserver, PlayerState};
use xplayer::utils::{Config, PlayerError};
use xplayer::widget::{DanmakuOverlay, DanmakuQueue, LoadingView, StatusPrompt, StatusView};
use xplayer_integration_tests::{dispatch_until, Harness, RecordingObserver};

#[test]
fn test_prepare_to_first_frame() -> Result<()> {
    let mut h = Harness::new()?;
    let decoder = h.decoder()?;

    h.engine.prepare_async()?;
    decoder.buffer(30);
    decoder.buffer(100);
    decoder.prepared();
    decoder.first_frame();
    decoder.progress(1_000, 60_000);
    h.engine.dispatch_pending()?;

    assert_eq!(
        h.recorder.states(),
        vec![
            PlayerState::Prepare,
            PlayerState::Buffer,
            PlayerState::Buffer,
            PlayerState::Start,
        ]
    );
    assert_eq!(h.recorder.buffers(), vec![30, 100]);
    assert_eq!(h.recorder.progress(), vec![(1_000, 60_000)]);
    assert_eq!(h.engine.duration(), Some(60_000));
    assert_eq!(h.engine.current_position(), 1_000);

    let commands = decoder.drain_commands();
    assert!(commands.contains(&BridgeCommand::Prepare(MediaSource::parse("/media/sample.mp4")?)));
    assert!(commands.contains(&BridgeCommand::Start));
    Ok(())
}

#[test]
fn test_without_auto_play_start_waits_for_request() -> Result<()> {
    let mut config = Config::default();
    config.engine.auto_play = false;
    let mut h = Harness::with_config(config)?;
    let decoder = h.decoder()?;

    h.engine.prepare_async()?;
    decoder.prepared();
    h.engine.dispatch_pending()?;
    assert!(!decoder.drain_commands().contains(&BridgeCommand::Start));
    assert_eq!(h.engine.state(), PlayerState::Prepare);

    h.engine.start()?;
    assert_eq!(decoder.drain_commands(), vec![BridgeCommand::Start]);
    Ok(())
}

#[test]
fn test_host_pause_does_not_override_user_pause() -> Result<()> {
    let mut h = Harness::new()?;
    h.play_to_start()?;
    h.recorder.clear();

    let remote = h.engine.handle();
    std::thread::spawn(move || remote.host_pause())
        .join()
        .expect("host thread panicked")?;
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::OnPause);

    h.engine.pause()?;
    h.engine.on_host_resume()?;
    assert_eq!(h.engine.state(), PlayerState::Pause);

    h.engine.resume()?;
    assert_eq!(
        h.recorder.states(),
        vec![PlayerState::OnPause, PlayerState::Pause, PlayerState::Play]
    );
    Ok(())
}

#[test]
fn test_pause_during_preparation_defers_start() -> Result<()> {
    let mut h = Harness::new()?;
    let decoder = h.decoder()?;
    h.engine.prepare_async()?;
    h.engine.pause()?;

    decoder.prepared();
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Pause);
    assert!(!decoder.drain_commands().contains(&BridgeCommand::Start));

    h.engine.resume()?;
    assert_eq!(h.engine.state(), PlayerState::Prepare);
    assert_eq!(decoder.drain_commands(), vec![BridgeCommand::Start]);

    decoder.first_frame();
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Start);
    Ok(())
}

#[test]
fn test_stale_callbacks_after_rebind() -> Result<()> {
    let mut h = Harness::new()?;
    let old = h.play_to_start()?;
    let old_generation = h.engine.generation();

    h.engine.unbind_and_release()?;
    assert_eq!(h.engine.state(), PlayerState::Stop);
    assert!(old.is_released());

    h.engine.bind_new()?;
    assert_eq!(h.engine.state(), PlayerState::Idle);
    assert_ne!(h.engine.generation(), old_generation);
    let new = h.decoder()?;
    h.engine.prepare_async()?;
    h.recorder.clear();

    old.completion();
    old.buffer(50);
    old.error(DecoderFailure::new(FailureKind::Connect, -1));
    new.buffer(20);
    h.engine.dispatch_pending()?;

    assert_eq!(h.recorder.states(), vec![PlayerState::Buffer]);
    assert_eq!(h.recorder.buffers(), vec![20]);
    Ok(())
}

#[test]
fn test_seek_rules() -> Result<()> {
    let mut h = Harness::new()?;
    assert!(matches!(h.engine.seek_to(500), Err(PlayerError::NotReady(_))));

    let decoder = h.play_to_start()?;
    h.engine.pause()?;
    decoder.drain_commands();
    h.engine.seek_to(9_000)?;
    assert_eq!(h.engine.state(), PlayerState::Pause);
    assert_eq!(decoder.drain_commands(), vec![BridgeCommand::SeekTo(9_000)]);

    h.engine.stop()?;
    assert!(matches!(h.engine.seek_to(500), Err(PlayerError::InvalidState(_))));
    Ok(())
}

#[test]
fn test_bind_while_bound_is_rejected() -> Result<()> {
    let mut h = Harness::new()?;
    let first = h.decoder()?;

    assert!(matches!(h.engine.bind_new(), Err(PlayerError::AlreadyBound)));
    let rejected = h.decoder()?;
    assert!(rejected.is_released());
    assert!(!first.is_released());
    assert_eq!(h.engine.generation(), Some(1));
    Ok(())
}

#[test]
fn test_network_gating() -> Result<()> {
    let mut config = Config::default();
    config.engine.allow_mobile_network = false;
    let mut h = Harness::with_config(config)?;
    h.engine.set_source("https://cdn.example.com/vod/42.m3u8")?;

    h.engine.set_network(NetworkType::Disconnected)?;
    h.engine.prepare_async()?;
    assert_eq!(h.engine.state(), PlayerState::Error);

    h.engine.set_network(NetworkType::Cellular)?;
    h.recorder.clear();
    h.engine.prepare_async()?;
    assert_eq!(h.recorder.states(), vec![PlayerState::Mobile]);
    assert_eq!(h.engine.state(), PlayerState::Error);

    // Local files never touch the network
    h.engine.set_source("/media/offline.mp4")?;
    h.engine.prepare_async()?;
    assert_eq!(h.engine.state(), PlayerState::Prepare);
    Ok(())
}

#[test]
fn test_mobile_prompt_round_trip() -> Result<()> {
    let mut config = Config::default();
    config.engine.allow_mobile_network = false;
    let mut h = Harness::with_config(config)?;
    h.engine.set_source("https://cdn.example.com/vod/42.m3u8")?;
    h.engine.set_network(NetworkType::Cellular)?;

    let status = Arc::new(StatusView::new().with_engine(h.engine.handle()));
    h.engine.register_observer(status.clone())?;

    h.engine.prepare_async()?;
    assert_eq!(status.prompt(), Some(StatusPrompt::Mobile));
    assert_eq!(h.engine.state(), PlayerState::Idle);

    status.press()?;
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Prepare);
    assert_eq!(status.prompt(), None);
    Ok(())
}

#[test]
fn test_continue_on_cellular_keeps_playing() -> Result<()> {
    let mut h = Harness::new()?;
    let status = Arc::new(StatusView::new().with_engine(h.engine.handle()));
    h.engine.register_observer(status.clone())?;

    let decoder = h.play_to_start()?;
    h.engine.set_network(NetworkType::Cellular)?;
    assert_eq!(status.prompt(), Some(StatusPrompt::Mobile));
    assert_eq!(h.engine.state(), PlayerState::Start);

    decoder.drain_commands();
    status.press()?;
    assert_eq!(status.prompt(), None);
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Start);
    assert!(decoder.drain_commands().is_empty());
    Ok(())
}

#[test]
fn test_error_prompt_retries_with_fresh_decoder() -> Result<()> {
    let mut h = Harness::new()?;
    let status = Arc::new(StatusView::new().with_engine(h.engine.handle()));
    h.engine.register_observer(status.clone())?;

    let old = h.play_to_start()?;
    old.error(DecoderFailure::new(FailureKind::Timeout, -110).with_detail("read timed out"));
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Error);
    assert_eq!(
        status.prompt(),
        Some(StatusPrompt::Error(FailureKind::Timeout.message().to_string()))
    );

    status.press()?;
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Prepare);
    assert_eq!(h.engine.generation(), Some(2));
    assert!(old.is_released());
    assert!(!h.decoder()?.is_released());
    Ok(())
}

#[test]
fn test_completion_replay_from_preview_prompt() -> Result<()> {
    let mut h = Harness::new()?;
    let status = Arc::new(StatusView::new().with_preview(true).with_engine(h.engine.handle()));
    h.engine.register_observer(status.clone())?;
    let comments = DanmakuQueue::new();
    let overlay = Arc::new(DanmakuOverlay::new(comments.clone()));
    h.engine.register_observer(overlay.clone())?;

    let decoder = h.play_to_start()?;
    assert!(comments.is_running());
    decoder.completion();
    h.engine.dispatch_pending()?;
    assert_eq!(status.prompt(), Some(StatusPrompt::Completion));
    assert!(!comments.is_initialized());

    decoder.drain_commands();
    status.press()?;
    h.engine.dispatch_pending()?;
    assert_eq!(h.engine.state(), PlayerState::Play);
    assert_eq!(
        decoder.drain_commands(),
        vec![BridgeCommand::SeekTo(0), BridgeCommand::Start]
    );
    assert!(comments.is_initialized());
    assert!(comments.is_running());

    overlay.add_item("again", false);
    assert_eq!(comments.take_ready(1)[0].content, "again");
    Ok(())
}

#[test]
fn test_reset_then_bind_prepares_same_source() -> Result<()> {
    let mut h = Harness::new()?;
    let old = h.play_to_start()?;

    h.engine.reset()?;
    h.engine.bind_new()?;
    h.engine.prepare_async()?;
    assert_eq!(h.engine.state(), PlayerState::Prepare);

    h.recorder.clear();
    old.completion();
    old.error(DecoderFailure::new(FailureKind::DecodeFailed, -1));
    h.engine.dispatch_pending()?;
    assert!(h.recorder.states().is_empty());
    assert_eq!(h.engine.state(), PlayerState::Prepare);
    Ok(())
}

#[test]
fn test_destroy_drops_queued_decoder_callbacks() -> Result<()> {
    let mut h = Harness::new()?;
    let decoder = h.play_to_start()?;

    decoder.buffer(30);
    decoder.buffering_start();
    decoder.completion();
    decoder.error(DecoderFailure::new(FailureKind::Timeout, -110));

    h.engine.destroy()?;
    assert_eq!(h.recorder.last_state(), Some(PlayerState::Destroy));
    h.recorder.clear();

    assert!(h.engine.dispatch_pending().is_err());
    assert!(matches!(h.engine.handle().start(), Err(PlayerError::Destroyed)));
    assert!(h.recorder.states().is_empty());
    assert!(h.recorder.buffers().is_empty());
    Ok(())
}

#[test]
fn test_destroy_through_handle() -> Result<()> {
    let mut h = Harness::new()?;
    let decoder = h.play_to_start()?;
    let remote = h.engine.handle();

    remote.destroy()?;
    remote.start()?;
    assert_eq!(h.engine.dispatch_pending()?, 1);
    assert!(h.engine.is_destroyed());
    assert_eq!(h.recorder.last_state(), Some(PlayerState::Destroy));
    assert!(decoder.is_released());

    assert!(matches!(h.engine.prepare_async(), Err(PlayerError::Destroyed)));
    assert!(matches!(h.engine.dispatch_pending(), Err(PlayerError::Destroyed)));
    assert!(matches!(remote.start(), Err(PlayerError::Destroyed)));

    drop(h);
    assert!(matches!(remote.start(), Err(PlayerError::Destroyed)));
    Ok(())
}

#[test]
fn test_widgets_follow_engine() -> Result<()> {
    let mut h = Harness::new()?;
    let loading = Arc::new(LoadingView::new());
    h.engine.register_observer(loading.clone())?;

    let decoder = h.decoder()?;
    h.engine.prepare_async()?;
    assert!(loading.is_loading_visible());

    decoder.prepared();
    decoder.first_frame();
    h.engine.dispatch_pending()?;
    assert!(!loading.is_loading_visible());

    h.engine.pause()?;
    assert!(loading.is_play_button_visible());
    Ok(())
}

#[test]
fn test_dropped_observer_is_skipped() -> Result<()> {
    let mut h = Harness::new()?;
    let transient = RecordingObserver::new();
    h.engine.register_observer(transient.clone())?;
    assert_eq!(h.engine.observers().len(), 2);

    drop(transient);
    h.engine.prepare_async()?;
    assert_eq!(h.engine.observers().len(), 1);
    assert_eq!(h.recorder.states(), vec![PlayerState::Prepare]);
    Ok(())
}

#[test]
fn test_unregister_from_inside_callback() -> Result<()> {
    struct OneShot {
        seen: RecordingObserver,
        observers: xplayer::player::ObserverSet,
        me: parking_lot::Mutex<Option<Arc<dyn PlayerObserver>>>,
    }

    impl PlayerObserver for OneShot {
        fn on_player_state(&self, state: PlayerState, message: &str) {
            self.seen.on_player_state(state, message);
            if let Some(me) = self.me.lock().take() {
                self.observers.unregister(&me);
            }
        }
    }

    let mut h = Harness::new()?;
    let one_shot = Arc::new(OneShot {
        seen: RecordingObserver::default(),
        observers: h.engine.observers().clone(),
        me: parking_lot::Mutex::new(None),
    });
    let as_observer: Arc<dyn PlayerObserver> = one_shot.clone();
    *one_shot.me.lock() = Some(as_observer.clone());
    h.engine.register_observer(as_observer)?;

    h.play_to_start()?;
    assert_eq!(one_shot.seen.states(), vec![PlayerState::Prepare]);
    assert_eq!(h.recorder.states().first(), Some(&PlayerState::Prepare));
    assert_eq!(h.recorder.last_state(), Some(PlayerState::Start));
    Ok(())
}

#[tokio::test]
async fn test_timeline_backend_plays_to_completion() -> Result<()> {
    let profile = TimelineProfile {
        duration: Duration::from_millis(300),
        prepare_step: Duration::from_millis(5),
        ..TimelineProfile::default()
    };
    let recorder = RecordingObserver::new();
    let mut engine = EngineBuilder::new()
        .with_context(PlayerContext::new("timeline-e2e"))
        .with_factory(Box::new(TimelineFactory::new(profile)))
        .with_observer(recorder.clone())
        .build()?;

    engine.bind_new()?;
    engine.set_source("/media/sample.mp4")?;
    engine.prepare_async()?;

    let engine = tokio::task::spawn_blocking(move || -> Result<_> {
        dispatch_until(&mut engine, PlayerState::Completion, Duration::from_secs(5))?;
        Ok(engine)
    })
    .await??;

    let states = recorder.states();
    assert_eq!(states.first(), Some(&PlayerState::Prepare));
    assert!(states.contains(&PlayerState::Start));
    assert_eq!(states.last(), Some(&PlayerState::Completion));
    assert_eq!(recorder.buffers(), vec![25, 50, 75, 100]);
    assert_eq!(recorder.sizes(), vec![(1280, 720)]);
    assert_eq!(engine.duration(), Some(300));
    Ok(())
}
