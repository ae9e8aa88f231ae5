//! Observer fan-out checked with mock observers

use anyhow::Result;
use mockall::{mock, predicate::eq, Sequence};
use std::sync::Arc;

use xplayer::player::{PlayerObserver, PlayerScene, PlayerState};
use xplayer_integration_tests::Harness;

mock! {
    pub Observer {}

    impl PlayerObserver for Observer {
        fn on_player_state(&self, state: PlayerState, message: &str);
        fn on_buffer(&self, percent: u8);
        fn on_player_scene(&self, scene: PlayerScene);
    }
}

#[test]
fn test_observers_notified_in_registration_order() -> Result<()> {
    let mut h = Harness::new()?;
    let mut seq = Sequence::new();
    let mut first = MockObserver::new();
    let mut second = MockObserver::new();

    for state in [PlayerState::Prepare, PlayerState::Buffer] {
        first
            .expect_on_player_state()
            .withf(move |s, _| *s == state)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        second
            .expect_on_player_state()
            .withf(move |s, _| *s == state)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
    }
    first.expect_on_buffer().with(eq(40)).times(1).return_const(());
    second.expect_on_buffer().with(eq(40)).times(1).return_const(());

    let first: Arc<dyn PlayerObserver> = Arc::new(first);
    let second: Arc<dyn PlayerObserver> = Arc::new(second);
    h.engine.register_observer(first.clone())?;
    h.engine.register_observer(second.clone())?;

    let decoder = h.decoder()?;
    h.engine.prepare_async()?;
    decoder.buffer(40);
    h.engine.dispatch_pending()?;
    Ok(())
}

#[test]
fn test_duplicate_registration_notifies_once() -> Result<()> {
    let mut h = Harness::new()?;
    let mut observer = MockObserver::new();
    observer
        .expect_on_player_state()
        .withf(|state, _| *state == PlayerState::Prepare)
        .times(1)
        .return_const(());

    let observer: Arc<dyn PlayerObserver> = Arc::new(observer);
    h.engine.register_observer(observer.clone())?;
    h.engine.register_observer(observer.clone())?;
    h.engine.prepare_async()?;
    Ok(())
}

#[test]
fn test_unregistered_observer_hears_nothing() -> Result<()> {
    let mut h = Harness::new()?;
    let mut observer = MockObserver::new();
    observer.expect_on_player_state().never();
    observer.expect_on_player_scene().never();

    let observer: Arc<dyn PlayerObserver> = Arc::new(observer);
    h.engine.register_observer(observer.clone())?;
    assert!(h.engine.unregister_observer(&observer));
    assert!(!h.engine.unregister_observer(&observer));

    h.engine.set_player_scene(PlayerScene::PictureInPicture)?;
    h.engine.prepare_async()?;
    assert_eq!(h.recorder.scenes(), vec![PlayerScene::PictureInPicture]);
    Ok(())
}
