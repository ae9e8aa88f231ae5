//! Configuration files and environment overrides feeding the engine builder

use anyhow::Result;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

use xplayer::decoder::Backend;
use xplayer::player::PlayerState;
use xplayer::utils::{Config, PlayerError};
use xplayer_integration_tests::Harness;

fn write_config(dir: &TempDir, contents: &str) -> Result<std::path::PathBuf> {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
#[serial]
fn test_partial_file_keeps_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[engine]\nloop_playback = true\n")?;

    let config = Config::from_file(&path)?;
    assert!(config.engine.loop_playback);
    assert!(config.engine.auto_play);
    assert_eq!(config.decoder.backend, Backend::Timeline);
    assert_eq!(config.general.log_level, "info");
    Ok(())
}

#[test]
#[serial]
fn test_looping_config_reaches_engine() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[engine]\nloop_playback = true\n")?;

    let mut h = Harness::with_config(Config::from_file(&path)?)?;
    assert!(h.engine.is_looping());

    let decoder = h.play_to_start()?;
    h.recorder.clear();
    decoder.completion();
    h.engine.dispatch_pending()?;
    assert!(h.recorder.states().is_empty());
    assert_eq!(h.engine.state(), PlayerState::Start);
    Ok(())
}

#[test]
#[serial]
fn test_env_overrides_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[decoder]\nlive = false\n")?;

    std::env::set_var("XPLAYER_LIVE", "true");
    let loaded = Config::from_file(&path);
    std::env::remove_var("XPLAYER_LIVE");

    assert!(loaded?.decoder.live);
    Ok(())
}

#[test]
#[serial]
fn test_invalid_values_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[general]\nlog_level = \"loud\"\n")?;
    assert!(matches!(Config::from_file(&path), Err(PlayerError::Config(_))));

    let path = write_config(&dir, "[decoder]\nbackend = \"vlc\"\n")?;
    assert!(matches!(Config::from_file(&path), Err(PlayerError::Config(_))));
    Ok(())
}

#[test]
#[serial]
fn test_round_trip_through_save() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.engine.allow_mobile_network = false;
    config.decoder.progress_interval_ms = 250;
    config.save_to(&path)?;

    let loaded = Config::from_file(&path)?;
    assert!(!loaded.engine.allow_mobile_network);
    assert_eq!(loaded.decoder.progress_interval_ms, 250);
    Ok(())
}
