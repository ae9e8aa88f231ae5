use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use xplayer::decoder::{Backend, TimelineFactory, TimelineProfile};
use xplayer::player::{
    EngineBuilder, PlayerContext, PlayerObserver, PlayerState, RenderSurface, StateChange,
};
use xplayer::utils::{format_millis, load_config, Config};
use xplayer::widget::ControlBar;

/// xplayer - play a source through the timeline backend and report every state change
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media source (path or URL)
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Configuration file (defaults to the system and user config files)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Restart from the beginning instead of completing
    #[arg(short, long = "loop")]
    looping: bool,

    /// Treat the source as a live stream
    #[arg(long)]
    live: bool,

    /// Length of the simulated media in seconds
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    duration: u64,

    /// Simulate the host going to the background after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pause_after: Option<u64>,

    /// Stop after this many seconds (live and looping sources never end)
    #[arg(long, value_name = "SECONDS")]
    stop_after: Option<u64>,

    /// Print state changes as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config().context("Failed to load config")?,
    };
    config.engine.loop_playback |= args.looping;
    config.decoder.live |= args.live;

    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting xplayer v{}", env!("CARGO_PKG_VERSION"));

    if config.decoder.backend == Backend::Bridge {
        bail!("The bridge backend is driven by native bindings and cannot run from the command line");
    }

    let profile = TimelineProfile {
        duration: Duration::from_secs(args.duration.max(1)),
        ..TimelineProfile::default()
    };

    let logger = Arc::new(LoggingObserver { json: args.json });
    let control_bar = Arc::new(ControlBar::new());

    let mut engine = EngineBuilder::new()
        .with_config(config)
        .with_context(PlayerContext::new("xplayer-cli"))
        .with_factory(Box::new(TimelineFactory::new(profile)))
        .with_observer(logger.clone())
        .with_observer(control_bar.clone())
        .build()?;

    let surface = RenderSurface::new();
    engine.bind_new()?;
    engine.attach_surface(surface.handle())?;
    engine.set_source(&args.source)?;
    engine.prepare_async()?;

    let started = Instant::now();
    let mut host_paused_at: Option<Instant> = None;
    let mut host_pause_done = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }

        engine.dispatch_pending()?;

        match engine.state() {
            PlayerState::Completion => {
                info!("Played {}", control_bar.snapshot().time_label());
                break;
            }
            PlayerState::Error => {
                engine.destroy()?;
                bail!("Playback failed");
            }
            _ => {}
        }

        if let Some(after) = args.pause_after {
            if !host_pause_done && started.elapsed() >= Duration::from_secs(after) {
                match host_paused_at {
                    None => {
                        engine.on_host_pause()?;
                        host_paused_at = Some(Instant::now());
                    }
                    Some(at) if at.elapsed() >= Duration::from_secs(1) => {
                        engine.on_host_resume()?;
                        host_pause_done = true;
                    }
                    Some(_) => {}
                }
            }
        }

        if let Some(limit) = args.stop_after {
            if started.elapsed() >= Duration::from_secs(limit) {
                engine.stop()?;
                break;
            }
        }
    }

    engine.destroy()?;
    Ok(())
}

/// Observer that logs every notification
struct LoggingObserver {
    json: bool,
}

impl PlayerObserver for LoggingObserver {
    fn on_player_state(&self, state: PlayerState, message: &str) {
        if self.json {
            let change = StateChange::new(state, message);
            match serde_json::to_string(&change) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize state change: {}", e),
            }
            return;
        }

        match state {
            PlayerState::Error => error!("{}: {}", state, message),
            _ => info!("{}: {}", state, message),
        }
    }

    fn on_buffer(&self, percent: u8) {
        log::debug!("Buffered: {}%", percent);
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        // Log position changes at debug level to avoid spam
        if duration_ms == 0 {
            log::debug!("Position: {} (live)", format_millis(position_ms));
        } else {
            log::debug!("Position: {} / {}", format_millis(position_ms), format_millis(duration_ms));
        }
    }

    fn on_video_size_changed(&self, width: u32, height: u32) {
        info!("Video size: {}x{}", width, height);
    }
}
