//! services/api/src/bin/ambient.rs
//!
//! Plays a NightFall ambient track through the default audio device.

use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::{CpalOutput, HttpSoundSessionLog, TracingSoundSessionLog};
use api_lib::error::ApiError;
use clap::Parser;
use nightfall_core::ports::SoundSessionLog;
use nightfall_core::sound::{PlaybackState, SoundEngine, SoundPlayer, SLEEP_TIMER_PRESETS_MINUTES};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ambient", about = "Procedural sleep sounds for NightFall")]
struct Args {
    /// Track id: rain, ocean, forest, white-noise, pink-noise or brown-noise
    #[arg(default_value = "rain")]
    track: String,

    /// Master volume between 0.0 and 1.0
    #[arg(long, default_value_t = 0.7)]
    volume: f32,

    /// Stop after this many minutes (15, 30, 60, 120, 180, 300 or 480)
    #[arg(long, value_parser = parse_sleep_timer)]
    sleep_timer: Option<u64>,

    /// NightFall API to log the playback to, e.g. http://localhost:3000
    #[arg(long, requires = "session_token")]
    api_url: Option<String>,

    /// Session token sent as the session cookie when logging to the API
    #[arg(long, requires = "api_url")]
    session_token: Option<String>,

    /// Name of the session cookie
    #[arg(long, default_value = "nightfall_session")]
    cookie_name: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_sleep_timer(value: &str) -> Result<u64, String> {
    let minutes: u64 = value.parse().map_err(|_| format!("'{}' is not a number", value))?;
    if SLEEP_TIMER_PRESETS_MINUTES.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(format!("choose one of {:?}", SLEEP_TIMER_PRESETS_MINUTES))
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Parse Arguments & Set Up Logging ---
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- 2. Choose Where Playback Is Logged ---
    let log: Arc<dyn SoundSessionLog> = match (&args.api_url, &args.session_token) {
        (Some(api_url), Some(token)) => Arc::new(HttpSoundSessionLog::new(
            reqwest::Client::new(),
            api_url,
            &args.cookie_name,
            token,
        )),
        _ => Arc::new(TracingSoundSessionLog),
    };

    // --- 3. Open the Device & Start Playback ---
    let output = CpalOutput::new()?;
    let mut player = SoundPlayer::new(SoundEngine::new(Box::new(output)), log);
    player.set_volume(args.volume);
    player.toggle(&args.track)?;
    if let Some(minutes) = args.sleep_timer {
        player.arm_sleep_timer(minutes);
        info!(minutes, "sleep timer armed");
    }

    // --- 4. Play Until Interrupted or the Timer Fires ---
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping playback");
                break;
            }
            _ = ticker.tick() => {
                if player.state() == PlaybackState::Idle {
                    break;
                }
            }
        }
    }
    player.cancel_sleep_timer();
    player.stop();
    Ok(())
}
