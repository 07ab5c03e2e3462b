#![allow(clippy::cast_possible_truncation)] // Intentional f32->u32 casts for display values
#![allow(clippy::cast_precision_loss)] // u32->f32 in percentage and timing calculations

//! Car dashboard simulator.
//!
//! Runs the dashboard screens in an SDL window at 320x240, fed by simulated GPS,
//! network and media daemons through an in-process key-value store.
//!
//! ```text
//! daemon feed ──► MemoryStore ◄── button requests
//!                     │
//!               FetchBridge (worker thread)
//!                     │
//!                     ▼
//!  SDL window ◄──► Application (30 Hz)
//! ```
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `0` | Normal exit |
//! | `16` | Internal error |
//! | `17` | Fetch worker did not stop in time |
//!
//! Set `RUST_LOG` to change the log filter (default `info`).

mod feed;
mod keys;
mod screens;
mod simulator;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use dashboard_ui::config::{FRAME_RATE, JOIN_TIMEOUT, SCREEN_HEIGHT, SCREEN_WIDTH};
use dashboard_ui::{AppConfig, AppError, Application, ExitStatus, FetchBridge, FetchConfig, MemoryStore};
use embedded_graphics::geometry::Size;
use tracing_subscriber::EnvFilter;

use crate::feed::Feed;
use crate::simulator::SimulatorPlatform;

// Unix keeps the low 8 bits only: 0x1000 and 0x1100 would both exit 0
const EXIT_OK: i32 = 0;
const EXIT_INTERNAL_ERROR: i32 = 0x10;
const EXIT_JOIN_TIMEOUT: i32 = 0x11;

const WINDOW_TITLE: &str = "Car Dashboard";

#[derive(Parser, Debug)]
#[command(name = "dashboard-ui", version, about = "Car dashboard UI simulator")]
struct Args {
    /// Run without window chrome; Escape exits
    #[arg(long)]
    fullscreen: bool,

    /// Window pixel scale
    #[arg(long, default_value_t = 2)]
    scale: u32,

    /// Hide the pointer (touch panel)
    #[arg(long)]
    hide_pointer: bool,

    /// Target frame rate
    #[arg(long, default_value_t = FRAME_RATE)]
    fps: u32,

    /// Seconds to wait for the fetch worker on exit
    #[arg(long, default_value_t = JOIN_TIMEOUT.as_secs())]
    join_timeout: u64,

    /// Directory of raw RGB565 icons overriding the built-in ones
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Start without the simulated daemons (every value reads as absent)
    #[arg(long)]
    no_feed: bool,
}

impl Args {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            screen: Size::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            fullscreen: self.fullscreen,
            show_pointer: !self.hide_pointer,
            frame_time: Duration::from_micros(1_000_000 / u64::from(self.fps.max(1))),
            join_timeout: Duration::from_secs(self.join_timeout),
            ..AppConfig::default()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = args.app_config();
    let store = MemoryStore::new();

    let feed = if args.no_feed {
        None
    } else {
        match Feed::start(store.clone()) {
            Ok(feed) => Some(feed),
            Err(err) => {
                tracing::error!(error = %err, "failed to start simulated daemons");
                process::exit(EXIT_INTERNAL_ERROR);
            }
        }
    };

    let mut app = Application::new(config.clone());
    let outcome = run(&mut app, &store, &args);
    let status = app.shutdown(&outcome, config.join_timeout);
    if let Some(feed) = feed {
        feed.stop();
    }
    process::exit(exit_code(status));
}

fn run(
    app: &mut Application,
    store: &MemoryStore,
    args: &Args,
) -> Result<(), AppError> {
    load_icons(app, args.assets.as_deref());

    let bridge = FetchBridge::spawn(store.clone(), Vec::new(), FetchConfig::default())?;
    app.attach_fetch(bridge);

    let dashboard = screens::build(app, store)?;
    app.show_page(dashboard.gps)?;

    let mut platform = SimulatorPlatform::new(app.config().screen, args.scale, WINDOW_TITLE);
    app.run(&mut platform)
}

/// Install the generated icons, then replace any that exist as files in `dir`.
fn load_icons(
    app: &mut Application,
    dir: Option<&Path>,
) {
    if let Err(err) = screens::install_icons(app.assets_mut()) {
        tracing::warn!(error = %err, "failed to generate icons");
    }
    let Some(dir) = dir else {
        return;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "assets directory unreadable");
        return;
    };
    for path in entries.filter_map(Result::ok).map(|entry| entry.path()) {
        if path.extension().is_none_or(|ext| ext != "raw") {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        // On failure the generated icon stays in place
        if let Err(err) = app.assets_mut().load(key, &path, screens::ICON_SIZE) {
            tracing::warn!(key, error = %err, "icon file rejected");
        }
    }
}

const fn exit_code(status: ExitStatus) -> i32 {
    match status {
        ExitStatus::Normal => EXIT_OK,
        ExitStatus::InternalError => EXIT_INTERNAL_ERROR,
        ExitStatus::WorkerJoinTimeout => EXIT_JOIN_TIMEOUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let codes = [ExitStatus::Normal, ExitStatus::InternalError, ExitStatus::WorkerJoinTimeout].map(exit_code);
        assert_eq!(codes, [0, 16, 17]);
        for code in &codes[1..] {
            assert_eq!(code & 0xFF, *code, "failure codes survive the 8-bit exit status");
            assert_ne!(code & 0xFF, 0, "failure never reads as success");
        }
    }

    #[test]
    fn test_args_to_config() {
        let args = Args::parse_from(["dashboard-ui", "--fullscreen", "--fps", "50", "--join-timeout", "2"]);
        let config = args.app_config();
        assert!(config.fullscreen);
        assert!(config.show_pointer);
        assert_eq!(config.frame_time, Duration::from_millis(20));
        assert_eq!(config.join_timeout, Duration::from_secs(2));
        assert_eq!(args.scale, 2);
    }
}
