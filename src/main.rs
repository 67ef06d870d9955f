#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

use std::env;

use anyhow::{bail, Context};
use giftfall::constants::LOOP_TIME;
use giftfall::events::{EventSink, LevelEvent};
use giftfall::formatter::{self, FrameFormatter};
use giftfall::host::PlayerHandle;
use giftfall::progress::{MemoryStore, Progress, UNLOCKED_LEVEL_KEY};
use giftfall::session::{GameSession, SessionInput};
use giftfall::systems::EntityKind;
use glam::Vec2;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Logs every reported event; stands in for the HUD.
struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &LevelEvent) {
        info!(event = event.name(), ?event, "Reported");
    }
}

struct RunArgs {
    level: u8,
    frames: u64,
    seed: Option<u64>,
}

fn parse_args() -> anyhow::Result<RunArgs> {
    let mut args = RunArgs {
        level: 1,
        frames: 60 * 60,
        seed: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| iter.next().with_context(|| format!("{name} expects a value"));
        match arg.as_str() {
            "--level" | "-l" => args.level = value("--level")?.parse().context("invalid level id")?,
            "--frames" | "-f" => args.frames = value("--frames")?.parse().context("invalid frame count")?,
            "--seed" | "-s" => args.seed = Some(value("--seed")?.parse().context("invalid seed")?),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// Chases the nearest collectible gift and fires at frozen ones.
fn autopilot(session: &mut GameSession, frame: u64) -> SessionInput {
    let from = session.player().position();
    let Some(level) = session.level_mut() else {
        return SessionInput::default();
    };
    let armed = level.star_ammo() > 0;
    let entities = level.entities();

    let nearest = entities
        .iter()
        .filter(|view| (view.kind == EntityKind::Gift && !view.frozen) || view.kind.is_pickup())
        .min_by(|a, b| a.position.distance_squared(from).total_cmp(&b.position.distance_squared(from)));
    let frozen_ahead = entities
        .iter()
        .any(|view| view.frozen && view.position.x > from.x && (view.position.y - from.y).abs() < 24.0);

    SessionInput {
        direction: nearest.map_or(Vec2::ZERO, |view| view.position - from),
        shoot: armed && frozen_ahead && frame % 2 == 0,
    }
}

pub fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .event_format(FrameFormatter)
        .finish()
        .with(ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber).context("could not set global default subscriber")?;

    let args = parse_args()?;

    // The demo runner may start any level directly.
    let store = MemoryStore::new();
    store.insert(UNLOCKED_LEVEL_KEY, &args.level.to_string());
    let progress = Progress::load(Box::new(store));

    let mut session = GameSession::new(progress, Box::new(LogSink));
    if let Some(seed) = args.seed {
        session = session.with_seed(seed);
    }
    session.start_level(args.level)?;

    let delta_ms = LOOP_TIME.as_secs_f64() * 1000.0;
    info!(level = args.level, frames = args.frames, delta_ms, "Starting headless run");
    for frame in 0..args.frames {
        formatter::advance_frame();
        let input = autopilot(&mut session, frame);
        session.tick(delta_ms, input)?;

        if session.is_finished() {
            break;
        }
    }

    let (score, lives) = (session.score(), session.lives());
    if let Some(level) = session.level_mut() {
        let census = level.census();
        if level.phase().is_active() {
            warn!(score, ?census, "Frame budget exhausted");
        } else {
            info!(phase = ?level.phase(), score, lives, ?census, "Run finished");
        }
    }
    session.end_level();
    info!(unlocked = session.progress().unlocked(), record = ?session.progress().bonus_record(), "Progress");
    Ok(())
}
