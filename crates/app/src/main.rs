use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rhythm_duck_core::{
    AudioCue, Command, CueDispatcher, EngineConfig, FileScoreStore, FrameFlow, FrameSnapshot,
    Game, GameState, InputFrame, LevelTable, Renderer, ScheduleBuilder, Settings,
};
use tracing_subscriber::EnvFilter;

fn main() -> rhythm_duck_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Levels => run_levels(&cli.common),
        Commands::Schedule { level } => run_schedule(&cli.common, level),
        Commands::Simulate {
            level,
            hold_lane,
            fps,
            max_seconds,
        } => run_simulate(&cli.common, level, hold_lane, fps, max_seconds),
    }
}

fn load_levels(common: &CommonArgs) -> rhythm_duck_core::Result<LevelTable> {
    match &common.levels {
        Some(path) => LevelTable::load(path),
        None => Ok(LevelTable::builtin()),
    }
}

fn load_config(common: &CommonArgs) -> rhythm_duck_core::Result<EngineConfig> {
    match &common.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn run_levels(common: &CommonArgs) -> rhythm_duck_core::Result<()> {
    let levels = load_levels(common)?;
    for (index, level) in levels.iter().enumerate() {
        println!(
            "{index}: {} bpm={} lanes={} notes={}",
            level.name,
            level.pattern.tempo_bpm,
            level.pattern.lane_count,
            level.pattern.events.len()
        );
    }
    Ok(())
}

fn run_schedule(common: &CommonArgs, level: usize) -> rhythm_duck_core::Result<()> {
    let levels = load_levels(common)?;
    let config = load_config(common)?;
    let level = levels.get(level)?;

    let builder = ScheduleBuilder::new(config.schedule.clone(), &config.playfield);
    let schedule = builder.build(&level.pattern);
    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}

/// Plays every level from the first up to `last_level`, advancing after each
/// pass. Later levels unlock only by clearing earlier ones.
fn run_simulate(
    common: &CommonArgs,
    last_level: usize,
    hold_lane: usize,
    fps: u32,
    max_seconds: f32,
) -> rhythm_duck_core::Result<()> {
    let levels = load_levels(common)?;
    levels.get(last_level)?;
    let config = load_config(common)?;
    tracing::info!(last_level, hold_lane, fps, "starting headless run");

    let store = FileScoreStore::new(&common.best_score);
    let mut game = Game::new(config, levels, Box::new(store))?;
    let mut audio = TraceCues;
    let mut renderer = TraceRenderer::default();

    let fps = fps.max(1);
    let dt = 1.0 / fps as f32;
    let max_frames = (max_seconds.max(0.0) * fps as f32).ceil() as u64;
    let mut previous_state = game.state();

    for frame in 0..max_frames {
        let input = scripted_input(&game, last_level, hold_lane);
        if game.frame(&input, dt) == FrameFlow::Quit {
            break;
        }
        game.cues().dispatch_to(&mut audio, game.settings());
        renderer.render(&game.snapshot())?;

        let state = game.state();
        if state != previous_state && matches!(state, GameState::Pass | GameState::Fail) {
            print_result(&game.snapshot());
        }
        previous_state = state;

        if frame + 1 == max_frames {
            tracing::warn!(frames = max_frames, "frame limit reached before the run finished");
        }
    }
    Ok(())
}

/// Stands in for a player: confirms through the menus and parks the duck.
fn scripted_input(game: &Game, last_level: usize, hold_lane: usize) -> InputFrame {
    let mut input = InputFrame::new();
    match game.state() {
        GameState::Menu | GameState::Select => input.push(Command::Confirm),
        GameState::Playing => {
            if let Some(session) = game.session() {
                let duck = session.duck();
                let target = hold_lane.min(duck.lane_count() - 1);
                if duck.lane() > target {
                    input.push(Command::MoveUp);
                } else if duck.lane() < target {
                    input.push(Command::MoveDown);
                }
            }
        }
        GameState::Pass if game.level_index() < last_level => input.push(Command::NextLevel),
        GameState::Pass | GameState::Fail => input.push(Command::Quit),
    }
    input
}

fn print_result(snapshot: &FrameSnapshot<'_>) {
    let session = snapshot.session;
    let stars = match snapshot.state {
        GameState::Pass => snapshot.last_stars.map(|stars| stars.stars()),
        _ => None,
    };
    println!(
        "level={} state={:?} score={} misses={} stars={} best={}",
        snapshot.level_name,
        snapshot.state,
        session.map(|view| view.score).unwrap_or_default(),
        session.map(|view| view.miss_count).unwrap_or_default(),
        stars.unwrap_or_default(),
        snapshot.best_score,
    );
}

/// Logs audio cues instead of playing them.
struct TraceCues;

impl CueDispatcher for TraceCues {
    fn dispatch(&mut self, cue: &AudioCue, settings: &Settings) {
        if settings.muted {
            return;
        }
        match cue {
            AudioCue::Hit { lane } => tracing::debug!(lane, "cue: hit"),
            AudioCue::Miss => tracing::debug!("cue: miss"),
            AudioCue::LevelStart { bpm } => tracing::debug!(bpm, "cue: level start"),
            AudioCue::LevelEnd => tracing::debug!("cue: level end"),
        }
    }
}

/// Emits a trace line whenever the visible state changes.
#[derive(Default)]
struct TraceRenderer {
    last_state: Option<GameState>,
    last_misses: u32,
}

impl Renderer for TraceRenderer {
    fn render(&mut self, frame: &FrameSnapshot<'_>) -> rhythm_duck_core::Result<()> {
        if self.last_state != Some(frame.state) {
            tracing::debug!(state = ?frame.state, level = frame.level_name, "screen");
            self.last_state = Some(frame.state);
        }
        if let Some(view) = frame.session {
            if view.miss_count != self.last_misses {
                tracing::trace!(
                    misses = view.miss_count,
                    health = view.health_remaining,
                    band = ?view.health_band,
                    "health changed"
                );
                self.last_misses = view.miss_count;
            }
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless host for the Rhythm Duck engine", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON level table to use instead of the built-in levels.
    #[arg(long, global = true)]
    levels: Option<PathBuf>,
    /// JSON engine configuration overriding the defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Where the best score is kept.
    #[arg(long, global = true, default_value = "best_score.json")]
    best_score: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available levels.
    Levels,
    /// Print the resolved spawn schedule of a level as JSON.
    Schedule {
        #[arg(short, long, default_value_t = 0)]
        level: usize,
    },
    /// Play levels headlessly, from the first up to `--level`, with the duck
    /// parked on one lane.
    Simulate {
        #[arg(short, long, default_value_t = 0)]
        level: usize,
        /// Lane to hold, clamped to the level's lane count.
        #[arg(long, default_value_t = 0)]
        hold_lane: usize,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Give up after this much simulated time.
        #[arg(long, default_value_t = 120.0)]
        max_seconds: f32,
    },
}
