//! Terminal runner (default binary).
//!
//! Reads keys with crossterm, drives the fixed-timestep game loop and draws
//! through the framebuffer renderer. Logs go to `--log-file` when given;
//! otherwise only warnings are emitted, since stderr shares the screen.

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyEventKind};
use log::{info, warn};

use turtle_tetris::core::{GameLoop, GameState, HighScores, ProgressionConfig, SpawnMode};
use turtle_tetris::input::{handle_key_event, should_quit, InputHandler};
use turtle_tetris::term::{FrameBuffer, GameView, TerminalRenderer, Viewport};
use turtle_tetris::types::{GameAction, GameMode, HazardVariant, SoundCue, TICK_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Hazard variants follow the configured order as stomps accumulate.
    Progressive,
    Green,
    Red,
    Spiny,
    Buzzy,
    Golden,
}

impl ModeArg {
    fn spawn_mode(self) -> SpawnMode {
        match self {
            ModeArg::Progressive => SpawnMode::Progressive,
            ModeArg::Green => SpawnMode::Fixed(HazardVariant::Green),
            ModeArg::Red => SpawnMode::Fixed(HazardVariant::Red),
            ModeArg::Spiny => SpawnMode::Fixed(HazardVariant::Spiny),
            ModeArg::Buzzy => SpawnMode::Fixed(HazardVariant::Buzzy),
            ModeArg::Golden => SpawnMode::Fixed(HazardVariant::Golden),
        }
    }
}

/// Falling blocks with turtles wandering over the stack.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Seed for pieces and hazards (default: derived from the clock).
    #[arg(long)]
    seed: Option<u32>,

    /// Which hazards spawn.
    #[arg(long, value_enum, default_value_t = ModeArg::Progressive)]
    mode: ModeArg,

    /// Progression config (JSON).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// High-score table (JSON), created on first save.
    #[arg(long, value_name = "PATH", default_value = "turtle-tetris-scores.json")]
    scores: PathBuf,

    /// Name recorded with a high score (3 letters).
    #[arg(long, default_value = "YOU")]
    name: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let mut builder = match log_file {
        Some(_) => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")),
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
    };
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn default_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = match &cli.config {
        Some(path) => ProgressionConfig::load_or_default(path),
        None => ProgressionConfig::default(),
    };
    let seed = cli.seed.unwrap_or_else(default_seed);
    info!("starting: seed {seed}, mode {:?}", cli.mode);

    let mut term = TerminalRenderer::new();
    term.enter()?;
    let result = run(&mut term, &cli, seed, config);
    // Restore the terminal even when the loop failed.
    let _ = term.exit();
    result
}

fn run(term: &mut TerminalRenderer, cli: &Cli, seed: u32, config: ProgressionConfig) -> Result<()> {
    let offsets = config.alignment_offsets;
    let view = GameView::default().with_offset(offsets.x, offsets.y);
    let mut game = GameLoop::new(GameState::with_config(seed, cli.mode.spawn_mode(), config));
    let mut input = InputHandler::new();
    let mut scores = HighScores::load_or_default(&cli.scores);
    let mut recorded_episode = None;

    let mut fb = FrameBuffer::new(0, 0);
    let tick = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    loop {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        view.render_into(&game.state().snapshot(), Viewport::new(w, h), &mut fb);
        term.present(&mut fb)?;

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if should_quit(key) {
                            return Ok(());
                        }
                        if game.state().mode() == GameMode::Ready {
                            game.state_mut().start();
                            continue;
                        }
                        if let Some(action) = input.handle_key_press(key.code) {
                            game.push(action);
                        } else if let Some(action) = handle_key_event(key) {
                            match action {
                                // Owned by the input handler; a repeat press lands here.
                                GameAction::MoveLeft
                                | GameAction::MoveRight
                                | GameAction::SoftDropHold(_) => {}
                                GameAction::Restart | GameAction::Pause => {
                                    input.reset();
                                    game.push(action);
                                }
                                _ => {
                                    game.push(action);
                                }
                            }
                        }
                    }
                    KeyEventKind::Release => {
                        if let Some(action) = input.handle_key_release(key.code) {
                            game.push(action);
                        }
                    }
                },
                Event::Resize(..) => term.invalidate(),
                _ => {}
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed < tick {
            continue;
        }
        last_tick = Instant::now();
        let elapsed_ms = elapsed.as_millis().min(u32::MAX as u128) as u32;

        for action in input.update(elapsed_ms) {
            game.push(action);
        }
        game.update(elapsed_ms);

        let cues = game.take_cues();
        if cues
            .iter()
            .any(|c| matches!(c, SoundCue::Stomp | SoundCue::LifeLoss | SoundCue::GameOver))
        {
            term.bell()?;
        }

        let state = game.state();
        if state.is_game_over() && recorded_episode != Some(state.episode_id()) {
            recorded_episode = Some(state.episode_id());
            if let Some(rank) = scores.insert(&cli.name, state.score()) {
                info!("new high score #{}: {}", rank + 1, state.score());
                if let Err(err) = scores.save(&cli.scores) {
                    warn!("could not save high scores: {err}");
                }
            }
        }
    }
}
