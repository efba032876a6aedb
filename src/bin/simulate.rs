use clap::Parser;
use maze_chase::best_score_store::{BestScoreStore, FileBestScoreStore, MemoryBestScoreStore};
use maze_chase::config::{ConfigError, LevelTable, SessionConfig};
use maze_chase::engine::{GameSession, SessionOptions};
use maze_chase::game_loop::{FixedStepLoop, FrameOutcome};
use maze_chase::logging::{emit_log, now_ms, LogContext};
use maze_chase::maze::{MazeError, MazeGrid};
use maze_chase::rng::{RandomSource, Rng};
use maze_chase::types::{Direction, RuntimeEvent, TickOutcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Display refresh of the simulated host; ticks are paced independently.
const FRAME_MS: f64 = 1000.0 / 120.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3_600)]
    ticks: u64,
    #[arg(long)]
    maze: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    levels: Option<PathBuf>,
    #[arg(long)]
    best_score_path: Option<PathBuf>,
    #[arg(long)]
    fast: bool,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to load maze: {0}")]
    Maze(#[from] MazeError),
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventTally {
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    #[serde(rename = "pursuersEaten")]
    pursuers_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
}

impl EventTally {
    fn record(&mut self, event: &RuntimeEvent) {
        match event {
            RuntimeEvent::PelletEaten { .. } => self.pellets_eaten += 1,
            RuntimeEvent::PowerPelletEaten { .. } => self.power_pellets_eaten += 1,
            RuntimeEvent::PursuerEaten { .. } => self.pursuers_eaten += 1,
            RuntimeEvent::LifeLost { .. } => self.lives_lost += 1,
            RuntimeEvent::LevelAdvanced { .. } => self.levels_cleared += 1,
            RuntimeEvent::GameOver { .. } => {}
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    seed: u32,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    ticks: u64,
    score: u32,
    lives: u32,
    level: usize,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "gameOver")]
    game_over: bool,
    #[serde(rename = "newBest")]
    new_best: bool,
    events: EventTally,
}

/// Random steering standing in for a keyboard.
struct Autopilot {
    rng: StdRng,
    next_turn_tick: u64,
}

impl Autopilot {
    fn new(seed: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(u64::from(seed) ^ 0x5eed_cafe),
            next_turn_tick: 0,
        }
    }

    fn steer(&mut self, session: &mut GameSession) {
        if session.tick_count() < self.next_turn_tick {
            return;
        }
        let dir = Direction::ALL[self.rng.pick_index(Direction::ALL.len())];
        session.request_direction(dir);
        self.next_turn_tick = session.tick_count() + self.rng.int(8, 40) as u64;
    }
}

enum FrameClock {
    Synthetic { now_ms: f64 },
    Paced { interval: tokio::time::Interval, started: Instant },
}

impl FrameClock {
    fn new(fast: bool) -> Self {
        if fast {
            return Self::Synthetic { now_ms: 0.0 };
        }
        Self::Paced {
            interval: tokio::time::interval(Duration::from_secs_f64(FRAME_MS / 1000.0)),
            started: Instant::now(),
        }
    }

    async fn next_frame(&mut self) -> f64 {
        match self {
            Self::Synthetic { now_ms } => {
                let current = *now_ms;
                *now_ms += FRAME_MS;
                current
            }
            Self::Paced { interval, started } => {
                interval.tick().await;
                started.elapsed().as_secs_f64() * 1000.0
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let run_started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, run_started_at_ms));
    let log = LogContext::new(run_id.clone(), Some(seed));

    let best_score_path = cli.best_score_path.clone().or_else(|| {
        std::env::var("BEST_SCORE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    });

    let mut session = match build_session(&cli, seed, best_score_path.as_deref()) {
        Ok(session) => session,
        Err(error) => {
            emit_log(
                &log,
                "error",
                "setup_failed",
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    emit_log(
        &log,
        "info",
        "run_started",
        None,
        json!({
            "ticks": cli.ticks,
            "fast": cli.fast,
            "mazeWidth": session.maze().width(),
            "mazeHeight": session.maze().height(),
            "pursuers": session.pursuers().len(),
            "bestScore": session.best_score(),
            "bestScorePath": best_score_path.as_ref().map(|path| path.to_string_lossy().to_string()),
        }),
    );

    let mut game_loop = FixedStepLoop::from_config(session.config());
    let mut autopilot = Autopilot::new(seed);
    let mut clock = FrameClock::new(cli.fast);
    let mut tally = EventTally::default();
    let mut new_best = false;

    game_loop.start();
    while session.tick_count() < cli.ticks {
        let now = clock.next_frame().await;
        autopilot.steer(&mut session);
        let outcome = game_loop.on_frame(now, &mut session);

        for event in session.drain_events() {
            tally.record(&event);
            log_event(&log, session.tick_count(), &event);
        }
        if let FrameOutcome::Ticked(TickOutcome::GameOver(summary)) = &outcome {
            new_best = summary.new_best;
        }
        if !outcome.should_reschedule() {
            break;
        }
    }
    game_loop.stop();

    let summary = RunSummary {
        run_id,
        seed,
        started_at_ms: run_started_at_ms,
        finished_at_ms: now_ms(),
        ticks: session.tick_count(),
        score: session.score(),
        lives: session.lives(),
        level: session.level(),
        best_score: session.best_score(),
        game_over: session.is_game_over(),
        new_best,
        events: tally,
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                &log,
                "error",
                "summary_write_failed",
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        &log,
        "info",
        "run_finished",
        Some(summary.ticks),
        json!({
            "score": summary.score,
            "lives": summary.lives,
            "level": summary.level,
            "gameOver": summary.game_over,
            "summaryOut": summary_out_written,
        }),
    );

    match serde_json::to_string(&summary) {
        Ok(text) => println!("{text}"),
        Err(error) => eprintln!("[simulate] failed to serialize summary: {error}"),
    }
}

fn build_session(
    cli: &Cli,
    seed: u32,
    best_score_path: Option<&Path>,
) -> Result<GameSession, SetupError> {
    let config = match cli.config.as_deref() {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let levels = cli.levels.as_deref().map(LevelTable::load).transpose()?;
    let maze = match cli.maze.as_deref() {
        Some(path) => MazeGrid::load(path)?,
        None => MazeGrid::classic(),
    };
    let store: Box<dyn BestScoreStore> = match best_score_path {
        Some(path) => Box::new(FileBestScoreStore::new(path.to_path_buf())),
        None => Box::new(MemoryBestScoreStore::default()),
    };
    let session = GameSession::new(
        maze,
        SessionOptions { config, levels },
        Box::new(Rng::new(seed)),
        store,
    )?;
    Ok(session)
}

fn log_event(log: &LogContext, tick: u64, event: &RuntimeEvent) {
    // Pellets are only counted; logging each one drowns the rest.
    if matches!(
        event,
        RuntimeEvent::PelletEaten { .. } | RuntimeEvent::PowerPelletEaten { .. }
    ) {
        return;
    }
    let (level, name) = match event {
        RuntimeEvent::LifeLost { .. } => ("warn", "life_lost"),
        RuntimeEvent::GameOver { .. } => ("info", "game_over"),
        RuntimeEvent::LevelAdvanced { .. } => ("info", "level_advanced"),
        _ => ("info", "pursuer_eaten"),
    };
    let details = serde_json::to_value(event).unwrap_or(Value::Null);
    emit_log(log, level, name, Some(tick), details);
}

fn default_run_id(seed: u32, started_at_ms: u64) -> String {
    format!("sim-{seed}-{started_at_ms}")
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
