use serde::Serialize;

use crate::actor::{Actor, MoveContext};
use crate::best_score_store::{BestScoreStore, MemoryBestScoreStore};
use crate::config::{ConfigError, LevelTable, SessionConfig};
use crate::maze::MazeGrid;
use crate::pellets::PelletField;
use crate::player::PlayerAgent;
use crate::pursuer::{PursuerAgent, PursuerTuning};
use crate::rng::{RandomSource, Rng};
use crate::types::{
    AiState, Direction, GameOverSummary, PlayerView, Position, PursuerView, RuntimeEvent,
    TickOutcome,
};

mod collision_system;
mod spawn_system;

#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub config: SessionConfig,
    /// Falls back to the built-in ten-level table scaled to the cell size.
    pub levels: Option<LevelTable>,
}

/// Read-only view handed to renderers once per tick.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot<'a> {
    pub tick: u64,
    pub maze: &'a MazeGrid,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub pellets: &'a PelletField,
    pub score: u32,
    pub lives: u32,
    pub level: usize,
    pub best_score: u32,
    pub game_over: bool,
}

pub struct GameSession {
    config: SessionConfig,
    levels: LevelTable,
    tuning: PursuerTuning,
    maze: MazeGrid,
    pellets: PelletField,
    player: PlayerAgent,
    pursuers: Vec<PursuerAgent>,

    rng: Box<dyn RandomSource>,
    store: Box<dyn BestScoreStore>,
    events: Vec<RuntimeEvent>,

    score: u32,
    lives: u32,
    level: usize,
    best_score: u32,
    game_over: bool,
    tick_counter: u64,
    next_pursuer_id: u32,
}

impl GameSession {
    pub fn new(
        maze: MazeGrid,
        options: SessionOptions,
        rng: Box<dyn RandomSource>,
        store: Box<dyn BestScoreStore>,
    ) -> Result<Self, ConfigError> {
        let SessionOptions { config, levels } = options;
        config.validate()?;
        let maze = maze
            .with_cell_size(config.cell_size)
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;
        let levels = levels.unwrap_or_else(|| LevelTable::default_for(config.cell_size));
        levels.validate_for(config.cell_size)?;

        let tuning = PursuerTuning::from_config(&config);
        let pellets = PelletField::new(&maze);
        let player = PlayerAgent::new(&maze, config.player_speed, config.player_tolerance());
        let best_score = store.get_best_score();

        let mut session = Self {
            lives: config.lives,
            config,
            levels,
            tuning,
            maze,
            pellets,
            player,
            pursuers: Vec::new(),
            rng,
            store,
            events: Vec::new(),
            score: 0,
            level: 0,
            best_score,
            game_over: false,
            tick_counter: 0,
            next_pursuer_id: 1,
        };
        session.spawn_missing_pursuers();
        Ok(session)
    }

    /// Seeded session with an in-memory best score.
    pub fn with_seed(
        maze: MazeGrid,
        options: SessionOptions,
        seed: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(
            maze,
            options,
            Box::new(Rng::new(seed)),
            Box::new(MemoryBestScoreStore::default()),
        )
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.game_over {
            return TickOutcome::Halted;
        }
        self.tick_counter += 1;

        let mut ctx = MoveContext {
            maze: &self.maze,
            player_position: self.player.position(),
            rng: self.rng.as_mut(),
        };
        self.player.advance(&mut ctx);
        let player_position = self.player.position();
        self.move_pursuers(player_position);

        self.resolve_pursuer_collisions();
        if self.lives > 0 {
            self.consume_pellet();
            if self.pellets.remaining_count() == 0 {
                self.advance_level();
            }
        }

        if self.lives == 0 {
            return TickOutcome::GameOver(self.finish());
        }
        TickOutcome::Running
    }

    /// Ignored once the session is over.
    pub fn request_direction(&mut self, dir: Direction) {
        if self.game_over {
            return;
        }
        self.player.request_direction(&self.maze, dir);
    }

    pub fn request_direction_str(&mut self, value: &str) -> bool {
        let Some(dir) = Direction::parse(value) else {
            return false;
        };
        self.request_direction(dir);
        true
    }

    /// Starts a new game on the same maze. The best score is kept.
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.config.lives;
        self.level = 0;
        self.game_over = false;
        self.tick_counter = 0;
        self.events.clear();
        self.best_score = self.best_score.max(self.store.get_best_score());

        let initial = self.pursuer_target_count();
        self.pursuers.truncate(initial);
        let speed = self.levels.get(0).pursuer_speed;
        for pursuer in &mut self.pursuers {
            pursuer.set_speed(speed);
        }
        self.spawn_missing_pursuers();
        self.pellets.reset(&self.maze);
        self.reset_agents();
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            tick: self.tick_counter,
            maze: &self.maze,
            player: self.player.view(),
            pursuers: self.pursuers.iter().map(PursuerAgent::view).collect(),
            pellets: &self.pellets,
            score: self.score,
            lives: self.lives,
            level: self.level,
            best_score: self.best_score,
            game_over: self.game_over,
        }
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn maze(&self) -> &MazeGrid {
        &self.maze
    }

    pub fn pellets(&self) -> &PelletField {
        &self.pellets
    }

    pub fn player(&self) -> &PlayerAgent {
        &self.player
    }

    pub fn pursuers(&self) -> &[PursuerAgent] {
        &self.pursuers
    }

    /// Returning pursuers move first, then the rest, all against the same
    /// player position.
    fn move_pursuers(&mut self, player_position: Position) {
        let (returning, others): (Vec<usize>, Vec<usize>) = (0..self.pursuers.len())
            .partition(|idx| self.pursuers[*idx].state() == AiState::Returning);

        let mut ctx = MoveContext {
            maze: &self.maze,
            player_position,
            rng: self.rng.as_mut(),
        };
        for idx in returning.into_iter().chain(others) {
            self.pursuers[idx].advance(&mut ctx);
        }
    }

    fn finish(&mut self) -> GameOverSummary {
        self.game_over = true;
        // The store may already hold a higher value written elsewhere.
        self.store.set_best_score(self.score);
        let stored = self.store.get_best_score();
        let new_best = self.score > self.best_score && self.score >= stored;
        self.best_score = self.best_score.max(stored);
        self.events.push(RuntimeEvent::GameOver {
            score: self.score,
            best_score: self.best_score,
        });
        GameOverSummary {
            score: self.score,
            best_score: self.best_score,
            level: self.level,
            ticks: self.tick_counter,
            new_best,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::actor::Actor;
    use crate::best_score_store::{BestScoreStore, FileBestScoreStore, MemoryBestScoreStore};
    use crate::config::{LevelSettings, LevelTable, SessionConfig};
    use crate::engine::{GameSession, SessionOptions};
    use crate::maze::MazeGrid;
    use crate::motion;
    use crate::rng::{RandomSource, Rng};
    use crate::types::{AiState, Direction, RuntimeEvent, TickOutcome, Vec2};

    fn session_on(layout: &str, config: SessionConfig, levels: Option<LevelTable>) -> GameSession {
        let maze = MazeGrid::parse_text(layout).expect("test maze");
        GameSession::with_seed(maze, SessionOptions { config, levels }, 17).expect("session")
    }

    fn count_events(events: &[RuntimeEvent], pred: impl Fn(&RuntimeEvent) -> bool) -> usize {
        events.iter().filter(|event| pred(event)).count()
    }

    #[test]
    fn classic_session_starts_with_four_pursuers() {
        let session =
            GameSession::with_seed(MazeGrid::classic(), SessionOptions::default(), 1).expect("session");
        assert_eq!(session.lives(), 3);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 0);
        let ids: Vec<u32> = session.pursuers().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let colors: Vec<&str> = session.pursuers().iter().map(|p| p.view().color).collect();
        assert_eq!(colors, vec!["red", "pink", "blue", "orange"]);
        assert!(session
            .pursuers()
            .iter()
            .all(|p| p.state() == AiState::Patrol));
    }

    #[test]
    fn clearing_the_last_pellet_advances_exactly_once() {
        let config = SessionConfig {
            player_speed: 15.0,
            ..SessionConfig::default()
        };
        let mut session = session_on("1111111\n1520041\n1111111", config, None);
        assert_eq!(session.pellets().remaining_count(), 1);

        assert_eq!(session.tick(), TickOutcome::Running);
        let events = session.drain_events();
        assert_eq!(
            count_events(&events, |e| matches!(e, RuntimeEvent::LevelAdvanced { .. })),
            1
        );
        assert!(events.contains(&RuntimeEvent::PelletEaten { x: 2, y: 1 }));
        assert_eq!(session.score(), 10);
        assert_eq!(session.level(), 1);
        assert_eq!(session.pellets().remaining_count(), 1);
        assert_eq!(session.player().position(), session.player().spawn());

        session.tick();
        assert_eq!(session.level(), 2);
        assert_eq!(
            session.drain_events(),
            vec![
                RuntimeEvent::PelletEaten { x: 2, y: 1 },
                RuntimeEvent::LevelAdvanced { level: 2 },
            ]
        );
    }

    #[test]
    fn level_index_is_capped_at_the_last_entry() {
        let config = SessionConfig {
            player_speed: 15.0,
            ..SessionConfig::default()
        };
        let levels = LevelTable::from_levels(vec![LevelSettings {
            max_pursuers: 1,
            pursuer_speed: 1.0,
            vulnerability_duration_ticks: 60,
        }])
        .expect("levels");
        let mut session = session_on("1111111\n1520041\n1111111", config, Some(levels));
        session.tick();
        assert_eq!(session.level(), 0);
        assert!(session
            .drain_events()
            .contains(&RuntimeEvent::LevelAdvanced { level: 0 }));
        assert_eq!(session.pellets().remaining_count(), 1);
    }

    #[test]
    fn later_levels_append_pursuers() {
        let config = SessionConfig {
            player_speed: 15.0,
            ..SessionConfig::default()
        };
        let levels = LevelTable::from_levels(vec![
            LevelSettings {
                max_pursuers: 1,
                pursuer_speed: 1.0,
                vulnerability_duration_ticks: 60,
            },
            LevelSettings {
                max_pursuers: 2,
                pursuer_speed: 2.0,
                vulnerability_duration_ticks: 30,
            },
        ])
        .expect("levels");
        let mut session = session_on("1111111\n1520441\n1111111", config, Some(levels));
        assert_eq!(session.pursuers().len(), 1);
        session.tick();
        assert_eq!(session.level(), 1);
        let ids: Vec<u32> = session.pursuers().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(session.pursuers()[1].spawn_cell(), Vec2::new(5, 1));
        assert!(session
            .pursuers()
            .iter()
            .all(|p| p.position() == session.maze().cell_center(p.spawn_cell())));
    }

    #[test]
    fn lethal_collision_on_last_life_ends_the_game() {
        let config = SessionConfig {
            lives: 1,
            ..SessionConfig::default()
        };
        let mut session = session_on("1111111\n1542221\n1111111", config, None);

        let mut summary = None;
        for _ in 0..20 {
            match session.tick() {
                TickOutcome::Running => {}
                TickOutcome::GameOver(result) => {
                    summary = Some(result);
                    break;
                }
                TickOutcome::Halted => panic!("halted before game over"),
            }
        }
        let summary = summary.expect("game over within 20 ticks");
        assert_eq!(summary.score, 0);
        assert!(!summary.new_best);
        assert_eq!(session.lives(), 0);
        assert!(session.is_game_over());
        assert_eq!(session.player().position(), session.player().spawn());

        let events = session.drain_events();
        assert!(events.contains(&RuntimeEvent::LifeLost {
            pursuer_id: 1,
            lives_left: 0
        }));
        assert!(matches!(events.last(), Some(RuntimeEvent::GameOver { .. })));

        let frozen = serde_json::to_value(session.snapshot()).expect("snapshot");
        let ticks = session.tick_count();
        session.request_direction(Direction::Left);
        assert_eq!(session.tick(), TickOutcome::Halted);
        assert_eq!(session.tick(), TickOutcome::Halted);
        assert_eq!(serde_json::to_value(session.snapshot()).expect("snapshot"), frozen);
        assert_eq!(session.tick_count(), ticks);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn lethal_collision_costs_one_life_and_resets_everyone() {
        let mut session = session_on("1111111\n1542221\n1111111", SessionConfig::default(), None);
        let mut lost = false;
        for _ in 0..20 {
            session.tick();
            if session.lives() == 2 {
                lost = true;
                break;
            }
        }
        assert!(lost);
        assert!(!session.is_game_over());
        assert_eq!(session.player().position(), session.player().spawn());
        assert_eq!(session.player().direction(), Direction::Right);
        for pursuer in session.pursuers() {
            assert_eq!(pursuer.position(), session.maze().cell_center(pursuer.spawn_cell()));
            assert_eq!(pursuer.state(), AiState::Patrol);
        }
    }

    #[test]
    fn eating_a_fleeing_pursuer_scores_once() {
        let mut session = session_on("1111111\n1542221\n1111111", SessionConfig::default(), None);
        session.pursuers[0].make_vulnerable(100);

        let mut eaten_at = None;
        for tick in 0..20 {
            session.tick();
            let events = session.drain_events();
            if events
                .iter()
                .any(|e| matches!(e, RuntimeEvent::PursuerEaten { pursuer_id: 1, points: 200 }))
            {
                eaten_at = Some(tick);
                break;
            }
        }
        assert!(eaten_at.is_some());
        assert_eq!(session.score(), 200);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.pursuers()[0].state(), AiState::Returning);

        session.tick();
        let events = session.drain_events();
        assert_eq!(
            count_events(&events, |e| matches!(e, RuntimeEvent::PursuerEaten { .. })),
            0
        );
        assert_eq!(session.lives(), 3);
    }

    #[test]
    fn power_pellet_makes_pursuers_flee() {
        let mut session = session_on("1111111\n1562241\n1111111", SessionConfig::default(), None);
        let mut powered = false;
        for _ in 0..20 {
            session.tick();
            if session
                .drain_events()
                .contains(&RuntimeEvent::PowerPelletEaten { x: 2, y: 1 })
            {
                powered = true;
                break;
            }
        }
        assert!(powered);
        assert_eq!(session.score(), 50);
        let pursuer = &session.pursuers()[0];
        assert_eq!(pursuer.state(), AiState::Flee);
        assert_eq!(pursuer.vulnerability_timer(), 600);
    }

    #[test]
    fn returning_pursuers_ignore_power_pellets() {
        let mut session = session_on("1111111\n1562241\n1111111", SessionConfig::default(), None);
        let beside_base = session.maze.cell_center(Vec2::new(4, 1));
        let pursuer = &mut session.pursuers[0];
        pursuer.body_mut().position = beside_base;
        pursuer.make_vulnerable(1_000);
        assert!(pursuer.start_returning(&session.maze));
        for _ in 0..7 {
            session.tick();
        }
        assert!(session
            .drain_events()
            .contains(&RuntimeEvent::PowerPelletEaten { x: 2, y: 1 }));
        assert_eq!(session.pursuers()[0].state(), AiState::Returning);
        assert_eq!(session.pursuers()[0].vulnerability_timer(), 0);
    }

    #[test]
    fn new_best_score_is_persisted_at_game_over() {
        let path = std::env::temp_dir().join(format!(
            "maze-chase-session-best-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let config = SessionConfig {
            lives: 1,
            ..SessionConfig::default()
        };
        let maze = MazeGrid::parse_text("1111111\n1542221\n1111111").expect("maze");
        let mut session = GameSession::new(
            maze,
            SessionOptions {
                config,
                levels: None,
            },
            Box::new(Rng::new(3)),
            Box::new(FileBestScoreStore::new(path.clone())),
        )
        .expect("session");
        session.score = 120;

        let outcome = (0..20)
            .map(|_| session.tick())
            .find(|outcome| matches!(outcome, TickOutcome::GameOver(_)));
        let Some(TickOutcome::GameOver(summary)) = outcome else {
            panic!("expected game over");
        };
        assert!(summary.new_best);
        assert_eq!(summary.best_score, 120);
        assert_eq!(FileBestScoreStore::new(path.clone()).get_best_score(), 120);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn best_score_raised_elsewhere_wins_at_game_over() {
        let path = std::env::temp_dir().join(format!(
            "maze-chase-session-raised-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let config = SessionConfig {
            lives: 1,
            ..SessionConfig::default()
        };
        let maze = MazeGrid::parse_text("1111111\n1542221\n1111111").expect("maze");
        let mut session = GameSession::new(
            maze,
            SessionOptions {
                config,
                levels: None,
            },
            Box::new(Rng::new(3)),
            Box::new(FileBestScoreStore::new(path.clone())),
        )
        .expect("session");
        assert_eq!(session.best_score(), 0);

        FileBestScoreStore::new(path.clone()).set_best_score(1_000);
        session.score = 120;
        let summary = (0..20).find_map(|_| match session.tick() {
            TickOutcome::GameOver(summary) => Some(summary),
            _ => None,
        });
        let summary = summary.expect("game over");
        assert!(!summary.new_best);
        assert_eq!(summary.best_score, 1_000);
        assert_eq!(session.best_score(), 1_000);
        assert_eq!(FileBestScoreStore::new(path.clone()).get_best_score(), 1_000);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn lower_score_keeps_stored_best() {
        let config = SessionConfig {
            lives: 1,
            ..SessionConfig::default()
        };
        let maze = MazeGrid::parse_text("1111111\n1542221\n1111111").expect("maze");
        let mut session = GameSession::new(
            maze,
            SessionOptions {
                config,
                levels: None,
            },
            Box::new(Rng::new(3)),
            Box::new(MemoryBestScoreStore::new(500)),
        )
        .expect("session");
        assert_eq!(session.best_score(), 500);
        session.score = 120;
        let summary = (0..20).find_map(|_| match session.tick() {
            TickOutcome::GameOver(summary) => Some(summary),
            _ => None,
        });
        let summary = summary.expect("game over");
        assert!(!summary.new_best);
        assert_eq!(summary.best_score, 500);
        assert_eq!(session.store.get_best_score(), 500);
    }

    #[test]
    fn direction_strings_are_validated() {
        let mut session =
            GameSession::with_seed(MazeGrid::classic(), SessionOptions::default(), 1).expect("session");
        assert!(!session.request_direction_str("north"));
        assert_eq!(session.player().direction(), Direction::Right);
        assert!(session.request_direction_str("left"));
        assert_eq!(session.player().direction(), Direction::Left);
        assert!(session.request_direction_str("up"));
        assert_eq!(session.player().pending_direction(), Some(Direction::Up));
    }

    #[test]
    fn same_seed_and_inputs_replay_identically() {
        let run = |seed: u32| {
            let mut session =
                GameSession::with_seed(MazeGrid::classic(), SessionOptions::default(), seed)
                    .expect("session");
            let mut input = Rng::new(seed ^ 0xdead_beef);
            for tick in 0..1_500 {
                if tick % 20 == 0 {
                    let dir = Direction::ALL[input.pick_index(4)];
                    session.request_direction(dir);
                }
                if session.tick() == TickOutcome::Halted {
                    break;
                }
            }
            serde_json::to_value(session.snapshot()).expect("snapshot")
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn long_run_keeps_every_agent_out_of_walls() {
        let mut session =
            GameSession::with_seed(MazeGrid::classic(), SessionOptions::default(), 5).expect("session");
        let mut input = Rng::new(77);
        for tick in 0..4_000 {
            if tick % 15 == 0 {
                let dir = Direction::ALL[input.pick_index(4)];
                session.request_direction(dir);
            }
            let outcome = session.tick();
            let maze = session.maze();
            assert!(motion::is_clear(maze, session.player().body()));
            for pursuer in session.pursuers() {
                assert!(motion::is_clear(maze, pursuer.body()));
            }
            if outcome != TickOutcome::Running {
                session.reset();
            }
        }
    }

    #[test]
    fn reset_starts_a_fresh_game() {
        let config = SessionConfig {
            lives: 1,
            ..SessionConfig::default()
        };
        let mut session = session_on("1111111\n1542221\n1111111", config, None);
        while session.tick() == TickOutcome::Running {}
        assert!(session.is_game_over());

        session.reset();
        assert!(!session.is_game_over());
        assert_eq!(session.lives(), 1);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 0);
        assert_eq!(session.tick_count(), 0);
        assert_eq!(session.pellets().remaining_count(), 3);
        assert_eq!(session.tick(), TickOutcome::Running);
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let session =
            GameSession::with_seed(MazeGrid::classic(), SessionOptions::default(), 1).expect("session");
        let value = serde_json::to_value(session.snapshot()).expect("snapshot");
        assert_eq!(value["bestScore"], 0);
        assert_eq!(value["gameOver"], false);
        assert_eq!(value["lives"], 3);
        assert_eq!(value["pursuers"][0]["vulnerabilityTimer"], 0);
        assert_eq!(value["pursuers"][0]["state"], "patrol");
        assert_eq!(value["player"]["direction"], "right");
        assert!(value["pellets"]["powerPellets"].is_array());
    }
}
