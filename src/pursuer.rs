//! Pursuer AI: a four-state machine layered over the shared motion rules.
//!
//! Headings are only re-decided near a cell center. Between decisions the
//! pursuer keeps sliding along its current direction.

use crate::actor::{Actor, MoveContext};
use crate::config::SessionConfig;
use crate::constants::pursuer_color;
use crate::maze::MazeGrid;
use crate::motion::{self, Body};
use crate::pathfinding::find_path;
use crate::rng::RandomSource;
use crate::types::{AiState, Direction, Position, PursuerView, Vec2};

/// Behaviour knobs shared by every pursuer of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct PursuerTuning {
    pub chase_radius: f32,
    pub collision_radius: f32,
    pub tolerance: f32,
    pub stuck_threshold: u32,
    pub patrol_redecide_ticks: u32,
    pub path_search_budget: usize,
}

impl PursuerTuning {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            chase_radius: config.chase_radius(),
            collision_radius: config.collision_radius(),
            tolerance: config.pursuer_tolerance(),
            stuck_threshold: config.stuck_threshold,
            patrol_redecide_ticks: config.patrol_redecide_ticks,
            path_search_budget: config.path_search_budget,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PursuerAgent {
    id: u32,
    color: &'static str,
    body: Body,
    spawn_cell: Vec2,
    spawn: Position,
    home: Vec2,
    state: AiState,
    vulnerability_timer: u32,
    stuck_counter: u32,
    patrol_ticks: u32,
    tuning: PursuerTuning,
}

impl PursuerAgent {
    pub fn new(
        id: u32,
        index: usize,
        maze: &MazeGrid,
        spawn_cell: Vec2,
        speed: f32,
        tuning: PursuerTuning,
    ) -> Self {
        let spawn = maze.cell_center(spawn_cell);
        Self {
            id,
            color: pursuer_color(index),
            body: Body::new(
                spawn,
                Direction::Right,
                speed,
                maze.cell_size() / 2.0,
                tuning.tolerance,
            ),
            spawn_cell,
            spawn,
            home: maze.nearest_base(spawn),
            state: AiState::Patrol,
            vulnerability_timer: 0,
            stuck_counter: 0,
            patrol_ticks: 0,
            tuning,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.body.direction
    }

    pub fn vulnerability_timer(&self) -> u32 {
        self.vulnerability_timer
    }

    pub fn spawn_cell(&self) -> Vec2 {
        self.spawn_cell
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.body.speed = speed;
    }

    pub fn is_vulnerable(&self) -> bool {
        self.state == AiState::Flee
    }

    pub fn collides_with(&self, player: Position) -> bool {
        self.body.position.distance(player) < self.tuning.collision_radius
    }

    /// Power pellet reaction. Returning pursuers are unaffected and a pursuer
    /// already fleeing only has its timer refreshed.
    pub fn make_vulnerable(&mut self, duration_ticks: u32) {
        match self.state {
            AiState::Patrol | AiState::Chase => {
                self.state = AiState::Flee;
                self.vulnerability_timer = duration_ticks;
            }
            AiState::Flee => self.vulnerability_timer = duration_ticks,
            AiState::Returning => {}
        }
    }

    /// Eaten while fleeing: head for the nearest base cell.
    pub fn start_returning(&mut self, maze: &MazeGrid) -> bool {
        if self.state != AiState::Flee {
            return false;
        }
        self.state = AiState::Returning;
        self.vulnerability_timer = 0;
        self.stuck_counter = 0;
        self.home = maze.nearest_base(self.body.position);
        true
    }

    pub fn view(&self) -> PursuerView {
        PursuerView {
            id: self.id,
            color: self.color,
            position: self.body.position,
            direction: self.body.direction,
            state: self.state,
            vulnerability_timer: self.vulnerability_timer,
        }
    }

    #[cfg(test)]
    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Chase has no exit back to Patrol: it lasts until a power pellet or a
    /// position reset, even after the player leaves the chase radius.
    fn update_state(&mut self, player: Position) {
        match self.state {
            AiState::Flee => {
                self.vulnerability_timer = self.vulnerability_timer.saturating_sub(1);
                if self.vulnerability_timer == 0 {
                    self.state = AiState::Patrol;
                    self.patrol_ticks = 0;
                }
            }
            AiState::Patrol => {
                if self.body.position.distance(player) <= self.tuning.chase_radius {
                    self.state = AiState::Chase;
                    self.stuck_counter = 0;
                }
            }
            AiState::Chase | AiState::Returning => {}
        }
    }

    fn decide(&mut self, ctx: &mut MoveContext<'_>) {
        let maze = ctx.maze;
        if self.state == AiState::Patrol {
            self.patrol_ticks += 1;
        }
        if !motion::is_near_intersection(maze, &self.body) {
            return;
        }

        match self.state {
            AiState::Patrol => {
                let blocked = !motion::can_move(maze, &self.body, self.body.direction);
                if blocked || self.patrol_ticks >= self.tuning.patrol_redecide_ticks {
                    motion::align_to_grid(maze, &mut self.body);
                    self.turn_randomly(maze, ctx.rng);
                    self.patrol_ticks = 0;
                }
            }
            AiState::Chase => {
                let target = maze.cell_at(ctx.player_position);
                self.follow_path_to(maze, target, ctx.rng);
            }
            AiState::Returning => {
                let cell = motion::cell_of(maze, &self.body);
                if cell == self.home {
                    motion::align_to_grid(maze, &mut self.body);
                    self.state = AiState::Patrol;
                    self.vulnerability_timer = 0;
                    self.patrol_ticks = 0;
                    self.turn_randomly(maze, ctx.rng);
                    return;
                }
                self.follow_path_to(maze, self.home, ctx.rng);
            }
            AiState::Flee => {
                motion::align_to_grid(maze, &mut self.body);
                self.flee_from(maze, ctx.player_position, ctx.rng);
            }
        }
    }

    fn follow_path_to(&mut self, maze: &MazeGrid, target: Vec2, rng: &mut dyn RandomSource) {
        motion::align_to_grid(maze, &mut self.body);
        let start = motion::cell_of(maze, &self.body);
        let path = find_path(maze, start, target, self.tuning.path_search_budget);
        let Some(first) = path.first().copied() else {
            self.turn_randomly(maze, rng);
            return;
        };

        if motion::can_move(maze, &self.body, first) {
            self.body.direction = first;
            self.stuck_counter = 0;
            return;
        }
        self.stuck_counter += 1;
        if self.stuck_counter > self.tuning.stuck_threshold {
            self.turn_randomly(maze, rng);
            self.stuck_counter = 0;
        }
    }

    fn flee_from(&mut self, maze: &MazeGrid, player: Position, rng: &mut dyn RandomSource) {
        let options = self.forward_options(maze);
        if options.is_empty() {
            return;
        }
        let here = motion::cell_of(maze, &self.body);
        let scored: Vec<(Direction, f32)> = options
            .iter()
            .map(|dir| (*dir, maze.cell_center(here.offset(*dir)).distance(player)))
            .collect();
        let best = scored
            .iter()
            .map(|(_, distance)| *distance)
            .fold(f32::MIN, f32::max);
        let tied: Vec<Direction> = scored
            .iter()
            .filter(|(_, distance)| (best - distance).abs() < 1e-3)
            .map(|(dir, _)| *dir)
            .collect();
        self.body.direction = tied[rng.pick_index(tied.len())];
    }

    fn turn_randomly(&mut self, maze: &MazeGrid, rng: &mut dyn RandomSource) {
        let options = self.forward_options(maze);
        if !options.is_empty() {
            self.body.direction = options[rng.pick_index(options.len())];
        }
    }

    /// Unblocked directions without the reversal, unless reversing is the
    /// only way out.
    fn forward_options(&self, maze: &MazeGrid) -> Vec<Direction> {
        let valid = motion::valid_directions(maze, &self.body);
        let reverse = self.body.direction.opposite();
        let forward: Vec<Direction> = valid.iter().copied().filter(|dir| *dir != reverse).collect();
        if forward.is_empty() {
            valid
        } else {
            forward
        }
    }
}

impl Actor for PursuerAgent {
    fn body(&self) -> &Body {
        &self.body
    }

    fn advance(&mut self, ctx: &mut MoveContext<'_>) -> f32 {
        self.update_state(ctx.player_position);
        self.decide(ctx);
        motion::step(ctx.maze, &mut self.body)
    }

    fn reset_position(&mut self) {
        self.body.position = self.spawn;
        self.body.direction = Direction::Right;
        self.body.pending_direction = None;
        self.state = AiState::Patrol;
        self.vulnerability_timer = 0;
        self.stuck_counter = 0;
        self.patrol_ticks = 0;
    }
}
