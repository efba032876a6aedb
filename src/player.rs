use crate::actor::{Actor, MoveContext};
use crate::constants::{MOUTH_MAX, MOUTH_MIN, MOUTH_START, MOUTH_STEP};
use crate::maze::MazeGrid;
use crate::motion::{self, Body};
use crate::types::{Direction, PlayerView, Position};

#[derive(Clone, Debug)]
pub struct PlayerAgent {
    body: Body,
    spawn: Position,
    mouth_phase: f32,
    mouth_opening: bool,
}

impl PlayerAgent {
    pub fn new(maze: &MazeGrid, speed: f32, tolerance: f32) -> Self {
        let spawn = maze.cell_center(maze.player_spawn());
        Self {
            body: Body::new(
                spawn,
                Direction::Right,
                speed,
                maze.cell_size() / 2.0,
                tolerance,
            ),
            spawn,
            mouth_phase: MOUTH_START,
            mouth_opening: true,
        }
    }

    fn move_tick(&mut self, maze: &MazeGrid) -> f32 {
        let moved = motion::attempt_move(maze, &mut self.body);
        self.update_mouth();
        moved
    }

    /// Turns now if the way is open, otherwise queues the turn for the next
    /// tick that allows it. Asking for the current heading drops the queue.
    pub fn request_direction(&mut self, maze: &MazeGrid, dir: Direction) {
        if dir == self.body.direction {
            self.body.pending_direction = None;
            return;
        }
        if motion::try_turn(maze, &mut self.body, dir) {
            self.body.pending_direction = None;
        } else {
            self.body.pending_direction = Some(dir);
        }
    }

    pub fn direction(&self) -> Direction {
        self.body.direction
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.body.pending_direction
    }

    pub fn animation_phase(&self) -> f32 {
        self.mouth_phase
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            position: self.body.position,
            direction: self.body.direction,
            animation_phase: self.mouth_phase,
        }
    }

    fn update_mouth(&mut self) {
        if self.mouth_opening {
            self.mouth_phase += MOUTH_STEP;
            if self.mouth_phase >= MOUTH_MAX {
                self.mouth_phase = MOUTH_MAX;
                self.mouth_opening = false;
            }
        } else {
            self.mouth_phase -= MOUTH_STEP;
            if self.mouth_phase <= MOUTH_MIN {
                self.mouth_phase = MOUTH_MIN;
                self.mouth_opening = true;
            }
        }
    }
}

impl Actor for PlayerAgent {
    fn body(&self) -> &Body {
        &self.body
    }

    fn advance(&mut self, ctx: &mut MoveContext<'_>) -> f32 {
        self.move_tick(ctx.maze)
    }

    fn reset_position(&mut self) {
        self.body.position = self.spawn;
        self.body.direction = Direction::Right;
        self.body.pending_direction = None;
    }
}
