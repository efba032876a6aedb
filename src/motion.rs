//! Continuous movement against the discrete wall grid.
//!
//! Positions are agent centers. The leading edge of the bounding box sits
//! flush with the box while the lateral probe points are pulled inward by the
//! agent's tolerance, so an agent travelling along a corridor never reports a
//! hit on the lane beside it.

use crate::constants::EDGE_EPSILON;
use crate::maze::MazeGrid;
use crate::types::{Direction, Position, Vec2};

/// Shared physical state of every agent.
#[derive(Clone, Debug)]
pub struct Body {
    pub position: Position,
    pub direction: Direction,
    pub pending_direction: Option<Direction>,
    pub speed: f32,
    pub half_size: f32,
    pub tolerance: f32,
}

impl Body {
    pub fn new(
        position: Position,
        direction: Direction,
        speed: f32,
        half_size: f32,
        tolerance: f32,
    ) -> Self {
        Self {
            position,
            direction,
            pending_direction: None,
            speed,
            half_size,
            tolerance,
        }
    }

    /// Bounding-box corners pulled inward by the tolerance.
    pub fn probe_corners(&self) -> [Position; 4] {
        let inset = self.half_size - self.tolerance;
        let Position { x, y } = self.position;
        [
            Position::new(x - inset, y - inset),
            Position::new(x + inset, y - inset),
            Position::new(x - inset, y + inset),
            Position::new(x + inset, y + inset),
        ]
    }

    /// Half-open window around a cell center in which a turn may be taken.
    /// Exactly one position per pass through a cell falls inside it.
    pub fn turn_window(&self) -> f32 {
        (self.speed * 0.5).max(self.tolerance)
    }
}

/// Moves `body` one tick, honoring a queued direction first. Returns the
/// distance actually travelled.
pub fn attempt_move(maze: &MazeGrid, body: &mut Body) -> f32 {
    if let Some(pending) = body.pending_direction {
        if try_turn(maze, body, pending) {
            body.pending_direction = None;
        }
    }
    step(maze, body)
}

/// Moves along the current direction without looking at the pending slot.
pub fn step(maze: &MazeGrid, body: &mut Body) -> f32 {
    let distance = free_distance(maze, body, body.position, body.direction, body.speed);
    if distance > 0.0 {
        body.position = body.position.stepped(body.direction, distance);
        wrap(maze, body);
    }
    distance
}

/// Switches to `dir` if the agent can move that way from here, snapping the
/// orthogonal coordinate to the cell center on a perpendicular turn.
pub fn try_turn(maze: &MazeGrid, body: &mut Body, dir: Direction) -> bool {
    if dir == body.direction {
        return true;
    }
    let probe_limit = maze.cell_size();
    if !dir.is_perpendicular_to(body.direction) {
        if free_distance(maze, body, body.position, dir, probe_limit) > EDGE_EPSILON {
            body.direction = dir;
            return true;
        }
        return false;
    }

    let Some(snapped) = snapped_for_turn(maze, body, dir) else {
        return false;
    };
    if free_distance(maze, body, snapped, dir, probe_limit) <= EDGE_EPSILON {
        return false;
    }
    body.position = snapped;
    body.direction = dir;
    true
}

/// Whether a turn to `dir` would be accepted right now, without committing it.
pub fn can_turn(maze: &MazeGrid, body: &Body, dir: Direction) -> bool {
    let mut probe = body.clone();
    try_turn(maze, &mut probe, dir)
}

fn snapped_for_turn(maze: &MazeGrid, body: &Body, dir: Direction) -> Option<Position> {
    let cs = maze.cell_size();
    let window = body.turn_window();
    let mut snapped = body.position;
    if dir.is_horizontal() {
        let offset = center_offset(body.position.y, cs);
        if !(offset > -window && offset <= window) {
            return None;
        }
        snapped.y = snap(body.position.y, cs);
    } else {
        let offset = center_offset(body.position.x, cs);
        if !(offset > -window && offset <= window) {
            return None;
        }
        snapped.x = snap(body.position.x, cs);
    }
    Some(snapped)
}

/// Distance the box starting at `from` can travel along `dir` before its
/// leading edge touches a blocking cell, capped at `limit`.
pub fn free_distance(
    maze: &MazeGrid,
    body: &Body,
    from: Position,
    dir: Direction,
    limit: f32,
) -> f32 {
    let cs = maze.cell_size();
    let inset = body.half_size - body.tolerance;
    let forward = matches!(dir, Direction::Right | Direction::Down);
    let sign = if forward { 1.0 } else { -1.0 };

    let (lead, lateral) = if dir.is_horizontal() {
        (from.x + sign * body.half_size, from.y)
    } else {
        (from.y + sign * body.half_size, from.x)
    };
    let lanes = [
        ((lateral - inset) / cs).floor() as i32,
        ((lateral + inset) / cs).floor() as i32,
    ];

    let occupied = if forward {
        (lead / cs - EDGE_EPSILON).ceil() as i32 - 1
    } else {
        (lead / cs + EDGE_EPSILON).floor() as i32
    };
    let lookahead = (limit / cs).ceil() as i32 + 1;

    for k in 1..=lookahead {
        let idx = if forward { occupied + k } else { occupied - k };
        let blocked = lanes.iter().any(|lane| {
            if dir.is_horizontal() {
                maze.blocks(idx, *lane)
            } else {
                maze.blocks(*lane, idx)
            }
        });
        if blocked {
            let gap = if forward {
                idx as f32 * cs - lead
            } else {
                lead - (idx + 1) as f32 * cs
            };
            return gap.clamp(0.0, limit.max(0.0));
        }
    }
    limit.max(0.0)
}

pub fn can_move(maze: &MazeGrid, body: &Body, dir: Direction) -> bool {
    free_distance(maze, body, body.position, dir, maze.cell_size()) > EDGE_EPSILON
}

/// Unblocked directions from the current position, in `Direction::ALL` order.
pub fn valid_directions(maze: &MazeGrid, body: &Body) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|dir| can_move(maze, body, *dir))
        .collect()
}

pub fn is_near_intersection(maze: &MazeGrid, body: &Body) -> bool {
    let cs = maze.cell_size();
    let window = body.turn_window();
    let dx = center_offset(body.position.x, cs);
    let dy = center_offset(body.position.y, cs);
    dx > -window && dx <= window && dy > -window && dy <= window
}

pub fn align_to_grid(maze: &MazeGrid, body: &mut Body) {
    let cs = maze.cell_size();
    body.position.x = snap(body.position.x, cs);
    body.position.y = snap(body.position.y, cs);
}

/// Grid cell holding the agent's center.
pub fn cell_of(maze: &MazeGrid, body: &Body) -> Vec2 {
    maze.cell_at(body.position)
}

/// Every probe corner lies in a passable cell.
pub fn is_clear(maze: &MazeGrid, body: &Body) -> bool {
    body.probe_corners().iter().all(|corner| {
        let cell = maze.cell_at(*corner);
        !maze.blocks(cell.x, cell.y)
    })
}

fn wrap(maze: &MazeGrid, body: &mut Body) {
    let width = maze.width_px();
    let height = maze.height_px();
    if body.position.x > width {
        body.position.x -= width;
    } else if body.position.x < 0.0 {
        body.position.x += width;
    }
    if body.position.y > height {
        body.position.y -= height;
    } else if body.position.y < 0.0 {
        body.position.y += height;
    }
}

fn center_offset(coord: f32, cs: f32) -> f32 {
    coord - snap(coord, cs)
}

fn snap(coord: f32, cs: f32) -> f32 {
    ((coord / cs).floor() + 0.5) * cs
}
