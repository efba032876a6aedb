use serde::Serialize;

use crate::maze::MazeGrid;
use crate::types::{CellKind, PelletKind, Position, Vec2};

/// Pellets still on the board for the current level.
#[derive(Clone, Debug, Serialize)]
pub struct PelletField {
    #[serde(skip)]
    cell_size: f32,
    pellets: Vec<Vec<bool>>,
    #[serde(rename = "powerPellets")]
    power_pellets: Vec<Vec2>,
    #[serde(skip)]
    normal_remaining: usize,
}

impl PelletField {
    pub fn new(maze: &MazeGrid) -> Self {
        let mut field = Self {
            cell_size: maze.cell_size(),
            pellets: Vec::new(),
            power_pellets: Vec::new(),
            normal_remaining: 0,
        };
        field.reset(maze);
        field
    }

    /// Restores every pellet and power pellet from the maze layout.
    pub fn reset(&mut self, maze: &MazeGrid) {
        self.cell_size = maze.cell_size();
        self.pellets = (0..maze.height())
            .map(|row| {
                (0..maze.width())
                    .map(|col| maze.cell(col, row) == Some(CellKind::Pellet))
                    .collect()
            })
            .collect();
        self.power_pellets = maze.cells_of(CellKind::PowerPellet);
        self.normal_remaining = self.pellets.iter().flatten().filter(|present| **present).count();
    }

    /// Removes whatever pellet sits under `position`. Power pellets win when a
    /// cell would hold both.
    pub fn consume_at(&mut self, position: Position) -> PelletKind {
        let col = (position.x / self.cell_size).floor() as i32;
        let row = (position.y / self.cell_size).floor() as i32;

        if let Some(index) = self
            .power_pellets
            .iter()
            .position(|pellet| pellet.x == col && pellet.y == row)
        {
            self.power_pellets.remove(index);
            return PelletKind::Power;
        }

        if col < 0 || row < 0 {
            return PelletKind::None;
        }
        let Some(cell) = self
            .pellets
            .get_mut(row as usize)
            .and_then(|cells| cells.get_mut(col as usize))
        else {
            return PelletKind::None;
        };
        if *cell {
            *cell = false;
            self.normal_remaining -= 1;
            return PelletKind::Normal;
        }
        PelletKind::None
    }

    pub fn remaining_count(&self) -> usize {
        self.normal_remaining + self.power_pellets.len()
    }

    pub fn has_pellet(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 {
            return false;
        }
        self.pellets
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn power_pellets(&self) -> &[Vec2] {
        &self.power_pellets
    }
}
