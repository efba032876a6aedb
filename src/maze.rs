use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::constants::CELL_SIZE;
use crate::types::{CellKind, Position, Vec2};

const CLASSIC_LAYOUT: [&str; 23] = [
    "111111111111111111111",
    "122222222212222222221",
    "161112111212111211161",
    "121112111212111211121",
    "122222222222222222221",
    "121112121111121211121",
    "122222122212221222221",
    "111112111112111211111",
    "000012122222221210000",
    "111112121131121211111",
    "222222221444122222222",
    "111112121444121211111",
    "000012121111121210000",
    "000012122252221210000",
    "111112221111122211111",
    "122222222212222222221",
    "121112111212111211121",
    "122212222212222212221",
    "112212121111121212211",
    "162222122212221222261",
    "121111111212111111121",
    "122222222222222222221",
    "111111111111111111111",
];

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("maze has no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell code {code} at row {row}, col {col}")]
    UnknownCell { row: usize, col: usize, code: u8 },
    #[error("maze has no player spawn cell")]
    MissingPlayerSpawn,
    #[error("maze has no ghost base cell")]
    MissingGhostBase,
    #[error("open boundary at row {row}, col {col} without a matching tunnel exit")]
    OpenBoundary { row: usize, col: usize },
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    #[error("failed to parse maze: {0}")]
    Parse(String),
    #[error("failed to read maze file: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable maze layout plus the geometry needed to map continuous
/// positions onto cells.
#[derive(Clone, Debug, Serialize)]
pub struct MazeGrid {
    width: i32,
    height: i32,
    #[serde(rename = "cellSize")]
    cell_size: f32,
    cells: Vec<Vec<CellKind>>,
    #[serde(rename = "playerSpawn")]
    player_spawn: Vec2,
    #[serde(rename = "ghostBases")]
    ghost_bases: Vec<Vec2>,
}

impl MazeGrid {
    /// Builds a maze from integer cell codes, rejecting malformed layouts.
    pub fn from_codes(rows: &[Vec<u8>]) -> Result<Self, MazeError> {
        let Some(first) = rows.first() else {
            return Err(MazeError::Empty);
        };
        let expected = first.len();
        if expected == 0 {
            return Err(MazeError::Empty);
        }

        let mut cells = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(MazeError::RaggedRow {
                    row: row_idx,
                    expected,
                    found: row.len(),
                });
            }
            let mut parsed = Vec::with_capacity(expected);
            for (col_idx, code) in row.iter().enumerate() {
                let kind = CellKind::from_code(*code).ok_or(MazeError::UnknownCell {
                    row: row_idx,
                    col: col_idx,
                    code: *code,
                })?;
                parsed.push(kind);
            }
            cells.push(parsed);
        }

        let player_spawn = find_cells(&cells, CellKind::PlayerSpawn)
            .into_iter()
            .next()
            .ok_or(MazeError::MissingPlayerSpawn)?;
        let ghost_bases = find_cells(&cells, CellKind::GhostBase);
        if ghost_bases.is_empty() {
            return Err(MazeError::MissingGhostBase);
        }
        check_boundary(&cells)?;

        Ok(Self {
            width: expected as i32,
            height: cells.len() as i32,
            cell_size: CELL_SIZE,
            cells,
            player_spawn,
            ghost_bases,
        })
    }

    /// One row per line, one digit per cell. Blank lines, spaces and commas
    /// are ignored.
    pub fn parse_text(text: &str) -> Result<Self, MazeError> {
        let mut rows = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let mut row = Vec::new();
            for ch in line.chars() {
                if ch.is_whitespace() || ch == ',' {
                    continue;
                }
                let code = ch.to_digit(10).ok_or_else(|| {
                    MazeError::Parse(format!("unexpected {ch:?} on line {}", line_idx + 1))
                })?;
                row.push(code as u8);
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }
        Self::from_codes(&rows)
    }

    pub fn from_json_str(text: &str) -> Result<Self, MazeError> {
        let rows: Vec<Vec<u8>> =
            serde_json::from_str(text).map_err(|error| MazeError::Parse(error.to_string()))?;
        Self::from_codes(&rows)
    }

    /// Loads a `.json` array-of-arrays file or a digit text file.
    pub fn load(path: &Path) -> Result<Self, MazeError> {
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::parse_text(&text)
        }
    }

    /// The 21x23 arcade layout with a tunnel row through the middle.
    pub fn classic() -> Self {
        let rows: Vec<Vec<u8>> = CLASSIC_LAYOUT
            .iter()
            .map(|line| line.bytes().map(|b| b - b'0').collect())
            .collect();
        Self::from_codes(&rows).unwrap_or_else(|error| panic!("built-in maze is invalid: {error}"))
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Result<Self, MazeError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(MazeError::InvalidCellSize(cell_size));
        }
        self.cell_size = cell_size;
        Ok(self)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * self.cell_size
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * self.cell_size
    }

    pub fn player_spawn(&self) -> Vec2 {
        self.player_spawn
    }

    pub fn ghost_bases(&self) -> &[Vec2] {
        &self.ghost_bases
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.width && row < self.height
    }

    pub fn cell(&self, col: i32, row: i32) -> Option<CellKind> {
        if !self.in_bounds(col, row) {
            return None;
        }
        Some(self.cells[row as usize][col as usize])
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        self.cell(col, row).map(CellKind::is_wall).unwrap_or(false)
    }

    /// Passable in-bounds cell, as seen by the path search.
    pub fn is_open(&self, col: i32, row: i32) -> bool {
        self.cell(col, row).map(|kind| !kind.is_wall()).unwrap_or(false)
    }

    pub fn is_tunnel_row(&self, row: i32) -> bool {
        row >= 0
            && row < self.height
            && !self.cells[row as usize][0].is_wall()
            && !self.cells[row as usize][(self.width - 1) as usize].is_wall()
    }

    pub fn is_tunnel_col(&self, col: i32) -> bool {
        col >= 0
            && col < self.width
            && !self.cells[0][col as usize].is_wall()
            && !self.cells[(self.height - 1) as usize][col as usize].is_wall()
    }

    /// Whether a cell stops movement. Cells beyond the edge are passable only
    /// along tunnel rows and columns.
    pub fn blocks(&self, col: i32, row: i32) -> bool {
        let col_in = col >= 0 && col < self.width;
        let row_in = row >= 0 && row < self.height;
        match (col_in, row_in) {
            (true, true) => self.cells[row as usize][col as usize].is_wall(),
            (false, true) => !self.is_tunnel_row(row),
            (true, false) => !self.is_tunnel_col(col),
            (false, false) => true,
        }
    }

    pub fn cell_at(&self, position: Position) -> Vec2 {
        Vec2::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    pub fn cell_center(&self, cell: Vec2) -> Position {
        Position::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn cells_of(&self, kind: CellKind) -> Vec<Vec2> {
        find_cells(&self.cells, kind)
    }

    /// Base cell whose center is closest to `position`; ties keep row-major order.
    pub fn nearest_base(&self, position: Position) -> Vec2 {
        let mut best = self.ghost_bases[0];
        let mut best_distance = f32::INFINITY;
        for base in &self.ghost_bases {
            let distance = self.cell_center(*base).distance(position);
            if distance < best_distance {
                best_distance = distance;
                best = *base;
            }
        }
        best
    }
}

fn find_cells(cells: &[Vec<CellKind>], kind: CellKind) -> Vec<Vec2> {
    let mut found = Vec::new();
    for (row_idx, row) in cells.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if *cell == kind {
                found.push(Vec2::new(col_idx as i32, row_idx as i32));
            }
        }
    }
    found
}

fn check_boundary(cells: &[Vec<CellKind>]) -> Result<(), MazeError> {
    let height = cells.len();
    let width = cells[0].len();

    for (row_idx, row) in cells.iter().enumerate() {
        let left_open = !row[0].is_wall();
        let right_open = !row[width - 1].is_wall();
        if left_open != right_open {
            let col = if left_open { 0 } else { width - 1 };
            return Err(MazeError::OpenBoundary { row: row_idx, col });
        }
    }
    for col in 0..width {
        let top_open = !cells[0][col].is_wall();
        let bottom_open = !cells[height - 1][col].is_wall();
        if top_open != bottom_open {
            let row = if top_open { 0 } else { height - 1 };
            return Err(MazeError::OpenBoundary { row, col });
        }
    }
    Ok(())
}
