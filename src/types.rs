use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed exploration order used by the path search and the AI.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_perpendicular_to(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }

    /// Unit grid offset `(dx, dy)`; y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Open,
    Wall,
    Pellet,
    GhostDoor,
    GhostBase,
    PlayerSpawn,
    PowerPellet,
}

impl CellKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::Wall),
            2 => Some(Self::Pellet),
            3 => Some(Self::GhostDoor),
            4 => Some(Self::GhostBase),
            5 => Some(Self::PlayerSpawn),
            6 => Some(Self::PowerPellet),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Wall => 1,
            Self::Pellet => 2,
            Self::GhostDoor => 3,
            Self::GhostBase => 4,
            Self::PlayerSpawn => 5,
            Self::PowerPellet => 6,
        }
    }

    pub fn is_wall(self) -> bool {
        self == Self::Wall
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Continuous position in maze units (`cell_size * grid_index`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn stepped(self, dir: Direction, distance: f32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx as f32 * distance,
            y: self.y + dy as f32 * distance,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    Patrol,
    Chase,
    Flee,
    Returning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PelletKind {
    None,
    Normal,
    Power,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub position: Position,
    pub direction: Direction,
    #[serde(rename = "animationPhase")]
    pub animation_phase: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: u32,
    pub color: &'static str,
    pub position: Position,
    pub direction: Direction,
    pub state: AiState,
    #[serde(rename = "vulnerabilityTimer")]
    pub vulnerability_timer: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    PursuerEaten {
        #[serde(rename = "pursuerId")]
        pursuer_id: u32,
        points: u32,
    },
    LifeLost {
        #[serde(rename = "pursuerId")]
        pursuer_id: u32,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    LevelAdvanced {
        level: usize,
    },
    GameOver {
        score: u32,
        #[serde(rename = "bestScore")]
        best_score: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameOverSummary {
    pub score: u32,
    #[serde(rename = "bestScore")]
    pub best_score: u32,
    pub level: usize,
    pub ticks: u64,
    #[serde(rename = "newBest")]
    pub new_best: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Emitted exactly once, on the tick that drops lives to zero.
    GameOver(GameOverSummary),
    /// The session is terminal; nothing was simulated.
    Halted,
}
