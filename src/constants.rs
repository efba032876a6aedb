pub const TICK_RATE: u32 = 60;
pub const TICK_MS: f64 = 1000.0 / TICK_RATE as f64;

pub const CELL_SIZE: f32 = 28.0;
pub const START_LIVES: u32 = 3;
pub const PLAYER_SPEED: f32 = 2.0;

pub const NORMAL_PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const GHOST_POINTS: u32 = 200;

pub const PLAYER_TOLERANCE_RATIO: f32 = 0.02;
pub const PURSUER_TOLERANCE_RATIO: f32 = 0.01;
pub const CHASE_RADIUS_CELLS: f32 = 5.0;
pub const COLLISION_RADIUS_RATIO: f32 = 0.75;
pub const STUCK_THRESHOLD: u32 = 5;
pub const PATROL_REDECIDE_TICKS: u32 = 30;
pub const PATH_SEARCH_BUDGET: usize = 1_000;

pub const MOUTH_MIN: f32 = 0.01;
pub const MOUTH_MAX: f32 = 0.25;
pub const MOUTH_STEP: f32 = 0.01;
pub const MOUTH_START: f32 = 0.2;

/// Slack used when comparing continuous coordinates against grid lines.
pub const EDGE_EPSILON: f32 = 1e-3;

pub const PURSUER_COLORS: [&str; 4] = ["red", "pink", "blue", "orange"];

/// `(max_pursuers, speed divisor, vulnerability ticks)`; speed is `cell_size / divisor`.
pub const DEFAULT_LEVELS: [(usize, f32, u32); 10] = [
    (4, 32.0, 600),
    (4, 30.0, 550),
    (4, 28.0, 500),
    (5, 26.0, 450),
    (5, 24.0, 400),
    (5, 22.0, 350),
    (5, 20.0, 300),
    (6, 18.0, 250),
    (6, 16.0, 200),
    (6, 14.0, 150),
];

pub fn pursuer_color(index: usize) -> &'static str {
    PURSUER_COLORS[index % PURSUER_COLORS.len()]
}
