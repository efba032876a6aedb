use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CELL_SIZE, CHASE_RADIUS_CELLS, COLLISION_RADIUS_RATIO, DEFAULT_LEVELS, GHOST_POINTS,
    NORMAL_PELLET_POINTS, PATH_SEARCH_BUDGET, PATROL_REDECIDE_TICKS, PLAYER_SPEED,
    PLAYER_TOLERANCE_RATIO, POWER_PELLET_POINTS, PURSUER_TOLERANCE_RATIO, START_LIVES,
    STUCK_THRESHOLD, TICK_RATE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub normal_pellet: u32,
    pub power_pellet: u32,
    pub ghost: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            normal_pellet: NORMAL_PELLET_POINTS,
            power_pellet: POWER_PELLET_POINTS,
            ghost: GHOST_POINTS,
        }
    }
}

/// Tunables for one session. Missing JSON fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub cell_size: f32,
    pub lives: u32,
    pub player_speed: f32,
    pub tick_rate: u32,
    pub scoring: ScoringConfig,
    pub player_tolerance_ratio: f32,
    pub pursuer_tolerance_ratio: f32,
    pub chase_radius_cells: f32,
    pub collision_radius_ratio: f32,
    pub stuck_threshold: u32,
    pub patrol_redecide_ticks: u32,
    pub path_search_budget: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            lives: START_LIVES,
            player_speed: PLAYER_SPEED,
            tick_rate: TICK_RATE,
            scoring: ScoringConfig::default(),
            player_tolerance_ratio: PLAYER_TOLERANCE_RATIO,
            pursuer_tolerance_ratio: PURSUER_TOLERANCE_RATIO,
            chase_radius_cells: CHASE_RADIUS_CELLS,
            collision_radius_ratio: COLLISION_RADIUS_RATIO,
            stuck_threshold: STUCK_THRESHOLD,
            patrol_redecide_ticks: PATROL_REDECIDE_TICKS,
            path_search_budget: PATH_SEARCH_BUDGET,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(invalid(format!("cellSize must be positive, got {}", self.cell_size)));
        }
        if self.lives == 0 {
            return Err(invalid("lives must be at least 1".to_string()));
        }
        check_speed("playerSpeed", self.player_speed, self.cell_size)?;
        if self.tick_rate == 0 {
            return Err(invalid("tickRate must be at least 1".to_string()));
        }
        for (name, ratio) in [
            ("playerToleranceRatio", self.player_tolerance_ratio),
            ("pursuerToleranceRatio", self.pursuer_tolerance_ratio),
        ] {
            if !(0.0..0.5).contains(&ratio) {
                return Err(invalid(format!("{name} must be in [0, 0.5), got {ratio}")));
            }
        }
        if self.chase_radius_cells.is_nan() || self.chase_radius_cells < 0.0 {
            return Err(invalid("chaseRadiusCells must not be negative".to_string()));
        }
        if !self.collision_radius_ratio.is_finite() || self.collision_radius_ratio <= 0.0 {
            return Err(invalid("collisionRadiusRatio must be positive".to_string()));
        }
        if self.path_search_budget == 0 {
            return Err(invalid("pathSearchBudget must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval_ms(&self) -> f64 {
        1000.0 / self.tick_rate.max(1) as f64
    }

    pub fn chase_radius(&self) -> f32 {
        self.chase_radius_cells * self.cell_size
    }

    pub fn collision_radius(&self) -> f32 {
        self.collision_radius_ratio * self.cell_size
    }

    pub fn player_tolerance(&self) -> f32 {
        self.player_tolerance_ratio * self.cell_size
    }

    pub fn pursuer_tolerance(&self) -> f32 {
        self.pursuer_tolerance_ratio * self.cell_size
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSettings {
    pub max_pursuers: usize,
    pub pursuer_speed: f32,
    pub vulnerability_duration_ticks: u32,
}

/// Ordered per-level difficulty. Never empty.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: Vec<LevelSettings>,
}

impl LevelTable {
    pub fn default_for(cell_size: f32) -> Self {
        let levels = DEFAULT_LEVELS
            .iter()
            .map(|(max_pursuers, divisor, ticks)| LevelSettings {
                max_pursuers: *max_pursuers,
                pursuer_speed: cell_size / divisor,
                vulnerability_duration_ticks: *ticks,
            })
            .collect();
        Self { levels }
    }

    pub fn from_levels(levels: Vec<LevelSettings>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(invalid("level table is empty".to_string()));
        }
        for (index, level) in levels.iter().enumerate() {
            if level.max_pursuers == 0 {
                return Err(invalid(format!("level {index}: maxPursuers must be at least 1")));
            }
            if !level.pursuer_speed.is_finite() || level.pursuer_speed <= 0.0 {
                return Err(invalid(format!(
                    "level {index}: pursuerSpeed must be positive, got {}",
                    level.pursuer_speed
                )));
            }
        }
        Ok(Self { levels })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let levels: Vec<LevelSettings> = serde_json::from_str(text)?;
        Self::from_levels(levels)
    }

    /// Pursuer speeds must stay below one cell per tick on this grid.
    pub fn validate_for(&self, cell_size: f32) -> Result<(), ConfigError> {
        for (index, level) in self.levels.iter().enumerate() {
            check_speed(&format!("level {index} pursuerSpeed"), level.pursuer_speed, cell_size)?;
        }
        Ok(())
    }

    /// Entry for `index`, clamped to the last level.
    pub fn get(&self, index: usize) -> &LevelSettings {
        &self.levels[index.min(self.last_index())]
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn max_pursuers(&self) -> usize {
        self.levels
            .iter()
            .map(|level| level.max_pursuers)
            .max()
            .unwrap_or(0)
    }
}

fn check_speed(name: &str, speed: f32, cell_size: f32) -> Result<(), ConfigError> {
    if !speed.is_finite() || speed <= 0.0 || speed >= cell_size {
        return Err(invalid(format!(
            "{name} must be in (0, {cell_size}), got {speed}"
        )));
    }
    Ok(())
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
