pub mod actor;
pub mod best_score_store;
pub mod config;
pub mod constants;
pub mod engine;
pub mod game_loop;
pub mod logging;
pub mod maze;
pub mod motion;
pub mod pathfinding;
pub mod pellets;
pub mod player;
pub mod pursuer;
pub mod rng;
pub mod types;
