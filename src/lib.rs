//! Runner mini-game from the SineAI Hub: a side-scrolling jump-over-obstacles
//! simulation and a terminal front end for it.

pub mod autopilot;
pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod logger;
pub mod render;

pub use autopilot::Autopilot;
pub use config::{ObstacleKind, PlayerConfig, RunnerConfig};
pub use error::{Result, RunnerError};
pub use game::{GameEvent, GameState, Mode, Obstacle, Player, Session};
pub use geometry::Rect;
