//! Tuning constants for the runner.
//!
//! Every value here is a game-feel knob rather than a derived quantity, so
//! all of them can be overridden from a TOML file. Missing keys fall back to
//! the defaults below.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RunnerError};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub x: f32,
    pub width: f32,
    pub height: f32,
    /// Added to vertical velocity every tick.
    pub gravity: f32,
    /// Upward speed applied by a jump; stored positive.
    pub jump_impulse: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            x: 50.0,
            width: 30.0,
            height: 40.0,
            gravity: 0.6,
            jump_impulse: 12.0,
        }
    }
}

/// One entry of the obstacle table the spawner draws from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ObstacleKind {
    pub name: String,
    pub glyph: char,
    pub width: f32,
    pub height: f32,
    /// Gap between the ground line and the obstacle's bottom edge.
    #[serde(default)]
    pub elevation: f32,
}

impl ObstacleKind {
    pub fn new(name: &str, glyph: char, width: f32, height: f32, elevation: f32) -> Self {
        Self {
            name: name.to_string(),
            glyph,
            width,
            height,
            elevation,
        }
    }
}

fn default_obstacles() -> Vec<ObstacleKind> {
    vec![
        ObstacleKind::new("cactus", '#', 20.0, 40.0, 0.0),
        ObstacleKind::new("rock", 'o', 30.0, 20.0, 0.0),
        ObstacleKind::new("bird", 'v', 34.0, 16.0, 55.0),
    ]
}

fn default_taunts() -> Vec<String> {
    [
        "Even the buffering spinner lasted longer than that.",
        "That cactus has more followers than you now.",
        "Premiere cancelled due to lack of talent.",
        "Your jump timing needs a director's cut.",
        "Rendering your skills... 0% complete.",
        "The rock didn't even move. You walked into it.",
        "Somewhere an AI assistant is laughing at that run.",
        "Plot twist: you were the obstacle all along.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    pub world_width: f32,
    pub world_height: f32,
    /// y of the ground line; the player's bottom edge never passes it.
    pub ground_y: f32,
    pub player: PlayerConfig,
    pub initial_speed: f32,
    pub speed_step: f32,
    pub max_speed: f32,
    /// Ticks between speed increases.
    pub ramp_interval: u64,
    pub spawn_min_frames: u64,
    pub spawn_max_frames: u64,
    /// Frame budget of the terminal loop in milliseconds.
    pub tick_ms: u64,
    pub obstacles: Vec<ObstacleKind>,
    pub taunts: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            world_width: 800.0,
            world_height: 200.0,
            ground_y: 170.0,
            player: PlayerConfig::default(),
            initial_speed: 5.0,
            speed_step: 0.5,
            max_speed: 14.0,
            ramp_interval: 600,
            spawn_min_frames: 60,
            spawn_max_frames: 150,
            tick_ms: 16,
            obstacles: default_obstacles(),
            taunts: default_taunts(),
        }
    }
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RunnerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: impl Into<String>) -> Result<()> {
            Err(RunnerError::InvalidConfig(msg.into()))
        }

        let p = &self.player;
        let floats = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("ground_y", self.ground_y),
            ("player.x", p.x),
            ("player.width", p.width),
            ("player.height", p.height),
            ("player.gravity", p.gravity),
            ("player.jump_impulse", p.jump_impulse),
            ("initial_speed", self.initial_speed),
            ("speed_step", self.speed_step),
            ("max_speed", self.max_speed),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("{name} must be a finite number, got {value}"));
        }
        if let Some(kind) = self.obstacles.iter().find(|k| {
            !(k.width.is_finite() && k.height.is_finite() && k.elevation.is_finite())
        }) {
            return invalid(format!("obstacle '{}' has a non-finite dimension", kind.name));
        }

        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return invalid("world dimensions must be positive");
        }
        if self.ground_y <= 0.0 || self.ground_y > self.world_height {
            return invalid(format!(
                "ground_y {} must lie inside the world (0, {}]",
                self.ground_y, self.world_height
            ));
        }
        if p.width <= 0.0 || p.height <= 0.0 {
            return invalid("player size must be positive");
        }
        if p.height > self.ground_y {
            return invalid("player is taller than the space above the ground");
        }
        if p.gravity <= 0.0 || p.jump_impulse <= 0.0 {
            return invalid("gravity and jump_impulse must be positive");
        }
        if self.initial_speed <= 0.0 {
            return invalid("initial_speed must be positive");
        }
        if self.speed_step < 0.0 {
            return invalid("speed_step must not be negative");
        }
        if self.max_speed < self.initial_speed {
            return invalid("max_speed must be at least initial_speed");
        }
        if self.ramp_interval == 0 {
            return invalid("ramp_interval must be at least 1");
        }
        if self.spawn_min_frames == 0 || self.spawn_min_frames > self.spawn_max_frames {
            return invalid(format!(
                "spawn window [{}, {}] is empty or starts at 0",
                self.spawn_min_frames, self.spawn_max_frames
            ));
        }
        if self.tick_ms == 0 {
            return invalid("tick_ms must be at least 1");
        }
        if self.obstacles.is_empty() {
            return invalid("obstacle table is empty");
        }
        if let Some(kind) = self
            .obstacles
            .iter()
            .find(|k| k.width <= 0.0 || k.height <= 0.0 || k.elevation < 0.0)
        {
            return invalid(format!("obstacle '{}' has a bad size or elevation", kind.name));
        }
        if self.taunts.is_empty() {
            return invalid("taunt list is empty");
        }
        Ok(())
    }
}
