use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{ObstacleKind, PlayerConfig, RunnerConfig};
use crate::error::Result;
use crate::geometry::Rect;

const FALLBACK_TAUNT: &str = "Game over.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    NotStarted,
    Running,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vy: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub grounded: bool,
}

impl Player {
    /// A player standing on the ground line.
    pub fn new(config: &PlayerConfig, ground_y: f32) -> Self {
        Player {
            x: config.x,
            y: ground_y - config.height,
            width: config.width,
            height: config.height,
            vy: 0.0,
            gravity: config.gravity,
            jump_impulse: config.jump_impulse,
            grounded: true,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn jump(&mut self) -> bool {
        if !self.grounded {
            return false;
        }
        self.vy = -self.jump_impulse;
        self.grounded = false;
        true
    }

    fn step(&mut self, ground_y: f32) {
        self.vy += self.gravity;
        self.y += self.vy;

        let floor = ground_y - self.height;
        if self.y >= floor {
            self.y = floor;
            self.vy = 0.0;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub glyph: char,
    pub kind: String,
}

impl Obstacle {
    /// Places an obstacle of `kind` with its left edge at `x`, resting
    /// `kind.elevation` above the ground line.
    pub fn from_kind(kind: &ObstacleKind, x: f32, ground_y: f32) -> Self {
        Obstacle {
            x,
            y: ground_y - kind.elevation - kind.height,
            width: kind.width,
            height: kind.height,
            glyph: kind.glyph,
            kind: kind.name.clone(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub mode: Mode,
    pub player: Player,
    /// Ordered by left edge.
    pub obstacles: VecDeque<Obstacle>,
    pub score: u32,
    pub best_score: u32,
    pub speed: f32,
    pub frame: u64,
    pub next_spawn_frame: u64,
    pub message: Option<String>,
}

impl GameState {
    fn fresh(config: &RunnerConfig, mode: Mode, best_score: u32) -> Self {
        GameState {
            mode,
            player: Player::new(&config.player, config.ground_y),
            obstacles: VecDeque::new(),
            score: 0,
            best_score,
            speed: config.initial_speed,
            frame: 0,
            next_spawn_frame: 0,
            message: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Spawned { kind: String, frame: u64 },
    Scored { score: u32 },
    SpeedUp { speed: f32 },
    Crashed { score: u32, message: String },
}

/// One play session plus the state that survives restarts (config, best
/// score, random source).
pub struct Session {
    config: RunnerConfig,
    state: GameState,
    rng: StdRng,
}

impl Session {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: RunnerConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RunnerConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let state = GameState::fresh(&config, Mode::NotStarted, 0);
        Ok(Session { config, state, rng })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Starts a new run from not-started or ended. Returns `false` (and
    /// changes nothing) while a run is in progress.
    pub fn start(&mut self) -> bool {
        if self.state.mode == Mode::Running {
            return false;
        }
        self.state = GameState::fresh(&self.config, Mode::Running, self.state.best_score);
        self.state.next_spawn_frame = self.roll_spawn_offset();
        info!(first_spawn = self.state.next_spawn_frame, "run started");
        true
    }

    pub fn jump(&mut self) -> bool {
        if self.state.mode != Mode::Running {
            return false;
        }
        self.state.player.jump()
    }

    /// Inserts an obstacle directly, bypassing the spawner. Keeps the
    /// left-to-right order of the queue.
    pub fn push_obstacle(&mut self, obstacle: Obstacle) {
        let at = self
            .state
            .obstacles
            .iter()
            .position(|o| o.x > obstacle.x)
            .unwrap_or(self.state.obstacles.len());
        self.state.obstacles.insert(at, obstacle);
    }

    /// Advances the simulation by one frame. Does nothing unless running.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state.mode != Mode::Running {
            return events;
        }

        self.state.player.step(self.config.ground_y);

        self.state.frame += 1;
        if self.state.frame >= self.state.next_spawn_frame {
            if let Some(kind) = self.spawn() {
                events.push(GameEvent::Spawned {
                    kind,
                    frame: self.state.frame,
                });
            }
            self.state.next_spawn_frame = self.state.frame + self.roll_spawn_offset();
        }

        let player = self.state.player.rect();
        let speed = self.state.speed;
        let mut crashed = false;
        for obstacle in self.state.obstacles.iter_mut() {
            obstacle.x -= speed;
            if obstacle.rect().overlaps(&player) {
                crashed = true;
                break;
            }
        }
        if crashed {
            events.push(self.end_run());
            return events;
        }

        let mut score = self.state.score;
        self.state.obstacles.retain(|o| {
            let gone = o.rect().right() < 0.0;
            if gone {
                score += 1;
                events.push(GameEvent::Scored { score });
            }
            !gone
        });
        self.state.score = score;

        if self.state.frame % self.config.ramp_interval == 0
            && self.state.speed < self.config.max_speed
            && self.config.speed_step > 0.0
        {
            let next = self.state.speed + self.config.speed_step;
            self.state.speed = next.min(self.config.max_speed);
            events.push(GameEvent::SpeedUp {
                speed: self.state.speed,
            });
        }

        events
    }

    fn spawn(&mut self) -> Option<String> {
        let kind = self.config.obstacles.choose(&mut self.rng)?;
        let obstacle = Obstacle::from_kind(kind, self.config.world_width, self.config.ground_y);
        debug!(kind = %obstacle.kind, frame = self.state.frame, "spawned obstacle");
        let name = obstacle.kind.clone();
        self.state.obstacles.push_back(obstacle);
        Some(name)
    }

    fn roll_spawn_offset(&mut self) -> u64 {
        self.rng.gen_range(self.config.spawn_min_frames..=self.config.spawn_max_frames)
    }

    fn end_run(&mut self) -> GameEvent {
        let message = self
            .config
            .taunts
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_TAUNT.to_string());

        self.state.mode = Mode::Ended;
        self.state.best_score = self.state.best_score.max(self.state.score);
        self.state.message = Some(message.clone());
        info!(score = self.state.score, frame = self.state.frame, "run ended");

        GameEvent::Crashed {
            score: self.state.score,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spawner and ramp pushed out of reach so a test controls every obstacle.
    fn quiet_config() -> RunnerConfig {
        RunnerConfig {
            spawn_min_frames: 1_000_000,
            spawn_max_frames: 1_000_000,
            speed_step: 0.0,
            ..RunnerConfig::default()
        }
    }

    fn running(config: RunnerConfig) -> Session {
        let mut session = Session::with_seed(config, 7).expect("config should be valid");
        assert!(session.start());
        session
    }

    #[test]
    fn new_session_waits_for_start() {
        let mut session = Session::with_seed(RunnerConfig::default(), 1).unwrap();
        assert_eq!(session.mode(), Mode::NotStarted);
        assert!(session.tick().is_empty());
        assert_eq!(session.state().frame, 0);
        assert!(!session.jump());
    }

    #[test]
    fn start_is_ignored_while_running() {
        let mut session = running(quiet_config());
        session.tick();
        assert!(!session.start());
        assert_eq!(session.state().frame, 1);
    }

    #[test]
    fn jump_only_from_ground() {
        let mut session = running(quiet_config());
        let impulse = session.config().player.jump_impulse;

        assert!(session.jump());
        assert_eq!(session.state().player.vy, -impulse);
        assert!(!session.state().player.grounded);

        session.tick();
        let vy = session.state().player.vy;
        assert!(!session.jump());
        assert_eq!(session.state().player.vy, vy);
    }

    #[test]
    fn player_never_sinks_below_ground() {
        let mut session = running(RunnerConfig::default());
        let ground = session.config().ground_y;
        for i in 0..2_000 {
            if i % 37 == 0 {
                session.jump();
            }
            session.tick();
            assert!(session.state().player.rect().bottom() <= ground);
            if session.mode() == Mode::Ended {
                session.start();
            }
        }
    }

    #[test]
    fn jump_lands_back_on_ground() {
        let mut session = running(quiet_config());
        let floor = session.config().ground_y - session.config().player.height;
        session.jump();
        let mut peak = floor;
        for _ in 0..100 {
            session.tick();
            peak = peak.min(session.state().player.y);
        }
        assert!(peak < floor - 50.0, "peak {peak}");
        assert_eq!(session.state().player.y, floor);
        assert!(session.state().player.grounded);
    }

    #[test]
    fn spawns_inside_window() {
        let config = RunnerConfig {
            spawn_min_frames: 10,
            spawn_max_frames: 20,
            ..RunnerConfig::default()
        };
        let mut session = running(config);
        let mut last_spawn = 0;
        let mut spawns = 0;
        for _ in 0..400 {
            session.jump();
            for event in session.tick() {
                if let GameEvent::Spawned { frame, .. } = event {
                    let gap = frame - last_spawn;
                    assert!((10..=20).contains(&gap), "gap {gap}");
                    last_spawn = frame;
                    spawns += 1;
                }
            }
            if session.mode() == Mode::Ended {
                break;
            }
            let next = session.state().next_spawn_frame - session.state().frame;
            assert!(next <= 20);
        }
        assert!(spawns > 0);
    }

    #[test]
    fn spawned_obstacle_enters_at_right_edge() {
        let config = RunnerConfig {
            spawn_min_frames: 1,
            spawn_max_frames: 1,
            ..RunnerConfig::default()
        };
        let mut session = running(config);
        session.tick();
        let obstacle = session.state().obstacles.back().expect("one obstacle spawned");
        let speed = session.state().speed;
        assert_eq!(obstacle.x, session.config().world_width - speed);
        assert!(obstacle.rect().bottom() <= session.config().ground_y);
    }

    #[test]
    fn speed_ramps_on_interval_and_caps() {
        let config = RunnerConfig {
            ramp_interval: 10,
            initial_speed: 5.0,
            speed_step: 2.0,
            max_speed: 8.0,
            ..quiet_config()
        };
        let mut session = running(config);

        for _ in 0..9 {
            session.tick();
        }
        assert_eq!(session.state().speed, 5.0);
        session.tick();
        assert_eq!(session.state().speed, 7.0);
        for _ in 0..10 {
            session.tick();
        }
        assert_eq!(session.state().speed, 8.0);
        for _ in 0..30 {
            session.tick();
        }
        assert_eq!(session.state().speed, 8.0);
    }

    #[test]
    fn obstacles_leave_in_order() {
        let mut session = running(quiet_config());
        let kind = ObstacleKind::new("bird", 'v', 10.0, 10.0, 100.0);
        let ground = session.config().ground_y;
        session.push_obstacle(Obstacle::from_kind(&kind, 30.0, ground));
        session.push_obstacle(Obstacle::from_kind(&kind, 10.0, ground));

        let xs: Vec<f32> = session.state().obstacles.iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![10.0, 30.0]);

        let mut scores = Vec::new();
        for _ in 0..20 {
            for event in session.tick() {
                if let GameEvent::Scored { score } = event {
                    scores.push(score);
                }
            }
        }
        assert_eq!(scores, vec![1, 2]);
        assert!(session.state().obstacles.is_empty());
    }

    #[test]
    fn narrow_obstacle_scores_on_its_own_tick_behind_a_wide_one() {
        let mut session = running(quiet_config());
        let ground = session.config().ground_y;
        let wide = ObstacleKind::new("billboard", '=', 60.0, 10.0, 100.0);
        let narrow = ObstacleKind::new("drone", 'v', 10.0, 10.0, 100.0);
        session.push_obstacle(Obstacle::from_kind(&wide, 10.0, ground));
        session.push_obstacle(Obstacle::from_kind(&narrow, 20.0, ground));

        // narrow right edge: 30 - 5t < 0 from t = 7; wide: 70 - 5t < 0 from t = 15
        for _ in 0..6 {
            session.tick();
        }
        assert_eq!(session.state().score, 0);

        let events = session.tick();
        assert_eq!(events, vec![GameEvent::Scored { score: 1 }]);
        assert_eq!(session.state().obstacles.len(), 1);
        assert_eq!(session.state().obstacles[0].kind, "billboard");

        for _ in 0..7 {
            session.tick();
        }
        assert_eq!(session.state().score, 1);
        let events = session.tick();
        assert_eq!(events, vec![GameEvent::Scored { score: 2 }]);
        assert!(session.state().obstacles.is_empty());
    }

    #[test]
    fn best_score_survives_restart() {
        let mut session = running(quiet_config());
        let ground = session.config().ground_y;
        let high = ObstacleKind::new("bird", 'v', 10.0, 10.0, 100.0);
        session.push_obstacle(Obstacle::from_kind(&high, 5.0, ground));
        for _ in 0..5 {
            session.tick();
        }
        assert_eq!(session.state().score, 1);

        let wall = ObstacleKind::new("wall", '#', 20.0, 40.0, 0.0);
        let player_x = session.state().player.x;
        session.push_obstacle(Obstacle::from_kind(&wall, player_x, ground));
        let events = session.tick();
        assert!(matches!(events.last(), Some(GameEvent::Crashed { score: 1, .. })));

        assert!(session.start());
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().best_score, 1);
    }
}
