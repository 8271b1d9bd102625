//! Demo agent that plays the runner on its own.

use crate::game::{GameState, Mode, Obstacle};

/// What the agent sees of the next threat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    /// Gap between the player's right edge and the obstacle's left edge.
    pub distance: f32,
    pub obstacle_height: f32,
    pub speed: f32,
    pub grounded: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct Autopilot {
    /// How many frames ahead of contact the agent jumps.
    pub reaction_frames: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Autopilot {
            reaction_frames: 12.0,
        }
    }
}

impl Autopilot {
    pub fn new(reaction_frames: f32) -> Self {
        Autopilot { reaction_frames }
    }

    /// Nearest obstacle ahead that would hit a standing player. Obstacles
    /// flying above the player's head are not threats.
    pub fn observe(&self, state: &GameState) -> Option<Observation> {
        let player = state.player.rect();
        let standing_top = player.y;
        state
            .obstacles
            .iter()
            .filter(|o| o.rect().right() > player.x)
            .filter(|o| o.rect().bottom() > standing_top)
            .min_by(|a, b| a.x.total_cmp(&b.x))
            .map(|o: &Obstacle| Observation {
                distance: o.x - player.right(),
                obstacle_height: o.height,
                speed: state.speed,
                grounded: state.player.grounded,
            })
    }

    pub fn decide(&self, state: &GameState) -> bool {
        if state.mode != Mode::Running || !state.player.grounded {
            return false;
        }
        match self.observe(state) {
            Some(obs) => obs.distance <= obs.speed * self.reaction_frames,
            None => false,
        }
    }
}
