//! Prismata Defense - crystal defense combat core
//!
//! Core modules:
//! - `sim`: Deterministic combat simulation (AI, waves, weapons, collisions)
//! - `tuning`: Data-driven game balance
//! - `web`: Browser bridge for the gallery presentation layer (wasm32 only)

pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use sim::{CombatEvent, CombatListener, CombatSession, FireResult, PlayerPose};
pub use tuning::{CombatTuning, TuningError};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest delta a single `update` call will integrate
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default arena extents (world units, XZ plane)
    pub const ARENA_MIN_X: f32 = -75.0;
    pub const ARENA_MAX_X: f32 = 75.0;
    pub const ARENA_MIN_Z: f32 = -250.0;
    pub const ARENA_MAX_Z: f32 = 25.0;
    /// How far the arena extends past the furthest objective
    pub const ARENA_OBJECTIVE_MARGIN: f32 = 100.0;

    /// Floor height; explosive projectiles detonate below this
    pub const FLOOR_Y: f32 = 0.5;
    /// Height at which enemies enter the arena
    pub const SPAWN_HEIGHT: f32 = 4.0;
}

/// Coarse direction of a world point relative to the player's view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativeDirection {
    Ahead,
    Behind,
    Left,
    Right,
}

impl RelativeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelativeDirection::Ahead => "AHEAD",
            RelativeDirection::Behind => "BEHIND",
            RelativeDirection::Left => "LEFT",
            RelativeDirection::Right => "RIGHT",
        }
    }
}

/// Project a vector onto the XZ plane and normalize it
#[inline]
pub fn flatten_xz(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

/// Classify `target` as ahead/behind/left/right of an observer at `origin`
/// looking along `forward`. Height is ignored.
pub fn relative_direction(origin: Vec3, forward: Vec3, target: Vec3) -> RelativeDirection {
    let forward = flatten_xz(forward);
    let to_target = flatten_xz(target - origin);
    let right = forward.cross(Vec3::Y);

    if forward.dot(to_target) < -0.5 {
        RelativeDirection::Behind
    } else if right.dot(to_target) > 0.5 {
        RelativeDirection::Right
    } else if right.dot(to_target) < -0.5 {
        RelativeDirection::Left
    } else {
        RelativeDirection::Ahead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_direction_quadrants() {
        // Looking down -Z (three.js camera default)
        let origin = Vec3::ZERO;
        let forward = Vec3::NEG_Z;

        assert_eq!(
            relative_direction(origin, forward, Vec3::new(0.0, 0.0, -50.0)),
            RelativeDirection::Ahead
        );
        assert_eq!(
            relative_direction(origin, forward, Vec3::new(0.0, 0.0, 50.0)),
            RelativeDirection::Behind
        );
        assert_eq!(
            relative_direction(origin, forward, Vec3::new(50.0, 0.0, 0.0)),
            RelativeDirection::Right
        );
        assert_eq!(
            relative_direction(origin, forward, Vec3::new(-50.0, 0.0, 0.0)),
            RelativeDirection::Left
        );
    }

    #[test]
    fn test_relative_direction_ignores_height() {
        let dir = relative_direction(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 500.0, -1.0));
        assert_eq!(dir, RelativeDirection::Ahead);
    }

    #[test]
    fn test_flatten_xz_zero() {
        assert_eq!(flatten_xz(Vec3::Y), Vec3::ZERO);
    }
}
