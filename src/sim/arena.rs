//! Arena bounds supplied by the level builder
//!
//! The arena is an axis-aligned rectangle on the XZ plane. Enemies enter
//! from just outside its perimeter; projectiles leaving it are culled.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Axis-aligned arena rectangle (XZ plane, Y up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            min_x: ARENA_MIN_X,
            max_x: ARENA_MAX_X,
            min_z: ARENA_MIN_Z,
            max_z: ARENA_MAX_Z,
        }
    }
}

/// How far outside the walls enemies appear
const SPAWN_BUFFER: f32 = 2.0;

impl ArenaBounds {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: max_x.max(min_x),
            min_z: min_z.min(max_z),
            max_z: max_z.max(min_z),
        }
    }

    /// Default arena, stretched so it reaches past the furthest objective
    pub fn fit_objectives(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::default();
        if let Some(furthest) = positions
            .into_iter()
            .map(|p| p.z)
            .min_by(|a, b| a.total_cmp(b))
        {
            if furthest < bounds.min_z {
                bounds.min_z = furthest - ARENA_OBJECTIVE_MARGIN;
            }
        }
        bounds
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    /// Whether a point lies inside the rectangle (height ignored)
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    /// Rectangle grown by `pad` on every side
    pub fn inflate(&self, pad: f32) -> Self {
        Self::new(
            self.min_x - pad,
            self.max_x + pad,
            self.min_z - pad,
            self.max_z + pad,
        )
    }

    /// Clamp a point into the rectangle, keeping `margin` from the walls
    pub fn clamp(&self, p: Vec3, margin: f32) -> Vec3 {
        let margin_x = margin.min(self.width() / 2.0);
        let margin_z = margin.min(self.depth() / 2.0);
        Vec3::new(
            p.x.clamp(self.min_x + margin_x, self.max_x - margin_x),
            p.y,
            p.z.clamp(self.min_z + margin_z, self.max_z - margin_z),
        )
    }

    /// Random point just outside one of the four walls
    pub fn random_perimeter_point<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let along_x = self.min_x + rng.random::<f32>() * self.width();
        let along_z = self.min_z + rng.random::<f32>() * self.depth();
        let (x, z) = match rng.random_range(0..4) {
            0 => (along_x, self.min_z - SPAWN_BUFFER),
            1 => (along_x, self.max_z + SPAWN_BUFFER),
            2 => (self.min_x - SPAWN_BUFFER, along_z),
            _ => (self.max_x + SPAWN_BUFFER, along_z),
        };
        Vec3::new(x, SPAWN_HEIGHT, z)
    }

    /// Perimeter spawn point preferring a distance band around the player.
    ///
    /// Tries `attempts` candidates and takes the first whose distance to the
    /// player is in `[min_dist, max_dist]`. Otherwise falls back to the
    /// candidate farthest from the player, which keeps the spawn outside the
    /// safety radius whenever the arena allows it.
    pub fn spawn_point<R: Rng>(
        &self,
        rng: &mut R,
        player: Vec3,
        min_dist: f32,
        max_dist: f32,
        attempts: u32,
    ) -> Vec3 {
        let mut best = self.random_perimeter_point(rng);
        let mut best_dist = best.distance(player);
        if best_dist >= min_dist && best_dist <= max_dist {
            return best;
        }
        for _ in 0..attempts {
            let candidate = self.random_perimeter_point(rng);
            let dist = candidate.distance(player);
            if dist >= min_dist && dist <= max_dist {
                return candidate;
            }
            if best_dist < min_dist && dist > best_dist {
                best = candidate;
                best_dist = dist;
            }
        }
        best
    }
}
