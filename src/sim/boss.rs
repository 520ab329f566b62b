//! Boss encounter
//!
//! A single high-HP entity made of a central body and a ring of sub-parts.
//! Every cycle a random subset of the parts becomes weak points that take
//! multiplied damage. The boss crawls toward the player, burns them on
//! contact and periodically fires a fan of shots.

use glam::{Quat, Vec3};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use super::projectile::ShotProfile;
use crate::flatten_xz;

/// Boss balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub max_health: f32,
    pub speed: f32,
    /// Hit sphere of the central body
    pub body_radius: f32,
    pub part_count: usize,
    /// Parts are scattered within +/- this offset of the body center
    pub part_spread: f32,
    pub part_radius: f32,
    pub weak_point_count: usize,
    /// Seconds between weak point rerolls
    pub weak_point_cycle: f32,
    pub weak_point_multiplier: f32,
    /// Seconds between volleys
    pub attack_interval: f32,
    pub volley_size: u32,
    /// Angle between neighbouring shots of a volley (radians, around Y)
    pub volley_spread: f32,
    /// Random per-shot angle variation (radians)
    pub volley_jitter: f32,
    pub muzzle_height: f32,
    pub shot: ShotProfile,
    pub contact_radius: f32,
    pub contact_damage_per_second: f32,
    pub kill_score: u64,
    /// Seconds between the boss dying and the session declaring victory
    pub victory_delay: f32,
    /// Spawn position relative to the player
    pub spawn_offset: Vec3,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            max_health: 5000.0,
            speed: 4.0,
            body_radius: 30.0,
            part_count: 12,
            part_spread: 35.0,
            part_radius: 4.0,
            weak_point_count: 3,
            weak_point_cycle: 5.0,
            weak_point_multiplier: 5.0,
            attack_interval: 1.5,
            volley_size: 7,
            volley_spread: 0.2,
            volley_jitter: 0.05,
            muzzle_height: 5.0,
            shot: ShotProfile {
                speed: 40.0,
                damage: 25.0,
                lifetime: 5.0,
            },
            contact_radius: 35.0,
            contact_damage_per_second: 50.0,
            kill_score: 5000,
            victory_delay: 5.0,
            spawn_offset: Vec3::new(0.0, 5.0, -60.0),
        }
    }
}

/// Which part of the boss a hit landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossHitRegion {
    Body,
    Part(usize),
}

/// Result of damaging the boss
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BossHit {
    /// Damage after the weak point multiplier
    pub applied: f32,
    pub critical: bool,
    pub killed: bool,
}

/// A fan of shots requested by the boss this tick
#[derive(Debug, Clone, PartialEq)]
pub struct BossVolley {
    pub origin: Vec3,
    pub directions: Vec<Vec3>,
}

/// What happened to the boss during one update
#[derive(Debug, Clone, Default)]
pub struct BossUpdate {
    /// Player is inside the contact radius
    pub touching_player: bool,
    pub volley: Option<BossVolley>,
    pub weak_points_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    /// Part offsets relative to `position`
    pub parts: Vec<Vec3>,
    /// Indices into `parts`, sorted
    pub weak_points: Vec<usize>,
    pub cycle_timer: f32,
    pub attack_timer: f32,
    pub alive: bool,
}

impl Boss {
    pub fn spawn<R: Rng>(player: Vec3, tuning: &BossTuning, rng: &mut R) -> Self {
        let spread = tuning.part_spread.abs();
        let parts = (0..tuning.part_count)
            .map(|_| {
                if spread > 0.0 {
                    Vec3::new(
                        rng.random_range(-spread..=spread),
                        rng.random_range(-spread..=spread),
                        rng.random_range(-spread..=spread),
                    )
                } else {
                    Vec3::ZERO
                }
            })
            .collect();

        let mut boss = Self {
            position: player + tuning.spawn_offset,
            health: tuning.max_health,
            max_health: tuning.max_health,
            parts,
            weak_points: Vec::new(),
            cycle_timer: 0.0,
            attack_timer: 0.0,
            alive: true,
        };
        boss.reroll_weak_points(tuning, rng);
        boss
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn part_position(&self, index: usize) -> Option<Vec3> {
        self.parts.get(index).map(|offset| self.position + *offset)
    }

    pub fn is_weak_point(&self, index: usize) -> bool {
        self.weak_points.binary_search(&index).is_ok()
    }

    /// Pick a fresh weak point subset
    pub fn reroll_weak_points<R: Rng>(&mut self, tuning: &BossTuning, rng: &mut R) {
        let amount = tuning.weak_point_count.min(self.parts.len());
        let mut picked = index::sample(rng, self.parts.len(), amount).into_vec();
        picked.sort_unstable();
        self.weak_points = picked;
    }

    /// Apply a hit. Part indices that are not currently weak (or no longer
    /// exist) count as a normal hit.
    pub fn take_damage(
        &mut self,
        amount: f32,
        region: BossHitRegion,
        tuning: &BossTuning,
    ) -> BossHit {
        if !self.alive || amount.is_nan() || amount <= 0.0 {
            return BossHit::default();
        }
        let critical = match region {
            BossHitRegion::Part(index) => self.is_weak_point(index),
            BossHitRegion::Body => false,
        };
        let applied = if critical {
            amount * tuning.weak_point_multiplier
        } else {
            amount
        };

        self.health -= applied;
        let killed = self.health <= 0.0;
        if killed {
            self.health = 0.0;
            self.alive = false;
        }
        BossHit {
            applied,
            critical,
            killed,
        }
    }

    /// Advance movement, weak point cycle and attack cadence
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        player: Vec3,
        tuning: &BossTuning,
        rng: &mut R,
    ) -> BossUpdate {
        let mut result = BossUpdate::default();
        if !self.alive {
            return result;
        }

        let heading = flatten_xz(player - self.position);
        self.position += heading * tuning.speed * dt;

        self.cycle_timer += dt;
        if self.cycle_timer >= tuning.weak_point_cycle {
            self.cycle_timer = 0.0;
            self.reroll_weak_points(tuning, rng);
            result.weak_points_changed = true;
        }

        result.touching_player =
            self.position.distance_squared(player) < tuning.contact_radius * tuning.contact_radius;

        self.attack_timer += dt;
        if self.attack_timer >= tuning.attack_interval {
            self.attack_timer = 0.0;
            result.volley = Some(self.volley(player, tuning, rng));
        }

        result
    }

    fn volley<R: Rng>(&self, player: Vec3, tuning: &BossTuning, rng: &mut R) -> BossVolley {
        let origin = self.position + Vec3::Y * tuning.muzzle_height;
        let aim = (player - origin).normalize_or_zero();
        let center = (tuning.volley_size as f32 - 1.0) / 2.0;
        let jitter = tuning.volley_jitter.abs();

        let directions = (0..tuning.volley_size)
            .map(|i| {
                let mut angle = (i as f32 - center) * tuning.volley_spread;
                if jitter > 0.0 {
                    angle += rng.random_range(-jitter..=jitter);
                }
                Quat::from_rotation_y(angle) * aim
            })
            .collect();

        BossVolley { origin, directions }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.health.is_finite()
    }
}
