//! Protected objectives ("crystals") and their damage lifecycle
//!
//! Phases only move forward: `Healthy -> Corrupted -> Destroyed`.
//! Enemies wear a healthy objective down until it corrupts; a corrupted
//! objective turns into a turret that shoots at the player, and only the
//! player can finish it off. A healthy objective can never be destroyed
//! directly.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::projectile::ShotProfile;

/// Objective handle (index-free lookup key into the session's objective table)
pub type ObjectiveId = u32;

/// Lifecycle phase of an objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectivePhase {
    Healthy,
    Corrupted,
    Destroyed,
}

impl ObjectivePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectivePhase::Healthy => "healthy",
            ObjectivePhase::Corrupted => "corrupted",
            ObjectivePhase::Destroyed => "destroyed",
        }
    }
}

/// Where a point of damage came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Enemy melee, enemy/boss projectiles
    Hostile,
    /// The player's weapons
    Player,
}

/// What a damage application did to the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveTransition {
    /// Damage had no effect (wrong source for the phase, or already destroyed)
    Unaffected,
    Damaged,
    /// Healthy pool exhausted; now a corrupted turret
    Corrupted,
    /// Corrupted pool exhausted by the player
    Destroyed,
}

/// Description of an objective handed in by the gallery/arena builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub name: String,
    pub position: Vec3,
}

impl ObjectiveSpec {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Objective balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveTuning {
    pub max_health: f32,
    /// Health pool after corruption
    pub corrupted_health: f32,
    /// Collision sphere radius for projectiles and hitscan
    pub hit_radius: f32,
    /// Continuous melee damage multiplier: enemy damage * dt * factor
    pub melee_factor: f32,
    /// Damage of a berzerker detonating on an objective
    pub berzerker_blast: f32,
    /// Turret detection radius around a corrupted objective
    pub turret_range: f32,
    /// Seconds between turret shots
    pub turret_cooldown: f32,
    /// Turret muzzle: raised this much and pushed toward the player
    pub turret_muzzle_height: f32,
    pub turret_muzzle_offset: f32,
    pub turret_shot: ShotProfile,
    /// Score for neutralizing a corrupted objective
    pub neutralize_score: u64,
    /// Minimum seconds between "under attack" alerts
    pub alert_cooldown: f32,
    /// Enemies within this radius converge on an objective under attack
    pub swarm_radius: f32,
}

impl Default for ObjectiveTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            corrupted_health: 50.0,
            hit_radius: 8.0,
            melee_factor: 3.0,
            berzerker_blast: 100.0,
            turret_range: 250.0,
            turret_cooldown: 1.0,
            turret_muzzle_height: 2.0,
            turret_muzzle_offset: 10.0,
            turret_shot: ShotProfile::default(),
            neutralize_score: 500,
            alert_cooldown: 1.5,
            swarm_radius: 150.0,
        }
    }
}

/// A turret shot request produced by a corrupted objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretShot {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// A protected objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub name: String,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub phase: ObjectivePhase,
    /// Seconds accumulated toward the next turret shot
    pub turret_timer: f32,
}

impl Objective {
    pub fn new(id: ObjectiveId, spec: &ObjectiveSpec, tuning: &ObjectiveTuning) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            position: spec.position,
            health: tuning.max_health,
            max_health: tuning.max_health,
            phase: ObjectivePhase::Healthy,
            turret_timer: 0.0,
        }
    }

    /// Enemies only go after healthy objectives
    pub fn is_enemy_target(&self) -> bool {
        self.phase == ObjectivePhase::Healthy
    }

    pub fn is_alive(&self) -> bool {
        self.phase != ObjectivePhase::Destroyed
    }

    /// Corrupted objectives shoot the player and can be shot by the player
    pub fn is_hostile(&self) -> bool {
        self.phase == ObjectivePhase::Corrupted
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Apply damage according to the phase rules
    pub fn apply_damage(
        &mut self,
        amount: f32,
        source: DamageSource,
        tuning: &ObjectiveTuning,
    ) -> ObjectiveTransition {
        if amount.is_nan() || amount <= 0.0 {
            return ObjectiveTransition::Unaffected;
        }
        match (self.phase, source) {
            (ObjectivePhase::Healthy, DamageSource::Hostile) => {
                self.health -= amount;
                if self.health <= 0.0 {
                    self.corrupt(tuning);
                    ObjectiveTransition::Corrupted
                } else {
                    ObjectiveTransition::Damaged
                }
            }
            (ObjectivePhase::Corrupted, DamageSource::Player) => {
                self.health -= amount;
                if self.health <= 0.0 {
                    self.health = 0.0;
                    self.phase = ObjectivePhase::Destroyed;
                    ObjectiveTransition::Destroyed
                } else {
                    ObjectiveTransition::Damaged
                }
            }
            // Player fire cannot hurt a healthy objective, hostile fire
            // cannot finish a corrupted one.
            (ObjectivePhase::Healthy, DamageSource::Player)
            | (ObjectivePhase::Corrupted, DamageSource::Hostile)
            | (ObjectivePhase::Destroyed, _) => ObjectiveTransition::Unaffected,
        }
    }

    fn corrupt(&mut self, tuning: &ObjectiveTuning) {
        self.phase = ObjectivePhase::Corrupted;
        self.health = tuning.corrupted_health;
        self.max_health = tuning.corrupted_health;
        self.turret_timer = 0.0;
    }

    /// Advance turret logic. Returns a shot when the player is in range and
    /// the cooldown has elapsed.
    pub fn update_turret(
        &mut self,
        dt: f32,
        player: Vec3,
        tuning: &ObjectiveTuning,
    ) -> Option<TurretShot> {
        if !self.is_hostile() {
            return None;
        }
        self.turret_timer += dt;

        let in_range =
            self.position.distance_squared(player) < tuning.turret_range * tuning.turret_range;
        if !in_range || self.turret_timer <= tuning.turret_cooldown {
            return None;
        }
        self.turret_timer = 0.0;

        let direction = (player - self.position).normalize_or_zero();
        let origin = self.position
            + Vec3::Y * tuning.turret_muzzle_height
            + direction * tuning.turret_muzzle_offset;
        Some(TurretShot { origin, direction })
    }
}
