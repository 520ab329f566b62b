//! Projectile entities and their kinematics
//!
//! Everything that travels through the arena (rockets, plasma bolts, area
//! orbs, enemy fireballs, boss virus shots, turret bolts) is a `Projectile`.
//! Hitscan shots never become projectiles; they are resolved instantly by
//! the collision module.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyType;
use super::objective::ObjectiveId;
use super::state::EntityId;

/// Who fired a projectile. Decides which volumes it is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Player,
    Enemy(EnemyType),
    Boss,
    /// A corrupted objective acting as a turret
    ObjectiveTurret(ObjectiveId),
}

impl ProjectileOwner {
    /// Hostile projectiles hurt the player and objectives
    pub fn is_hostile(&self) -> bool {
        !matches!(self, ProjectileOwner::Player)
    }
}

/// How a weapon delivers its damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Instant ray test, no projectile entity
    #[default]
    Hitscan,
    /// Travelling projectile that damages what it touches
    Ballistic,
    /// Travelling projectile that explodes on impact or expiry
    AreaOnImpact,
}

/// Speed/damage/lifetime of a projectile fired by a non-player source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotProfile {
    pub speed: f32,
    pub damage: f32,
    pub lifetime: f32,
}

impl Default for ShotProfile {
    fn default() -> Self {
        Self {
            speed: 30.0,
            damage: 15.0,
            lifetime: 5.0,
        }
    }
}

/// Falloff-free explosion applied when an explosive projectile detonates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blast {
    pub radius: f32,
    pub damage: f32,
}

/// Continuous damage field carried by an area projectile while it flies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aura {
    pub radius: f32,
    pub damage_per_second: f32,
    /// The boss shrugs off part of the field
    pub boss_damage_per_second: f32,
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub owner: ProjectileOwner,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds until the projectile expires
    pub lifetime: f32,
    pub damage: f32,
    pub delivery: DeliveryMode,
    pub blast: Option<Blast>,
    pub aura: Option<Aura>,
}

impl Projectile {
    /// Projectile fired along `direction` (normalized here) at `speed`
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        id: EntityId,
        owner: ProjectileOwner,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        lifetime: f32,
        damage: f32,
        delivery: DeliveryMode,
    ) -> Self {
        Self {
            id,
            owner,
            position: origin,
            velocity: direction.normalize_or_zero() * speed,
            lifetime,
            damage,
            delivery,
            blast: None,
            aura: None,
        }
    }

    /// Hostile projectile built from a shot profile
    pub fn hostile(
        id: EntityId,
        owner: ProjectileOwner,
        origin: Vec3,
        direction: Vec3,
        shot: &ShotProfile,
    ) -> Self {
        Self::launch(
            id,
            owner,
            origin,
            direction,
            shot.speed,
            shot.lifetime,
            shot.damage,
            DeliveryMode::Ballistic,
        )
    }

    pub fn with_blast(mut self, blast: Option<Blast>) -> Self {
        self.blast = blast;
        self
    }

    pub fn with_aura(mut self, aura: Option<Aura>) -> Self {
        self.aura = aura;
        self
    }

    /// Integrate position and burn lifetime
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.lifetime -= dt;
    }

    pub fn expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    pub fn is_explosive(&self) -> bool {
        self.blast.is_some()
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.lifetime.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_normalizes_direction() {
        let p = Projectile::launch(
            1,
            ProjectileOwner::Player,
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -10.0),
            80.0,
            5.0,
            40.0,
            DeliveryMode::AreaOnImpact,
        );
        assert!((p.velocity.length() - 80.0).abs() < 1e-4);
        assert!(p.velocity.z < 0.0);
    }

    #[test]
    fn test_advance_and_expire() {
        let shot = ShotProfile {
            speed: 10.0,
            damage: 5.0,
            lifetime: 1.0,
        };
        let mut p = Projectile::hostile(
            2,
            ProjectileOwner::Boss,
            Vec3::ZERO,
            Vec3::X,
            &shot,
        );
        p.advance(0.5);
        assert!((p.position.x - 5.0).abs() < 1e-4);
        assert!(!p.expired());
        p.advance(0.5);
        assert!(p.expired());
    }

    #[test]
    fn test_owner_hostility() {
        assert!(!ProjectileOwner::Player.is_hostile());
        assert!(ProjectileOwner::Boss.is_hostile());
        assert!(ProjectileOwner::ObjectiveTurret(3).is_hostile());
        assert!(ProjectileOwner::Enemy(EnemyType::Imp).is_hostile());
    }
}
