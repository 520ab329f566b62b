//! Enemy entities, archetypes and per-wave stat scaling

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::objective::ObjectiveId;
use super::projectile::ShotProfile;
use super::state::EntityId;

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    #[default]
    Normal,
    /// Fast, fragile, rapid ranged fire
    Scout,
    /// Slow siege unit with long-range shots
    Tank,
    /// Ignores the player entirely and only hunts objectives
    Wraith,
    /// Kamikaze that explodes on contact
    Berzerker,
    /// Fireball thrower
    Imp,
}

impl EnemyType {
    pub const ALL: [EnemyType; 6] = [
        EnemyType::Normal,
        EnemyType::Scout,
        EnemyType::Tank,
        EnemyType::Wraith,
        EnemyType::Berzerker,
        EnemyType::Imp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyType::Normal => "normal",
            EnemyType::Scout => "scout",
            EnemyType::Tank => "tank",
            EnemyType::Wraith => "wraith",
            EnemyType::Berzerker => "berzerker",
            EnemyType::Imp => "imp",
        }
    }

    /// Whether the player's proximity can pull this archetype off its target
    pub fn can_aggro(&self) -> bool {
        !matches!(self, EnemyType::Wraith | EnemyType::Berzerker)
    }
}

/// High-level behavior assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyRole {
    /// Chases the player whenever it comes near
    #[default]
    Hunter,
    /// Swarms objectives; only defends itself at very short range
    Destroyer,
}

/// What an enemy is assigned to attack. Objectives are referenced by id and
/// resolved against the session's objective table every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Player,
    Objective(ObjectiveId),
}

impl Target {
    pub fn objective(&self) -> Option<ObjectiveId> {
        match self {
            Target::Objective(id) => Some(*id),
            Target::Player => None,
        }
    }
}

/// Ranged attack parameters for archetypes that shoot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedAttack {
    /// Seconds between shots
    pub cooldown: f32,
    /// Maximum firing distance
    pub range: f32,
    pub shot: ShotProfile,
}

/// Base stats for one archetype (wave 1 values)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub max_health: f32,
    pub speed: f32,
    /// Damage used for contact attacks
    pub damage: f32,
    /// Collision sphere radius used by hitscan and projectile tests
    pub hit_radius: f32,
    /// Distance at which a hunter abandons its target for the player
    pub aggro_radius: f32,
    pub ranged: Option<RangedAttack>,
}

impl EnemyStats {
    fn melee(max_health: f32, speed: f32, damage: f32, scale: f32) -> Self {
        Self {
            max_health,
            speed,
            damage,
            hit_radius: scale / 2.0 + 1.0,
            aggro_radius: 120.0,
            ranged: None,
        }
    }

    fn shooter(mut self, cooldown: f32, range: f32, speed: f32, damage: f32) -> Self {
        self.ranged = Some(RangedAttack {
            cooldown,
            range,
            shot: ShotProfile {
                speed,
                damage,
                lifetime: 5.0,
            },
        });
        self
    }
}

/// Stats for every archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRoster {
    pub normal: EnemyStats,
    pub scout: EnemyStats,
    pub tank: EnemyStats,
    pub wraith: EnemyStats,
    pub berzerker: EnemyStats,
    pub imp: EnemyStats,
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            normal: EnemyStats::melee(10.0, 28.0, 10.0, 8.6),
            scout: EnemyStats::melee(5.0, 45.0, 10.0, 5.0).shooter(0.8, 90.0, 50.0, 10.0),
            tank: EnemyStats::melee(60.0, 8.0, 30.0, 11.5).shooter(3.5, 120.0, 30.0, 15.0),
            wraith: EnemyStats::melee(20.0, 12.0, 15.0, 7.2),
            berzerker: EnemyStats::melee(8.0, 55.0, 25.0, 6.5),
            imp: EnemyStats::melee(10.0, 22.0, 15.0, 5.8).shooter(2.0, 80.0, 30.0, 15.0),
        }
    }
}

impl EnemyRoster {
    pub fn get(&self, kind: EnemyType) -> &EnemyStats {
        match kind {
            EnemyType::Normal => &self.normal,
            EnemyType::Scout => &self.scout,
            EnemyType::Tank => &self.tank,
            EnemyType::Wraith => &self.wraith,
            EnemyType::Berzerker => &self.berzerker,
            EnemyType::Imp => &self.imp,
        }
    }
}

/// Linear per-wave stat growth. Wave 1 is unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveScaling {
    /// Fractional health gain per wave after the first (+15%)
    pub health_per_wave: f32,
    /// Fractional speed gain per wave after the first (+5%)
    pub speed_per_wave: f32,
}

impl Default for WaveScaling {
    fn default() -> Self {
        Self {
            health_per_wave: 0.15,
            speed_per_wave: 0.05,
        }
    }
}

impl WaveScaling {
    pub fn health_multiplier(&self, wave: u32) -> f32 {
        1.0 + wave.saturating_sub(1) as f32 * self.health_per_wave
    }

    pub fn speed_multiplier(&self, wave: u32) -> f32 {
        1.0 + wave.saturating_sub(1) as f32 * self.speed_per_wave
    }
}

/// Behavior thresholds shared by all enemies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub roster: EnemyRoster,
    pub scaling: WaveScaling,
    /// Self-defense radius for destroyers
    pub self_defense_radius: f32,
    /// Distance at which an enemy reaches its target
    pub contact_radius: f32,
    /// Seconds an enemy keeps chasing the player after being hurt
    pub retaliation_window: f32,
    /// Ranged archetypes never shoot closer than this
    pub min_fire_range: f32,
    /// Damage dealt when a melee enemy reaches the player (it dies doing so)
    pub melee_player_damage: f32,
    /// Damage dealt by a berzerker exploding on the player
    pub berzerker_player_blast: f32,
    /// Continuous damage radius around the player
    pub proximity_radius: f32,
    /// Continuous damage multiplier: damage * dt * factor
    pub proximity_factor: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            roster: EnemyRoster::default(),
            scaling: WaveScaling::default(),
            self_defense_radius: 10.0,
            contact_radius: 10.0,
            retaliation_window: 4.0,
            min_fire_range: 10.0,
            melee_player_damage: 15.0,
            berzerker_player_blast: 40.0,
            proximity_radius: 5.0,
            proximity_factor: 2.0,
        }
    }
}

/// Result of applying damage to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead or the amount was not a positive number
    Ignored,
    Wounded,
    /// Health just crossed zero; reported exactly once per entity
    Killed,
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyType,
    pub role: EnemyRole,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
    pub hit_radius: f32,
    pub aggro_radius: f32,
    pub ranged: Option<RangedAttack>,
    pub position: Vec3,
    /// Unit vector of the last movement direction
    pub facing: Vec3,
    pub target: Target,
    /// Whether the last AI pass sent this enemy after the player
    pub engaged_player: bool,
    /// Seconds left during which the enemy prioritizes the player
    pub retaliation_timer: f32,
    /// Seconds accumulated toward the next ranged shot
    pub fire_timer: f32,
    pub alive: bool,
}

impl Enemy {
    /// Create an enemy with stats scaled for `wave`
    pub fn spawn(
        id: EntityId,
        kind: EnemyType,
        role: EnemyRole,
        target: Target,
        position: Vec3,
        tuning: &EnemyTuning,
        wave: u32,
    ) -> Self {
        let stats = tuning.roster.get(kind);
        let max_health = stats.max_health * tuning.scaling.health_multiplier(wave);
        Self {
            id,
            kind,
            role,
            health: max_health,
            max_health,
            speed: stats.speed * tuning.scaling.speed_multiplier(wave),
            damage: stats.damage,
            hit_radius: stats.hit_radius,
            aggro_radius: stats.aggro_radius,
            ranged: stats.ranged,
            position,
            facing: Vec3::NEG_Z,
            target,
            engaged_player: matches!(target, Target::Player),
            retaliation_timer: 0.0,
            fire_timer: 0.0,
            alive: true,
        }
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Apply damage and open the retaliation window
    pub fn take_damage(&mut self, amount: f32, retaliation_window: f32) -> DamageOutcome {
        if !self.alive || amount.is_nan() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }
        self.health -= amount;
        self.retaliation_timer = retaliation_window;
        if self.health <= 0.0 {
            self.alive = false;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded
        }
    }

    /// Remove the enemy without damage bookkeeping (contact attacks)
    pub fn self_destruct(&mut self) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        self.health = 0.0;
        self.alive = false;
        DamageOutcome::Killed
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.health.is_finite()
    }
}
