//! Data-driven game balance
//!
//! Every constant the simulation reads lives in `CombatTuning`. The default
//! value is the reference balance; JSON overrides only need to name the
//! fields they change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::boss::BossTuning;
use crate::sim::enemy::EnemyTuning;
use crate::sim::objective::ObjectiveTuning;
use crate::sim::pickups::PickupTuning;
use crate::sim::state::PlayerTuning;
use crate::sim::wave::WaveTuning;
use crate::sim::weapons::{UNLIMITED_AMMO, WeaponArchetype, standard_catalog};

/// Rejected balance data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("weapon catalog is empty")]
    EmptyCatalog,
    #[error("weapon {name}: {reason}")]
    InvalidWeapon { name: String, reason: &'static str },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be within [0, 1] (got {value})")]
    ChanceOutOfRange { field: &'static str, value: f32 },
    #[error("boss wave must be at least 1")]
    BossWaveZero,
    #[error("ammo drop references weapon slot {slot} but the catalog has {len}")]
    UnknownAmmoWeapon { slot: usize, len: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub player: PlayerTuning,
    pub enemies: EnemyTuning,
    pub objectives: ObjectiveTuning,
    pub waves: WaveTuning,
    pub boss: BossTuning,
    pub pickups: PickupTuning,
    /// Ordered weapon catalog; slot indices follow this order
    pub weapons: Vec<WeaponArchetype>,
    /// Points for each enemy the player kills
    pub kill_score: u64,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            enemies: EnemyTuning::default(),
            objectives: ObjectiveTuning::default(),
            waves: WaveTuning::default(),
            boss: BossTuning::default(),
            pickups: PickupTuning::default(),
            weapons: standard_catalog(),
            kill_score: 100,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NonPositive { field, value })
    }
}

fn chance(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::ChanceOutOfRange { field, value })
    }
}

impl CombatTuning {
    /// Parse a (possibly partial) JSON document and validate the result
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.weapons.is_empty() {
            return Err(TuningError::EmptyCatalog);
        }
        for weapon in &self.weapons {
            if !weapon.cooldown.is_finite() || weapon.cooldown < 0.0 {
                return Err(TuningError::InvalidWeapon {
                    name: weapon.name.clone(),
                    reason: "cooldown must be a non-negative number",
                });
            }
            if weapon.max_ammo < 0 && weapon.max_ammo != UNLIMITED_AMMO {
                return Err(TuningError::InvalidWeapon {
                    name: weapon.name.clone(),
                    reason: "max ammo must be non-negative or unlimited",
                });
            }
        }

        positive("player.max_health", self.player.max_health)?;
        positive("waves.spawn_interval_min", self.waves.spawn_interval_min)?;
        positive("waves.minion_interval", self.waves.minion_interval)?;
        positive("boss.max_health", self.boss.max_health)?;
        positive("boss.attack_interval", self.boss.attack_interval)?;
        positive("boss.weak_point_cycle", self.boss.weak_point_cycle)?;
        positive("objectives.max_health", self.objectives.max_health)?;
        positive("objectives.corrupted_health", self.objectives.corrupted_health)?;
        positive("objectives.turret_cooldown", self.objectives.turret_cooldown)?;

        if self.waves.boss_wave == 0 {
            return Err(TuningError::BossWaveZero);
        }

        chance("waves.destroyer_chance", self.waves.destroyer_chance)?;
        for rule in &self.waves.spawn_rules {
            chance("waves.spawn_rules.chance", rule.chance)?;
        }
        chance("pickups.drop_chance", self.pickups.drop_chance)?;

        let len = self.weapons.len();
        if let Some(drop) = self.pickups.ammo_table.iter().find(|d| d.weapon >= len) {
            return Err(TuningError::UnknownAmmoWeapon {
                slot: drop.weapon,
                len,
            });
        }
        Ok(())
    }
}
