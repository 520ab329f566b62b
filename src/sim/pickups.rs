//! Loot drops and ambient health pickups

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::EntityId;

/// What a pickup grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Health,
    /// Ammo for the weapon at this catalog index
    Ammo { weapon: usize, amount: i32 },
}

/// One weighted entry of the ammo drop table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmmoDrop {
    pub weapon: usize,
    pub weight: f32,
    pub amount: i32,
}

impl AmmoDrop {
    pub fn new(weapon: usize, weight: f32, amount: i32) -> Self {
        Self {
            weapon,
            weight,
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Chance that a killed enemy drops anything
    pub drop_chance: f32,
    /// Health share of drops: base + per_wave * (wave - 1)
    pub health_chance_base: f32,
    pub health_chance_per_wave: f32,
    pub health_amount: f32,
    pub ammo_table: Vec<AmmoDrop>,
    pub collect_radius: f32,
    /// Seconds between ambient health pickups
    pub ambient_interval: f32,
    pub ambient_min_distance: f32,
    pub ambient_max_distance: f32,
    /// Height pickups float at
    pub height: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            drop_chance: 0.8,
            health_chance_base: 0.15,
            health_chance_per_wave: 0.1,
            health_amount: 50.0,
            ammo_table: vec![
                AmmoDrop::new(1, 0.6, 8),
                AmmoDrop::new(2, 0.2, 4),
                AmmoDrop::new(3, 0.12, 40),
                AmmoDrop::new(4, 0.08, 1),
            ],
            collect_radius: 15.0,
            ambient_interval: 15.0,
            ambient_min_distance: 20.0,
            ambient_max_distance: 60.0,
            height: 2.0,
        }
    }
}

impl PickupTuning {
    pub fn health_chance(&self, wave: u32) -> f32 {
        self.health_chance_base + self.health_chance_per_wave * wave.saturating_sub(1) as f32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PickupKind,
    pub position: Vec3,
}

/// Roll the loot for an enemy killed on `wave`
pub fn roll_drop<R: Rng>(rng: &mut R, wave: u32, tuning: &PickupTuning) -> Option<PickupKind> {
    if rng.random::<f32>() >= tuning.drop_chance {
        return None;
    }
    if rng.random::<f32>() < tuning.health_chance(wave) {
        return Some(PickupKind::Health);
    }
    roll_ammo(rng, &tuning.ammo_table)
}

fn roll_ammo<R: Rng>(rng: &mut R, table: &[AmmoDrop]) -> Option<PickupKind> {
    let total: f32 = table.iter().map(|d| d.weight.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.random::<f32>() * total;
    for drop in table {
        let weight = drop.weight.max(0.0);
        if roll < weight {
            return Some(PickupKind::Ammo {
                weapon: drop.weapon,
                amount: drop.amount,
            });
        }
        roll -= weight;
    }
    table.last().map(|d| PickupKind::Ammo {
        weapon: d.weapon,
        amount: d.amount,
    })
}

/// Random point on a ring around the player for an ambient health pickup
pub fn ambient_position<R: Rng>(rng: &mut R, player: Vec3, tuning: &PickupTuning) -> Vec3 {
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    let span = (tuning.ambient_max_distance - tuning.ambient_min_distance).max(0.0);
    let dist = tuning.ambient_min_distance + rng.random::<f32>() * span;
    Vec3::new(
        player.x + angle.cos() * dist,
        tuning.height,
        player.z + angle.sin() * dist,
    )
}
