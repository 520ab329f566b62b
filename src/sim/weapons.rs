//! Weapon catalog, player loadout and the fire routine
//!
//! The catalog is a fixed ordered list of archetypes. The player holds one
//! `WeaponInstance` per archetype; firing is gated on ammo and cooldown and
//! a blocked trigger pull is a no-op that reports why.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision;
use super::events::CombatEvent;
use super::projectile::{Aura, Blast, DeliveryMode, Projectile, ProjectileOwner};
use super::state::{CombatState, SessionPhase};
use crate::tuning::CombatTuning;

/// Distance in front of the eye where player projectiles appear
pub const MUZZLE_OFFSET: f32 = 1.0;

/// Ammo value meaning "never runs out"
pub const UNLIMITED_AMMO: i32 = -1;

/// Static definition of a weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponArchetype {
    pub name: String,
    /// Seconds between shots
    pub cooldown: f32,
    pub damage: f32,
    /// `UNLIMITED_AMMO` for infinite
    pub max_ammo: i32,
    pub delivery: DeliveryMode,
    /// Extra jittered hitscan rays fired around the center ray
    #[serde(default)]
    pub pellets: u32,
    /// Half-angle of the pellet cone (radians)
    #[serde(default)]
    pub pellet_cone: f32,
    /// Hitscan reach
    #[serde(default = "default_range")]
    pub max_range: f32,
    /// Secondary damage radius around a hitscan hit (0 = none)
    #[serde(default)]
    pub splash_radius: f32,
    /// Fraction of `damage` applied as splash
    #[serde(default)]
    pub splash_factor: f32,
    #[serde(default)]
    pub projectile_speed: f32,
    #[serde(default = "default_lifetime")]
    pub projectile_lifetime: f32,
    #[serde(default)]
    pub blast: Option<Blast>,
    #[serde(default)]
    pub aura: Option<Aura>,
    /// Refires while the trigger is held
    #[serde(default)]
    pub automatic: bool,
    /// Whether a fresh loadout carries full ammo for this weapon
    #[serde(default)]
    pub starts_loaded: bool,
}

fn default_range() -> f32 {
    500.0
}

fn default_lifetime() -> f32 {
    5.0
}

impl WeaponArchetype {
    pub fn is_unlimited(&self) -> bool {
        self.max_ammo < 0
    }
}

/// The standard five-weapon catalog
pub fn standard_catalog() -> Vec<WeaponArchetype> {
    vec![
        // Fast, weak, infinite
        WeaponArchetype {
            name: "BLASTER".into(),
            cooldown: 0.09,
            damage: 3.0,
            max_ammo: UNLIMITED_AMMO,
            delivery: DeliveryMode::Hitscan,
            pellets: 0,
            pellet_cone: 0.0,
            max_range: 500.0,
            splash_radius: 0.0,
            splash_factor: 0.0,
            projectile_speed: 0.0,
            projectile_lifetime: 0.0,
            blast: None,
            aura: None,
            automatic: false,
            starts_loaded: true,
        },
        // Pump action: center ray + 24 pellets, short reach, light splash
        WeaponArchetype {
            name: "SHOTGUN".into(),
            cooldown: 0.6,
            damage: 2.5,
            max_ammo: 12,
            delivery: DeliveryMode::Hitscan,
            pellets: 24,
            pellet_cone: 0.12,
            max_range: 100.0,
            splash_radius: 6.0,
            splash_factor: 0.5,
            projectile_speed: 0.0,
            projectile_lifetime: 0.0,
            blast: None,
            aura: None,
            automatic: false,
            starts_loaded: false,
        },
        WeaponArchetype {
            name: "LAUNCHER".into(),
            cooldown: 0.75,
            damage: 40.0,
            max_ammo: 4,
            delivery: DeliveryMode::AreaOnImpact,
            pellets: 0,
            pellet_cone: 0.0,
            max_range: 500.0,
            splash_radius: 0.0,
            splash_factor: 0.0,
            projectile_speed: 80.0,
            projectile_lifetime: 5.0,
            blast: Some(Blast {
                radius: 40.0,
                damage: 150.0,
            }),
            aura: None,
            automatic: false,
            starts_loaded: false,
        },
        WeaponArchetype {
            name: "PLASMA".into(),
            cooldown: 0.025,
            damage: 6.0,
            max_ammo: 100,
            delivery: DeliveryMode::Ballistic,
            pellets: 0,
            pellet_cone: 0.0,
            max_range: 500.0,
            splash_radius: 0.0,
            splash_factor: 0.0,
            projectile_speed: 300.0,
            projectile_lifetime: 5.0,
            blast: None,
            aura: None,
            automatic: true,
            starts_loaded: false,
        },
        // Slow orb that shreds everything around it, then detonates
        WeaponArchetype {
            name: "BIG FREAKING GEMINI".into(),
            cooldown: 1.25,
            damage: 200.0,
            max_ammo: 5,
            delivery: DeliveryMode::AreaOnImpact,
            pellets: 0,
            pellet_cone: 0.0,
            max_range: 500.0,
            splash_radius: 0.0,
            splash_factor: 0.0,
            projectile_speed: 30.0,
            projectile_lifetime: 10.0,
            blast: Some(Blast {
                radius: 80.0,
                damage: 800.0,
            }),
            aura: Some(Aura {
                radius: 40.0,
                damage_per_second: 200.0,
                boss_damage_per_second: 100.0,
            }),
            automatic: false,
            starts_loaded: false,
        },
    ]
}

/// Whether a weapon can fire right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Readiness {
    Ready,
    Empty,
    /// Seconds until the cooldown elapses
    Cooling(f32),
}

/// Player-held weapon state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponInstance {
    pub archetype: WeaponArchetype,
    /// `UNLIMITED_AMMO` for infinite
    pub ammo: i32,
    /// Session clock of the last successful shot
    pub last_fired: Option<f64>,
}

impl WeaponInstance {
    pub fn new(archetype: WeaponArchetype) -> Self {
        let ammo = if archetype.is_unlimited() {
            UNLIMITED_AMMO
        } else if archetype.starts_loaded {
            archetype.max_ammo
        } else {
            0
        };
        Self {
            archetype,
            ammo,
            last_fired: None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.ammo < 0
    }

    pub fn readiness(&self, now: f64) -> Readiness {
        if self.ammo == 0 {
            return Readiness::Empty;
        }
        if let Some(last) = self.last_fired {
            let elapsed = (now - last) as f32;
            if elapsed < self.archetype.cooldown {
                return Readiness::Cooling(self.archetype.cooldown - elapsed);
            }
        }
        Readiness::Ready
    }

    /// Spend one round and stamp the shot time
    fn consume(&mut self, now: f64) {
        if self.ammo > 0 {
            self.ammo -= 1;
        }
        self.last_fired = Some(now);
    }

    /// Add ammo up to capacity. Returns false for unlimited weapons.
    pub fn add_ammo(&mut self, amount: i32) -> bool {
        if self.is_unlimited() || amount <= 0 {
            return false;
        }
        self.ammo = (self.ammo + amount).min(self.archetype.max_ammo);
        true
    }

    pub fn refill(&mut self) {
        self.ammo = if self.archetype.is_unlimited() {
            UNLIMITED_AMMO
        } else {
            self.archetype.max_ammo
        };
    }
}

/// All weapons the player carries plus the selected slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadout {
    weapons: Vec<WeaponInstance>,
    current: usize,
}

impl Loadout {
    pub fn from_catalog(catalog: &[WeaponArchetype]) -> Self {
        Self {
            weapons: catalog.iter().cloned().map(WeaponInstance::new).collect(),
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&WeaponInstance> {
        self.weapons.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut WeaponInstance> {
        self.weapons.get_mut(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&WeaponInstance> {
        self.weapons.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut WeaponInstance> {
        self.weapons.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponInstance> {
        self.weapons.iter()
    }

    /// Select a slot. Out-of-range indices are rejected.
    pub fn switch(&mut self, index: usize) -> bool {
        if index < self.weapons.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    pub fn refill_all(&mut self) {
        for weapon in &mut self.weapons {
            weapon.refill();
        }
    }
}

/// Outcome of a trigger pull
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FireResult {
    /// Shot went out; `hits` counts hitscan rays that struck something
    Fired { weapon: usize, hits: u32 },
    /// Out of ammo: nothing happened
    DryFire { weapon: usize },
    /// Still cooling down: nothing happened
    CoolingDown { weapon: usize, remaining: f32 },
    /// Session is not in play
    Inactive,
}

impl FireResult {
    pub fn fired(&self) -> bool {
        matches!(self, FireResult::Fired { .. })
    }
}

/// Fire the selected weapon from the player's pose
pub fn fire(state: &mut CombatState, tuning: &CombatTuning) -> FireResult {
    if state.phase != SessionPhase::Playing {
        return FireResult::Inactive;
    }
    let index = state.loadout.current_index();
    let now = state.clock;
    let Some(weapon) = state.loadout.current_mut() else {
        return FireResult::Inactive;
    };

    match weapon.readiness(now) {
        Readiness::Empty => {
            log::debug!("{} dry fire", weapon.archetype.name);
            return FireResult::DryFire { weapon: index };
        }
        Readiness::Cooling(remaining) => {
            return FireResult::CoolingDown {
                weapon: index,
                remaining,
            };
        }
        Readiness::Ready => {}
    }
    weapon.consume(now);
    let archetype = weapon.archetype.clone();

    let origin = state.player.pose.position;
    let aim = state.player.pose.aim();
    let mut hits = 0;

    match archetype.delivery {
        DeliveryMode::Hitscan => {
            if collision::resolve_hitscan(state, tuning, &archetype, origin, aim) {
                hits += 1;
            }
            for _ in 0..archetype.pellets {
                let dir = collision::spread_direction(aim, archetype.pellet_cone, &mut state.rng);
                if collision::resolve_hitscan(state, tuning, &archetype, origin, dir) {
                    hits += 1;
                }
            }
        }
        DeliveryMode::Ballistic | DeliveryMode::AreaOnImpact => {
            let id = state.next_entity_id();
            let projectile = Projectile::launch(
                id,
                ProjectileOwner::Player,
                origin + aim * MUZZLE_OFFSET,
                aim,
                archetype.projectile_speed,
                archetype.projectile_lifetime,
                archetype.damage,
                archetype.delivery,
            )
            .with_blast(archetype.blast)
            .with_aura(archetype.aura);
            state.projectiles.push(projectile);
        }
    }

    state.push_event(CombatEvent::WeaponFired {
        weapon: index,
        name: archetype.name,
        origin,
        direction: aim,
    });
    FireResult::Fired {
        weapon: index,
        hits,
    }
}

/// Aim direction fallback for a degenerate forward vector
pub(crate) fn aim_or_default(forward: Vec3) -> Vec3 {
    let aim = forward.normalize_or_zero();
    if aim == Vec3::ZERO { Vec3::NEG_Z } else { aim }
}
