//! Combat state and core simulation types
//!
//! Everything the simulation mutates lives in `CombatState`, owned by the
//! session. Enemies reference objectives by id only; lookups go through the
//! objective table every tick.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::arena::ArenaBounds;
use super::boss::Boss;
use super::enemy::{Enemy, Target};
use super::events::{AlertKind, CombatEvent};
use super::objective::{Objective, ObjectiveId, ObjectiveSpec};
use super::pickups::{Pickup, PickupKind};
use super::projectile::Projectile;
use super::wave::WaveDirector;
use super::weapons::{Loadout, aim_or_default};
use crate::relative_direction;
use crate::tuning::CombatTuning;

/// Identifier for enemies, projectiles and pickups
pub type EntityId = u32;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Not running; nothing ticks
    #[default]
    Inactive,
    Playing,
    /// Player died
    GameOver,
    /// Boss defeated and victory delay elapsed
    Victory,
}

/// Problems found while ticking. Caught at the session boundary and logged;
/// the offending entity is dropped and the tick completes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimFault {
    #[error("enemy {id} has non-finite state")]
    NonFiniteEnemy { id: EntityId },
    #[error("projectile {id} has non-finite state")]
    NonFiniteProjectile { id: EntityId },
    #[error("boss has non-finite state")]
    NonFiniteBoss,
    #[error("enemy {enemy} referenced unknown objective {objective}")]
    UnknownObjective {
        enemy: EntityId,
        objective: ObjectiveId,
    },
    #[error("pickup {pickup} referenced unknown weapon slot {slot}")]
    UnknownWeapon { pickup: EntityId, slot: usize },
}

/// Player position and view direction supplied by the first-person controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for PlayerPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 0.0),
            forward: Vec3::NEG_Z,
        }
    }
}

impl PlayerPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Unit aim vector; a degenerate forward falls back to -Z
    pub fn aim(&self) -> Vec3 {
        aim_or_default(self.forward)
    }
}

/// Player balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: f32,
    /// Hostile projectiles within this distance hit the player
    pub hit_radius: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            hit_radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub pose: PlayerPose,
    pub health: f32,
    pub max_health: f32,
    /// Ignores all damage
    pub god_mode: bool,
    /// Automatic weapons refire every tick while held
    pub trigger_held: bool,
}

impl PlayerState {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            pose: PlayerPose::default(),
            health: tuning.max_health,
            max_health: tuning.max_health,
            god_mode: false,
            trigger_held: false,
        }
    }

    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 {
            self.health = (self.health + amount).min(self.max_health);
        }
    }
}

/// RNG state for deterministic runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// Complete combat state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct CombatState {
    pub rng_state: RngState,
    pub rng: Pcg32,
    /// Session clock (seconds since activation)
    pub clock: f64,
    pub time_ticks: u64,
    pub phase: SessionPhase,
    pub score: u64,
    pub player: PlayerState,
    pub loadout: Loadout,
    /// Enemies (sorted by id; dead ones are dropped at the end of a tick)
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub projectiles: Vec<Projectile>,
    pub objectives: Vec<Objective>,
    pub pickups: Vec<Pickup>,
    pub director: WaveDirector,
    pub arena: ArenaBounds,
    /// Events queued during the current tick
    pub events: Vec<CombatEvent>,
    /// Clock of the last "under attack" alert
    pub last_alert_at: Option<f64>,
    /// Seconds toward the next ambient health pickup
    pub pickup_timer: f32,
    /// Pending delayed jump to the boss fight
    pub boss_warp_timer: Option<f32>,
    next_id: u32,
}

impl CombatState {
    pub fn new(seed: u64, tuning: &CombatTuning) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            rng_state,
            rng: rng_state.to_rng(),
            clock: 0.0,
            time_ticks: 0,
            phase: SessionPhase::Inactive,
            score: 0,
            player: PlayerState::new(&tuning.player),
            loadout: Loadout::from_catalog(&tuning.weapons),
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            objectives: Vec::new(),
            pickups: Vec::new(),
            director: WaveDirector::new(),
            arena: ArenaBounds::default(),
            events: Vec::new(),
            last_alert_at: None,
            pickup_timer: 0.0,
            boss_warp_timer: None,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn push_event(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    /// Replace the objective table. Ids are assigned in order starting at 1.
    pub fn install_objectives(&mut self, specs: &[ObjectiveSpec], tuning: &CombatTuning) {
        self.objectives = specs
            .iter()
            .zip(1..)
            .map(|(spec, id)| Objective::new(id, spec, &tuning.objectives))
            .collect();
    }

    pub fn objective_index(&self, id: ObjectiveId) -> Option<usize> {
        self.objectives.iter().position(|o| o.id == id)
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn boss_alive(&self) -> bool {
        self.boss.as_ref().is_some_and(|b| b.alive)
    }

    /// Target for a fresh spawn: a random healthy objective, else the player
    pub fn random_spawn_target(&mut self) -> Target {
        let healthy: Vec<ObjectiveId> = self
            .objectives
            .iter()
            .filter(|o| o.is_enemy_target())
            .map(|o| o.id)
            .collect();
        if healthy.is_empty() {
            Target::Player
        } else {
            Target::Objective(healthy[self.rng.random_range(0..healthy.len())])
        }
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, position: Vec3) -> EntityId {
        let id = self.next_entity_id();
        self.pickups.push(Pickup { id, kind, position });
        self.push_event(CombatEvent::PickupSpawned { id, kind, position });
        id
    }

    /// Apply damage to the player. Returns the amount actually taken.
    pub fn damage_player(&mut self, amount: f32) -> f32 {
        if self.phase != SessionPhase::Playing
            || self.player.god_mode
            || amount.is_nan()
            || amount <= 0.0
        {
            return 0.0;
        }
        let taken = amount.min(self.player.health);
        self.player.health -= taken;
        self.push_event(CombatEvent::PlayerDamaged {
            amount: taken,
            health: self.player.health,
        });

        if self.player.health <= 0.0 {
            self.player.health = 0.0;
            self.phase = SessionPhase::GameOver;
            self.player.trigger_held = false;
            log::info!(
                "Game over on wave {} with score {}",
                self.director.wave,
                self.score
            );
            self.push_event(CombatEvent::GameOver {
                wave: self.director.wave,
                score: self.score,
            });
        }
        taken
    }

    /// Queue an objective alert with the direction relative to the player's view
    pub fn alert_objective(&mut self, index: usize, kind: AlertKind) {
        let Some(objective) = self.objectives.get(index) else {
            return;
        };
        let pose = self.player.pose;
        let direction = relative_direction(pose.position, pose.forward, objective.position);
        let event = CombatEvent::ObjectiveAlert {
            objective: objective.id,
            name: objective.name.clone(),
            kind,
            direction,
        };
        log::debug!("{} {:?} ({})", objective.name, kind, direction.as_str());
        self.push_event(event);
    }

    /// Remove every enemy, projectile, pickup and the boss
    pub fn clear_combatants(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.pickups.clear();
        self.boss = None;
    }

    /// Sort entity collections by ID for determinism
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.pickups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_state() -> CombatState {
        let tuning = CombatTuning::default();
        let mut state = CombatState::new(42, &tuning);
        state.phase = SessionPhase::Playing;
        state.install_objectives(
            &[
                ObjectiveSpec::new("ALPHA", Vec3::new(0.0, 0.0, -100.0)),
                ObjectiveSpec::new("BETA", Vec3::new(50.0, 0.0, -150.0)),
            ],
            &tuning,
        );
        state
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = playing_state();
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_objective_ids_assigned_in_order() {
        let state = playing_state();
        assert_eq!(state.objectives[0].id, 1);
        assert_eq!(state.objective(2).map(|o| o.name.as_str()), Some("BETA"));
        assert_eq!(state.objective_index(9), None);
    }

    #[test]
    fn test_damage_player_to_game_over() {
        let mut state = playing_state();
        assert_eq!(state.damage_player(30.0), 30.0);
        assert_eq!(state.player.health, 70.0);
        assert_eq!(state.damage_player(500.0), 70.0);
        assert_eq!(state.phase, SessionPhase::GameOver);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, CombatEvent::GameOver { .. }))
        );
        // No damage once the run is over
        assert_eq!(state.damage_player(10.0), 0.0);
    }

    #[test]
    fn test_god_mode_blocks_damage() {
        let mut state = playing_state();
        state.player.god_mode = true;
        assert_eq!(state.damage_player(50.0), 0.0);
        assert_eq!(state.player.health, 100.0);
    }

    #[test]
    fn test_spawn_target_falls_back_to_player() {
        let mut state = playing_state();
        assert!(matches!(state.random_spawn_target(), Target::Objective(_)));
        state.objectives.clear();
        assert_eq!(state.random_spawn_target(), Target::Player);
    }

    #[test]
    fn test_same_seed_same_rng() {
        let tuning = CombatTuning::default();
        let mut a = CombatState::new(7, &tuning);
        let mut b = CombatState::new(7, &tuning);
        let x: u32 = a.rng.random();
        let y: u32 = b.rng.random();
        assert_eq!(x, y);
    }
}
