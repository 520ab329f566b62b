//! Combat session: the single owner of all combat state
//!
//! The presentation layer drives a `CombatSession` with `update(dt)` once per
//! frame, feeds it the player pose and logical actions, and reads back query
//! views, snapshots and events. Faults raised inside a tick are logged here
//! and never escape.

use glam::Vec3;
use serde::Serialize;

use super::arena::ArenaBounds;
use super::boss::Boss;
use super::cheats::{self, Cheat, CheatBuffer};
use super::enemy::{Enemy, EnemyRole, EnemyType};
use super::events::{CombatEvent, CombatListener, dispatch};
use super::objective::{Objective, ObjectiveId, ObjectivePhase, ObjectiveSpec};
use super::pickups::{Pickup, PickupKind};
use super::projectile::{Projectile, ProjectileOwner};
use super::state::{CombatState, EntityId, PlayerPose, SessionPhase};
use super::tick;
use super::wave::WavePhase;
use super::weapons::{self, FireResult, WeaponInstance};
use crate::consts::*;
use crate::tuning::CombatTuning;

/// Undrained events kept before the oldest are discarded
const MAX_PENDING_EVENTS: usize = 4096;

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub kind: EnemyType,
    pub role: EnemyRole,
    pub position: Vec3,
    pub facing: Vec3,
    pub health_ratio: f32,
}

impl From<&Enemy> for EnemyView {
    fn from(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id,
            kind: enemy.kind,
            role: enemy.role,
            position: enemy.position,
            facing: enemy.facing,
            health_ratio: enemy.health_ratio(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub owner: ProjectileOwner,
    pub position: Vec3,
}

impl From<&Projectile> for ProjectileView {
    fn from(projectile: &Projectile) -> Self {
        Self {
            id: projectile.id,
            owner: projectile.owner,
            position: projectile.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveView {
    pub id: ObjectiveId,
    pub name: String,
    pub position: Vec3,
    pub phase: ObjectivePhase,
    pub health_ratio: f32,
}

impl From<&Objective> for ObjectiveView {
    fn from(objective: &Objective) -> Self {
        Self {
            id: objective.id,
            name: objective.name.clone(),
            position: objective.position,
            phase: objective.phase,
            health_ratio: objective.health_ratio(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub position: Vec3,
    pub health_ratio: f32,
    /// World positions of every sub-part
    pub parts: Vec<Vec3>,
    /// Indices into `parts` currently taking amplified damage
    pub weak_points: Vec<usize>,
}

impl From<&Boss> for BossView {
    fn from(boss: &Boss) -> Self {
        Self {
            position: boss.position,
            health_ratio: boss.health_ratio(),
            parts: (0..boss.parts.len())
                .filter_map(|i| boss.part_position(i))
                .collect(),
            weak_points: boss.weak_points.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponView {
    pub index: usize,
    pub name: String,
    /// -1 for unlimited
    pub ammo: i32,
    pub max_ammo: i32,
}

impl WeaponView {
    fn new(index: usize, weapon: &WeaponInstance) -> Self {
        Self {
            index,
            name: weapon.archetype.name.clone(),
            ammo: weapon.ammo,
            max_ammo: weapon.archetype.max_ammo,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub id: EntityId,
    pub kind: PickupKind,
    pub position: Vec3,
}

impl From<&Pickup> for PickupView {
    fn from(pickup: &Pickup) -> Self {
        Self {
            id: pickup.id,
            kind: pickup.kind,
            position: pickup.position,
        }
    }
}

/// Everything presentation needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct CombatSnapshot {
    pub phase: SessionPhase,
    pub wave: u32,
    pub wave_phase: WavePhase,
    pub score: u64,
    pub player_health: f32,
    pub player_max_health: f32,
    pub god_mode: bool,
    pub current_weapon: usize,
    pub weapons: Vec<WeaponView>,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub objectives: Vec<ObjectiveView>,
    pub boss: Option<BossView>,
    pub pickups: Vec<PickupView>,
}

pub struct CombatSession {
    tuning: CombatTuning,
    state: CombatState,
    seed: u64,
    objective_specs: Vec<ObjectiveSpec>,
    arena: Option<ArenaBounds>,
    accumulator: f32,
    cheats: CheatBuffer,
    listeners: Vec<Box<dyn CombatListener>>,
    pending: Vec<CombatEvent>,
    fault_count: u64,
}

impl CombatSession {
    pub fn new(tuning: CombatTuning, seed: u64) -> Self {
        let state = CombatState::new(seed, &tuning);
        Self {
            tuning,
            state,
            seed,
            objective_specs: Vec::new(),
            arena: None,
            accumulator: 0.0,
            cheats: CheatBuffer::new(),
            listeners: Vec::new(),
            pending: Vec::new(),
            fault_count: 0,
        }
    }

    /// Start a run defending `objectives`. Without explicit bounds the
    /// default arena is stretched to cover every objective.
    pub fn activate(&mut self, objectives: &[ObjectiveSpec], arena: Option<ArenaBounds>) {
        self.objective_specs = objectives.to_vec();
        self.arena = arena;
        self.start_run();
    }

    /// Stop immediately: enemies, projectiles, pickups, the boss and all
    /// director timers are gone before this returns.
    pub fn deactivate(&mut self) {
        let state = &mut self.state;
        state.clear_combatants();
        state.director.reset();
        state.boss_warp_timer = None;
        state.pickup_timer = 0.0;
        state.player.trigger_held = false;
        state.phase = SessionPhase::Inactive;
        state.events.clear();
        self.accumulator = 0.0;
        self.cheats.clear();
        log::info!("Combat session deactivated");
    }

    /// Restart with the same objectives, arena and seed
    pub fn reset_session(&mut self) {
        self.start_run();
    }

    fn start_run(&mut self) {
        let mut state = CombatState::new(self.seed, &self.tuning);
        state.install_objectives(&self.objective_specs, &self.tuning);
        state.arena = self.arena.unwrap_or_else(|| {
            ArenaBounds::fit_objectives(state.objectives.iter().map(|o| o.position))
        });
        state.player.pose = self.state.player.pose;
        state.phase = SessionPhase::Playing;
        self.state = state;
        self.accumulator = 0.0;
        self.cheats.clear();

        log::info!(
            "Combat session started with {} objectives",
            self.state.objectives.len()
        );
        let command = self.state.director.start_wave(1, &self.tuning.waves);
        tick::execute_command(&mut self.state, &self.tuning, command);
        self.flush_events();
    }

    /// Advance by a frame delta using fixed simulation steps
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        if self.state.phase != SessionPhase::Playing {
            self.accumulator = 0.0;
            return;
        }

        self.accumulator += dt.min(MAX_FRAME_DT);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            for fault in tick::tick(&mut self.state, &self.tuning, SIM_DT) {
                self.fault_count += 1;
                log::error!("Tick {}: {}", self.state.time_ticks, fault);
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if self.state.phase != SessionPhase::Playing {
            self.accumulator = 0.0;
        }
        self.flush_events();
    }

    /// Latest pose from the first-person controller
    pub fn set_player_pose(&mut self, pose: PlayerPose) {
        if !pose.position.is_finite() || !pose.forward.is_finite() {
            log::warn!("Ignoring non-finite player pose");
            return;
        }
        self.state.player.pose = pose;
    }

    /// Hold or release the trigger for automatic weapons
    pub fn set_trigger(&mut self, held: bool) {
        self.state.player.trigger_held = held && self.state.phase == SessionPhase::Playing;
    }

    pub fn fire(&mut self) -> FireResult {
        let result = weapons::fire(&mut self.state, &self.tuning);
        self.flush_events();
        result
    }

    /// Select a weapon slot. Out-of-range indices are rejected.
    pub fn switch_weapon(&mut self, index: usize) -> bool {
        let switched = self.state.loadout.switch(index);
        if !switched {
            log::warn!("No weapon in slot {}", index);
        }
        switched
    }

    /// Jump to wave `n` (debug entry point). Clears the field first.
    pub fn start_wave(&mut self, wave: u32) {
        if self.state.phase != SessionPhase::Playing {
            log::warn!("start_wave({}) ignored while {:?}", wave, self.state.phase);
            return;
        }
        self.state.enemies.clear();
        self.state.boss = None;
        let command = self.state.director.start_wave(wave, &self.tuning.waves);
        tick::execute_command(&mut self.state, &self.tuning, command);
        self.flush_events();
    }

    /// Skip to the boss encounter with a full arsenal
    pub fn warp_to_boss(&mut self) {
        if self.state.phase != SessionPhase::Playing {
            return;
        }
        tick::warp_to_boss(&mut self.state, &self.tuning);
        self.flush_events();
    }

    /// Feed one typed key into the cheat buffer
    pub fn type_cheat(&mut self, key: char) -> Option<Cheat> {
        let cheat = self.cheats.push(key)?;
        self.apply_cheat(cheat);
        Some(cheat)
    }

    pub fn apply_cheat(&mut self, cheat: Cheat) {
        cheats::apply(&mut self.state, cheat);
        self.flush_events();
    }

    pub fn add_listener(&mut self, listener: Box<dyn CombatListener>) {
        self.listeners.push(listener);
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.pending)
    }

    fn flush_events(&mut self) {
        if self.state.events.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.state.events);
        for event in &events {
            for listener in &mut self.listeners {
                dispatch(listener.as_mut(), event);
            }
        }
        self.pending.extend(events);
        if self.pending.len() > MAX_PENDING_EVENTS {
            let excess = self.pending.len() - MAX_PENDING_EVENTS;
            self.pending.drain(..excess);
        }
    }

    // === Queries ===

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.state.phase == SessionPhase::Playing
    }

    pub fn wave(&self) -> u32 {
        self.state.director.wave
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn player_health(&self) -> f32 {
        self.state.player.health
    }

    pub fn player_pose(&self) -> PlayerPose {
        self.state.player.pose
    }

    pub fn current_weapon(&self) -> Option<WeaponView> {
        let index = self.state.loadout.current_index();
        self.state
            .loadout
            .current()
            .map(|w| WeaponView::new(index, w))
    }

    pub fn weapons(&self) -> Vec<WeaponView> {
        self.state
            .loadout
            .iter()
            .enumerate()
            .map(|(i, w)| WeaponView::new(i, w))
            .collect()
    }

    pub fn enemies(&self) -> Vec<EnemyView> {
        self.state
            .enemies
            .iter()
            .filter(|e| e.alive)
            .map(EnemyView::from)
            .collect()
    }

    pub fn projectiles(&self) -> Vec<ProjectileView> {
        self.state.projectiles.iter().map(ProjectileView::from).collect()
    }

    pub fn objectives(&self) -> Vec<ObjectiveView> {
        self.state.objectives.iter().map(ObjectiveView::from).collect()
    }

    pub fn boss(&self) -> Option<BossView> {
        self.state
            .boss
            .as_ref()
            .filter(|b| b.alive)
            .map(BossView::from)
    }

    pub fn pickups(&self) -> Vec<PickupView> {
        self.state.pickups.iter().map(PickupView::from).collect()
    }

    pub fn arena(&self) -> ArenaBounds {
        self.state.arena
    }

    /// Faults caught and logged since the session was created
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    pub fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            phase: self.state.phase,
            wave: self.state.director.wave,
            wave_phase: self.state.director.phase,
            score: self.state.score,
            player_health: self.state.player.health,
            player_max_health: self.state.player.max_health,
            god_mode: self.state.player.god_mode,
            current_weapon: self.state.loadout.current_index(),
            weapons: self.weapons(),
            enemies: self.enemies(),
            projectiles: self.projectiles(),
            objectives: self.objectives(),
            boss: self.boss(),
            pickups: self.pickups(),
        }
    }
}
