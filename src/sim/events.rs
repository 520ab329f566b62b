//! Typed events emitted by the simulation for the presentation layer
//!
//! The simulation never changes colours, plays sounds or writes HUD text.
//! It queues `CombatEvent`s during a tick; the session drains them and
//! forwards them to registered `CombatListener`s.

use glam::Vec3;
use serde::Serialize;

use super::cheats::Cheat;
use super::enemy::{EnemyRole, EnemyType};
use super::objective::{ObjectiveId, ObjectivePhase};
use super::pickups::PickupKind;
use super::state::EntityId;
use crate::RelativeDirection;

/// Why an objective alert fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    UnderAttack,
    Corrupted,
    Neutralized,
}

/// What delivered a killing blow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KillCause {
    Hitscan,
    Splash,
    Projectile,
    Explosion,
    Aura,
    /// Enemy died touching its target (melee or kamikaze)
    Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    WaveStarted {
        wave: u32,
    },
    WaveComplete {
        wave: u32,
    },
    EnemySpawned {
        id: EntityId,
        kind: EnemyType,
        role: EnemyRole,
        position: Vec3,
    },
    EnemyKilled {
        id: EntityId,
        kind: EnemyType,
        position: Vec3,
        cause: KillCause,
        /// Points awarded (0 when the player did not earn the kill)
        score: u64,
    },
    EnemyFired {
        id: EntityId,
        kind: EnemyType,
        origin: Vec3,
    },
    WeaponFired {
        weapon: usize,
        name: String,
        origin: Vec3,
        direction: Vec3,
    },
    /// Terminal point of a hitscan ray (hit or miss)
    HitscanTrace {
        origin: Vec3,
        end: Vec3,
        hit: bool,
    },
    Explosion {
        position: Vec3,
        radius: f32,
    },
    PlayerDamaged {
        amount: f32,
        health: f32,
    },
    ObjectiveAlert {
        objective: ObjectiveId,
        name: String,
        kind: AlertKind,
        direction: RelativeDirection,
    },
    ObjectiveStateChanged {
        objective: ObjectiveId,
        name: String,
        phase: ObjectivePhase,
    },
    BossSpawned {
        position: Vec3,
    },
    BossWeakPointsChanged {
        weak_points: Vec<usize>,
    },
    BossDamaged {
        amount: f32,
        critical: bool,
        health: f32,
    },
    BossFired {
        origin: Vec3,
        shots: usize,
    },
    BossDefeated {
        position: Vec3,
        score: u64,
    },
    PickupSpawned {
        id: EntityId,
        kind: PickupKind,
        position: Vec3,
    },
    PickupCollected {
        id: EntityId,
        kind: PickupKind,
    },
    CheatActivated {
        cheat: Cheat,
        /// God mode state after the cheat
        god_mode: bool,
    },
    GameOver {
        wave: u32,
        score: u64,
    },
    Victory {
        score: u64,
    },
}

/// Presentation-side callbacks. Every method has an empty default so a
/// listener only implements what it cares about; `on_event` sees every event.
pub trait CombatListener {
    fn on_objective_alert(
        &mut self,
        _objective: ObjectiveId,
        _name: &str,
        _kind: AlertKind,
        _direction: RelativeDirection,
    ) {
    }

    fn on_enemy_killed(&mut self, _id: EntityId, _kind: EnemyType, _score: u64) {}

    fn on_objective_state_changed(&mut self, _objective: ObjectiveId, _phase: ObjectivePhase) {}

    fn on_wave_complete(&mut self, _wave: u32) {}

    fn on_game_over(&mut self, _wave: u32, _score: u64) {}

    fn on_victory(&mut self, _score: u64) {}

    fn on_event(&mut self, _event: &CombatEvent) {}
}

/// Route one event to the matching typed callback, then to `on_event`
pub fn dispatch(listener: &mut dyn CombatListener, event: &CombatEvent) {
    match event {
        CombatEvent::ObjectiveAlert {
            objective,
            name,
            kind,
            direction,
        } => listener.on_objective_alert(*objective, name, *kind, *direction),
        CombatEvent::EnemyKilled {
            id, kind, score, ..
        } => listener.on_enemy_killed(*id, *kind, *score),
        CombatEvent::ObjectiveStateChanged {
            objective, phase, ..
        } => listener.on_objective_state_changed(*objective, *phase),
        CombatEvent::WaveComplete { wave } => listener.on_wave_complete(*wave),
        CombatEvent::GameOver { wave, score } => listener.on_game_over(*wave, *score),
        CombatEvent::Victory { score } => listener.on_victory(*score),
        _ => {}
    }
    listener.on_event(event);
}
