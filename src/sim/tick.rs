//! Fixed timestep simulation tick
//!
//! Advances the combat state deterministically, in this order:
//! wave director, enemy AI and movement, boss, projectiles, objective
//! turrets, pickups. Entities whose state went non-finite are reported as
//! faults and dropped at the end of the tick.

use glam::Vec3;

use super::boss::Boss;
use super::collision::{self, damage_objective, remove_by_contact};
use super::enemy::{Enemy, EnemyRole, EnemyType, Target};
use super::events::CombatEvent;
use super::objective::{DamageSource, ObjectiveId, TurretShot};
use super::pickups::{PickupKind, ambient_position};
use super::projectile::{Projectile, ProjectileOwner};
use super::state::{CombatState, EntityId, SessionPhase, SimFault};
use super::targeting::{self, AiContext, EnemyAction, EnemyDecision};
use super::wave::DirectorCommand;
use super::weapons;
use crate::tuning::CombatTuning;

/// Visual radius reported for a berzerker detonation
const BERZERKER_BLAST_RADIUS: f32 = 10.0;

/// Ambient pickups stay this far inside the walls
const PICKUP_WALL_MARGIN: f32 = 5.0;

/// Advance the combat state by one fixed timestep.
///
/// Returns the faults found along the way; the tick always completes.
pub fn tick(state: &mut CombatState, tuning: &CombatTuning, dt: f32) -> Vec<SimFault> {
    let mut faults = Vec::new();
    if state.phase != SessionPhase::Playing {
        return faults;
    }

    state.clock += f64::from(dt);
    state.time_ticks += 1;

    // Pending boss warp
    if let Some(remaining) = state.boss_warp_timer.as_mut() {
        *remaining -= dt;
        if *remaining <= 0.0 {
            state.boss_warp_timer = None;
            warp_to_boss(state, tuning);
        }
    }

    let live = state.live_enemy_count();
    let commands = state
        .director
        .update(dt, live, &tuning.waves, &mut state.rng);
    for command in commands {
        execute_command(state, tuning, command);
    }

    if state.player.trigger_held
        && state
            .loadout
            .current()
            .is_some_and(|w| w.archetype.automatic)
    {
        weapons::fire(state, tuning);
    }

    step_enemies(state, tuning, dt, &mut faults);
    step_boss(state, tuning, dt);
    collision::step_projectiles(state, tuning, dt);
    step_turrets(state, tuning, dt);
    step_pickups(state, tuning, dt, &mut faults);

    sanitize(state, &mut faults);
    state.normalize_order();
    faults
}

/// Carry out one director request
pub fn execute_command(state: &mut CombatState, tuning: &CombatTuning, command: DirectorCommand) {
    match command {
        DirectorCommand::Spawn { kind, role, wave } => {
            spawn_enemy(state, tuning, kind, role, wave);
        }
        DirectorCommand::WaveStarted(wave) => {
            state.push_event(CombatEvent::WaveStarted { wave });
        }
        DirectorCommand::WaveComplete(wave) => {
            state.push_event(CombatEvent::WaveComplete { wave });
        }
        DirectorCommand::StartBoss => {
            state.push_event(CombatEvent::WaveStarted {
                wave: state.director.wave,
            });
            spawn_boss(state, tuning);
        }
        DirectorCommand::Victory => {
            state.phase = SessionPhase::Victory;
            state.player.trigger_held = false;
            log::info!("Victory with score {}", state.score);
            state.push_event(CombatEvent::Victory { score: state.score });
        }
    }
}

/// Spawn one enemy on the arena perimeter, away from the player
pub fn spawn_enemy(
    state: &mut CombatState,
    tuning: &CombatTuning,
    kind: EnemyType,
    role: EnemyRole,
    wave: u32,
) -> EntityId {
    let waves = &tuning.waves;
    let position = state.arena.spawn_point(
        &mut state.rng,
        state.player.pose.position,
        waves.spawn_min_distance,
        waves.spawn_max_distance,
        waves.spawn_attempts,
    );
    let target = state.random_spawn_target();
    let id = state.next_entity_id();
    let enemy = Enemy::spawn(id, kind, role, target, position, &tuning.enemies, wave);
    log::debug!("Spawned {} {} ({:?}) -> {:?}", kind.as_str(), id, role, target);
    state.enemies.push(enemy);
    state.push_event(CombatEvent::EnemySpawned {
        id,
        kind,
        role,
        position,
    });
    id
}

/// Place the boss relative to the player, replacing any previous one
pub fn spawn_boss(state: &mut CombatState, tuning: &CombatTuning) {
    let boss = Boss::spawn(state.player.pose.position, &tuning.boss, &mut state.rng);
    let (position, weak_points) = (boss.position, boss.weak_points.clone());
    state.boss = Some(boss);
    log::info!("Boss spawned at {:?}", position);
    state.push_event(CombatEvent::BossSpawned { position });
    state.push_event(CombatEvent::BossWeakPointsChanged { weak_points });
}

/// Skip straight to the boss encounter with a full arsenal
pub fn warp_to_boss(state: &mut CombatState, tuning: &CombatTuning) {
    state.loadout.refill_all();
    state.enemies.clear();
    state.projectiles.retain(|p| !p.owner.is_hostile());
    let command = state.director.start_wave(tuning.waves.boss_wave, &tuning.waves);
    execute_command(state, tuning, command);
}

/// AI for every live enemy. All decisions are made against the same
/// snapshot before any of them is committed.
fn step_enemies(
    state: &mut CombatState,
    tuning: &CombatTuning,
    dt: f32,
    faults: &mut Vec<SimFault>,
) {
    let decisions: Vec<Option<EnemyDecision>> = {
        let ctx = AiContext {
            player: state.player.pose.position,
            objectives: &state.objectives,
            tuning: &tuning.enemies,
        };
        state
            .enemies
            .iter()
            .map(|e| (e.alive && e.is_finite()).then(|| targeting::think(e, &ctx, dt)))
            .collect()
    };

    for (enemy, decision) in state.enemies.iter_mut().zip(&decisions) {
        if let Some(decision) = decision {
            targeting::apply(enemy, decision);
            if let Some(objective) = decision.unknown_objective {
                faults.push(SimFault::UnknownObjective {
                    enemy: enemy.id,
                    objective,
                });
            }
        }
    }

    for (index, decision) in decisions.iter().enumerate() {
        let Some(decision) = decision else {
            continue;
        };
        resolve_action(state, tuning, index, decision.action, dt);
    }

    // Anything loitering next to the player chips away at them
    let reach = tuning.enemies.proximity_radius;
    let player = state.player.pose.position;
    let proximity: f32 = state
        .enemies
        .iter()
        .filter(|e| e.alive && e.position.distance_squared(player) < reach * reach)
        .map(|e| e.damage * dt * tuning.enemies.proximity_factor)
        .sum();
    if proximity > 0.0 {
        state.damage_player(proximity);
    }
}

fn resolve_action(
    state: &mut CombatState,
    tuning: &CombatTuning,
    index: usize,
    action: EnemyAction,
    dt: f32,
) {
    let Some(enemy) = state.enemies.get(index).filter(|e| e.alive) else {
        return;
    };
    let (id, kind, damage, position) = (enemy.id, enemy.kind, enemy.damage, enemy.position);

    match action {
        EnemyAction::None => {}
        EnemyAction::StrikePlayer => {
            remove_by_contact(state, tuning, index);
            state.damage_player(tuning.enemies.melee_player_damage);
        }
        EnemyAction::Explode(target) => {
            remove_by_contact(state, tuning, index);
            state.push_event(CombatEvent::Explosion {
                position,
                radius: BERZERKER_BLAST_RADIUS,
            });
            match target {
                Target::Player => {
                    state.damage_player(tuning.enemies.berzerker_player_blast);
                }
                Target::Objective(objective) => {
                    strike_objective(state, tuning, objective, tuning.objectives.berzerker_blast);
                }
            }
        }
        EnemyAction::StrikeObjective(objective) => {
            let amount = damage * dt * tuning.objectives.melee_factor;
            strike_objective(state, tuning, objective, amount);
        }
        EnemyAction::Shoot {
            origin,
            direction,
            shot,
        } => {
            let projectile_id = state.next_entity_id();
            state.projectiles.push(Projectile::hostile(
                projectile_id,
                ProjectileOwner::Enemy(kind),
                origin,
                direction,
                &shot,
            ));
            state.push_event(CombatEvent::EnemyFired { id, kind, origin });
        }
    }
}

fn strike_objective(state: &mut CombatState, tuning: &CombatTuning, id: ObjectiveId, amount: f32) {
    if let Some(index) = state.objective_index(id) {
        damage_objective(state, tuning, index, amount, DamageSource::Hostile);
    }
}

fn step_boss(state: &mut CombatState, tuning: &CombatTuning, dt: f32) {
    if !state.boss_alive() {
        // Lost the boss mid-fight (fault or external wipe): bring it back
        if state.director.in_boss_fight() {
            spawn_boss(state, tuning);
        }
        return;
    }
    let player = state.player.pose.position;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    let update = boss.update(dt, player, &tuning.boss, &mut state.rng);
    let weak_points = update.weak_points_changed.then(|| boss.weak_points.clone());

    if let Some(weak_points) = weak_points {
        state.push_event(CombatEvent::BossWeakPointsChanged { weak_points });
    }
    if update.touching_player {
        state.damage_player(tuning.boss.contact_damage_per_second * dt);
    }
    if let Some(volley) = update.volley {
        for direction in &volley.directions {
            let id = state.next_entity_id();
            state.projectiles.push(Projectile::hostile(
                id,
                ProjectileOwner::Boss,
                volley.origin,
                *direction,
                &tuning.boss.shot,
            ));
        }
        state.push_event(CombatEvent::BossFired {
            origin: volley.origin,
            shots: volley.directions.len(),
        });
    }
}

fn step_turrets(state: &mut CombatState, tuning: &CombatTuning, dt: f32) {
    let player = state.player.pose.position;
    let shots: Vec<(ObjectiveId, TurretShot)> = state
        .objectives
        .iter_mut()
        .filter_map(|o| {
            let id = o.id;
            o.update_turret(dt, player, &tuning.objectives)
                .map(|shot| (id, shot))
        })
        .collect();

    for (owner, shot) in shots {
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::hostile(
            id,
            ProjectileOwner::ObjectiveTurret(owner),
            shot.origin,
            shot.direction,
            &tuning.objectives.turret_shot,
        ));
    }
}

fn step_pickups(
    state: &mut CombatState,
    tuning: &CombatTuning,
    dt: f32,
    faults: &mut Vec<SimFault>,
) {
    let pickups = &tuning.pickups;
    if pickups.ambient_interval > 0.0 {
        state.pickup_timer += dt;
        if state.pickup_timer >= pickups.ambient_interval {
            state.pickup_timer = 0.0;
            let position = ambient_position(&mut state.rng, state.player.pose.position, pickups);
            let position = state.arena.clamp(position, PICKUP_WALL_MARGIN);
            state.spawn_pickup(PickupKind::Health, position);
        }
    }

    let player = state.player.pose.position;
    let reach = pickups.collect_radius;
    let (collected, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| flat_distance_squared(p.position, player) < reach * reach);
    state.pickups = remaining;

    for pickup in collected {
        match pickup.kind {
            PickupKind::Health => state.player.heal(pickups.health_amount),
            PickupKind::Ammo { weapon, amount } => match state.loadout.get_mut(weapon) {
                Some(instance) => {
                    instance.add_ammo(amount);
                }
                None => faults.push(SimFault::UnknownWeapon {
                    pickup: pickup.id,
                    slot: weapon,
                }),
            },
        }
        state.push_event(CombatEvent::PickupCollected {
            id: pickup.id,
            kind: pickup.kind,
        });
    }
}

#[inline]
fn flat_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let d = a - b;
    d.x * d.x + d.z * d.z
}

/// Drop dead or non-finite entities, reporting the latter
fn sanitize(state: &mut CombatState, faults: &mut Vec<SimFault>) {
    state.enemies.retain(|e| {
        if !e.is_finite() {
            faults.push(SimFault::NonFiniteEnemy { id: e.id });
            return false;
        }
        e.alive
    });

    state.projectiles.retain(|p| {
        if !p.is_finite() {
            faults.push(SimFault::NonFiniteProjectile { id: p.id });
            return false;
        }
        true
    });

    match state.boss.as_ref().map(|b| (b.is_finite(), b.alive)) {
        Some((false, _)) => {
            faults.push(SimFault::NonFiniteBoss);
            state.boss = None;
        }
        Some((true, false)) => state.boss = None,
        _ => {}
    }
}
