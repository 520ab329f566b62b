//! Collision detection and damage resolution
//!
//! Two delivery paths feed into one set of damage helpers:
//! - hitscan rays resolved instantly against enemies, corrupted objectives
//!   and the boss, with optional splash around the hit point
//! - travelling projectiles advanced every tick and tested with radius
//!   checks (player shots against enemies/boss/corrupted objectives, hostile
//!   shots against the player and objectives)
//!
//! The damage helpers own every side effect of a hit: kill bookkeeping,
//! score, loot rolls, objective alerts and the events presentation needs.

use glam::Vec3;
use rand::Rng;

use super::boss::{BossHit, BossHitRegion};
use super::enemy::DamageOutcome;
use super::events::{AlertKind, CombatEvent, KillCause};
use super::objective::{DamageSource, ObjectivePhase, ObjectiveTransition};
use super::pickups::roll_drop;
use super::projectile::{Aura, Blast, Projectile, ProjectileOwner};
use super::state::CombatState;
use super::targeting;
use super::weapons::WeaponArchetype;
use crate::consts::FLOOR_Y;
use crate::tuning::CombatTuning;

/// Projectiles this far outside the arena walls are culled
pub const CULL_MARGIN: f32 = 20.0;

/// Something a ray or projectile can hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Index into `state.enemies`
    Enemy(usize),
    /// Index into `state.objectives`
    Objective(usize),
    Boss(BossHitRegion),
}

/// Result of a hitscan ray cast
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub target: Option<HitTarget>,
    /// Distance along the ray to the terminal point
    pub distance: f32,
    /// Terminal point (hit point, or the end of the ray on a miss)
    pub point: Vec3,
}

impl RayHit {
    pub fn miss(origin: Vec3, direction: Vec3, max_range: f32) -> Self {
        Self {
            target: None,
            distance: max_range,
            point: origin + direction * max_range,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.target.is_some()
    }
}

/// Distance along a unit ray to the first intersection with a sphere.
/// An origin inside the sphere hits at distance 0.
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let far = -b + root;
    if far < 0.0 {
        return None;
    }
    Some((-b - root).max(0.0))
}

/// Random direction inside a cone of half-angle `cone` around `aim`
pub fn spread_direction<R: Rng>(aim: Vec3, cone: f32, rng: &mut R) -> Vec3 {
    let aim = aim.normalize_or_zero();
    if cone <= 0.0 || aim == Vec3::ZERO {
        return aim;
    }
    let (u, v) = aim.any_orthonormal_pair();
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    // sqrt keeps pellets evenly spread over the disk
    let radius = cone.tan() * rng.random::<f32>().sqrt();
    (aim + (u * angle.cos() + v * angle.sin()) * radius).normalize()
}

/// Nearest hit along a ray, bounded by `max_range`
pub fn cast_ray(
    state: &CombatState,
    tuning: &CombatTuning,
    origin: Vec3,
    direction: Vec3,
    max_range: f32,
) -> RayHit {
    let mut best: Option<(HitTarget, f32)> = None;
    let mut consider = |target: HitTarget, t: f32| {
        if t <= max_range && best.is_none_or(|(_, d)| t < d) {
            best = Some((target, t));
        }
    };

    for (i, enemy) in state.enemies.iter().enumerate().filter(|(_, e)| e.alive) {
        if let Some(t) = ray_sphere(origin, direction, enemy.position, enemy.hit_radius) {
            consider(HitTarget::Enemy(i), t);
        }
    }

    let objective_radius = tuning.objectives.hit_radius;
    for (i, objective) in state.objectives.iter().enumerate() {
        if !objective.is_hostile() {
            continue;
        }
        if let Some(t) = ray_sphere(origin, direction, objective.position, objective_radius) {
            consider(HitTarget::Objective(i), t);
        }
    }

    if let Some(boss) = state.boss.as_ref().filter(|b| b.alive) {
        // A part hit wins over the body it is embedded in
        let part = (0..boss.parts.len())
            .filter_map(|i| {
                let center = boss.part_position(i)?;
                ray_sphere(origin, direction, center, tuning.boss.part_radius).map(|t| (i, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match part {
            Some((i, t)) => consider(HitTarget::Boss(BossHitRegion::Part(i)), t),
            None => {
                if let Some(t) = ray_sphere(origin, direction, boss.position, tuning.boss.body_radius)
                {
                    consider(HitTarget::Boss(BossHitRegion::Body), t);
                }
            }
        }
    }

    match best {
        Some((target, distance)) => RayHit {
            target: Some(target),
            distance,
            point: origin + direction * distance,
        },
        None => RayHit::miss(origin, direction, max_range),
    }
}

/// Resolve one hitscan ray from the player. Returns whether it hit.
pub fn resolve_hitscan(
    state: &mut CombatState,
    tuning: &CombatTuning,
    weapon: &WeaponArchetype,
    origin: Vec3,
    direction: Vec3,
) -> bool {
    let hit = cast_ray(state, tuning, origin, direction, weapon.max_range);
    state.push_event(CombatEvent::HitscanTrace {
        origin,
        end: hit.point,
        hit: hit.is_hit(),
    });

    let Some(target) = hit.target else {
        return false;
    };
    apply_hit(state, tuning, target, weapon.damage, KillCause::Hitscan);

    if weapon.splash_radius > 0.0 && weapon.splash_factor > 0.0 {
        let primary = match target {
            HitTarget::Enemy(i) => Some(i),
            _ => None,
        };
        apply_splash(
            state,
            tuning,
            hit.point,
            weapon.splash_radius,
            weapon.damage * weapon.splash_factor,
            primary,
            KillCause::Splash,
        );
    }
    true
}

/// Direct damage from the player to whatever was hit
fn apply_hit(
    state: &mut CombatState,
    tuning: &CombatTuning,
    target: HitTarget,
    amount: f32,
    cause: KillCause,
) {
    match target {
        HitTarget::Enemy(i) => {
            damage_enemy(state, tuning, i, amount, cause);
        }
        HitTarget::Objective(i) => {
            damage_objective(state, tuning, i, amount, DamageSource::Player);
        }
        HitTarget::Boss(region) => {
            damage_boss(state, tuning, amount, region);
        }
    }
}

/// Flat damage to every enemy near a point except `exclude`
pub fn apply_splash(
    state: &mut CombatState,
    tuning: &CombatTuning,
    point: Vec3,
    radius: f32,
    amount: f32,
    exclude: Option<usize>,
    cause: KillCause,
) {
    let radius_sq = radius * radius;
    let victims: Vec<usize> = state
        .enemies
        .iter()
        .enumerate()
        .filter(|(i, e)| {
            e.alive && Some(*i) != exclude && e.position.distance_squared(point) < radius_sq
        })
        .map(|(i, _)| i)
        .collect();
    for i in victims {
        damage_enemy(state, tuning, i, amount, cause);
    }
}

/// Damage an enemy on behalf of the player. Kills award score and roll loot.
pub fn damage_enemy(
    state: &mut CombatState,
    tuning: &CombatTuning,
    index: usize,
    amount: f32,
    cause: KillCause,
) -> DamageOutcome {
    let Some(enemy) = state.enemies.get_mut(index) else {
        return DamageOutcome::Ignored;
    };
    let outcome = enemy.take_damage(amount, tuning.enemies.retaliation_window);
    if outcome == DamageOutcome::Killed {
        let (id, kind, position) = (enemy.id, enemy.kind, enemy.position);
        state.score += tuning.kill_score;
        log::debug!("{} {} killed ({:?})", kind.as_str(), id, cause);
        state.push_event(CombatEvent::EnemyKilled {
            id,
            kind,
            position,
            cause,
            score: tuning.kill_score,
        });
        drop_loot(state, tuning, position);
    }
    outcome
}

/// Kill an enemy that reached its target. Loot still drops, but no score.
pub fn remove_by_contact(state: &mut CombatState, tuning: &CombatTuning, index: usize) {
    let Some(enemy) = state.enemies.get_mut(index) else {
        return;
    };
    if enemy.self_destruct() == DamageOutcome::Killed {
        let (id, kind, position) = (enemy.id, enemy.kind, enemy.position);
        state.push_event(CombatEvent::EnemyKilled {
            id,
            kind,
            position,
            cause: KillCause::Contact,
            score: 0,
        });
        drop_loot(state, tuning, position);
    }
}

fn drop_loot(state: &mut CombatState, tuning: &CombatTuning, position: Vec3) {
    if let Some(kind) = roll_drop(&mut state.rng, state.director.wave, &tuning.pickups) {
        let position = Vec3::new(position.x, tuning.pickups.height, position.z);
        state.spawn_pickup(kind, position);
    }
}

/// Damage the boss. Weak point attribution happens inside `Boss::take_damage`.
pub fn damage_boss(
    state: &mut CombatState,
    tuning: &CombatTuning,
    amount: f32,
    region: BossHitRegion,
) -> BossHit {
    let Some(boss) = state.boss.as_mut() else {
        return BossHit::default();
    };
    let hit = boss.take_damage(amount, region, &tuning.boss);
    let (health, position) = (boss.health, boss.position);

    if hit.applied > 0.0 {
        if hit.critical {
            log::debug!("Critical boss hit for {:.1}", hit.applied);
        }
        state.push_event(CombatEvent::BossDamaged {
            amount: hit.applied,
            critical: hit.critical,
            health,
        });
    }

    if hit.killed {
        let score = tuning.boss.kill_score;
        state.score += score;
        log::info!("Boss defeated, score {}", state.score);
        state.push_event(CombatEvent::BossDefeated { position, score });
        state.push_event(CombatEvent::Explosion {
            position,
            radius: tuning.boss.body_radius + tuning.boss.part_spread,
        });
        state.director.boss_defeated(tuning.boss.victory_delay);
    }
    hit
}

/// Damage an objective and react to its phase transitions
pub fn damage_objective(
    state: &mut CombatState,
    tuning: &CombatTuning,
    index: usize,
    amount: f32,
    source: DamageSource,
) -> ObjectiveTransition {
    let Some(objective) = state.objectives.get_mut(index) else {
        return ObjectiveTransition::Unaffected;
    };
    let transition = objective.apply_damage(amount, source, &tuning.objectives);
    let (id, name) = (objective.id, objective.name.clone());

    match transition {
        ObjectiveTransition::Unaffected => {}
        ObjectiveTransition::Damaged => {
            if source == DamageSource::Hostile {
                objective_under_attack(state, tuning, index);
            }
        }
        ObjectiveTransition::Corrupted => {
            log::info!("Objective {} corrupted", name);
            state.push_event(CombatEvent::ObjectiveStateChanged {
                objective: id,
                name,
                phase: ObjectivePhase::Corrupted,
            });
            state.alert_objective(index, AlertKind::Corrupted);
            targeting::release_objective(&mut state.enemies, id);
        }
        ObjectiveTransition::Destroyed => {
            state.score += tuning.objectives.neutralize_score;
            log::info!("Objective {} neutralized", name);
            state.push_event(CombatEvent::ObjectiveStateChanged {
                objective: id,
                name,
                phase: ObjectivePhase::Destroyed,
            });
            state.alert_objective(index, AlertKind::Neutralized);
            targeting::release_objective(&mut state.enemies, id);
        }
    }
    transition
}

/// Throttled alert plus swarm toward an objective taking hostile damage
fn objective_under_attack(state: &mut CombatState, tuning: &CombatTuning, index: usize) {
    let now = state.clock;
    let cooldown = f64::from(tuning.objectives.alert_cooldown);
    if state.last_alert_at.is_some_and(|t| now - t < cooldown) {
        return;
    }
    state.last_alert_at = Some(now);
    state.alert_objective(index, AlertKind::UnderAttack);
    if let Some(objective) = state.objectives.get(index) {
        targeting::swarm_objective(&mut state.enemies, objective, tuning.objectives.swarm_radius);
    }
}

/// Falloff-free explosion from a player projectile
pub fn apply_blast(state: &mut CombatState, tuning: &CombatTuning, center: Vec3, blast: Blast) {
    state.push_event(CombatEvent::Explosion {
        position: center,
        radius: blast.radius,
    });
    area_damage(
        state,
        tuning,
        center,
        blast.radius,
        blast.damage,
        blast.damage,
        KillCause::Explosion,
    );
}

/// One tick of an area projectile's damage field
pub fn apply_aura(
    state: &mut CombatState,
    tuning: &CombatTuning,
    center: Vec3,
    aura: Aura,
    dt: f32,
) {
    area_damage(
        state,
        tuning,
        center,
        aura.radius,
        aura.damage_per_second * dt,
        aura.boss_damage_per_second * dt,
        KillCause::Aura,
    );
}

/// Damage enemies, the boss and corrupted objectives within `radius`
fn area_damage(
    state: &mut CombatState,
    tuning: &CombatTuning,
    center: Vec3,
    radius: f32,
    amount: f32,
    boss_amount: f32,
    cause: KillCause,
) {
    apply_splash(state, tuning, center, radius, amount, None, cause);

    let boss_reach = radius + tuning.boss.body_radius;
    if state
        .boss
        .as_ref()
        .is_some_and(|b| b.alive && b.position.distance_squared(center) < boss_reach * boss_reach)
    {
        damage_boss(state, tuning, boss_amount, BossHitRegion::Body);
    }

    let objective_reach = radius + tuning.objectives.hit_radius;
    let objectives: Vec<usize> = state
        .objectives
        .iter()
        .enumerate()
        .filter(|(_, o)| {
            o.is_hostile() && o.position.distance_squared(center) < objective_reach * objective_reach
        })
        .map(|(i, _)| i)
        .collect();
    for i in objectives {
        damage_objective(state, tuning, i, amount, DamageSource::Player);
    }
}

/// First volume a player projectile at `position` touches
fn player_projectile_contact(
    state: &CombatState,
    tuning: &CombatTuning,
    position: Vec3,
    boss_only: bool,
) -> Option<HitTarget> {
    if !boss_only {
        if let Some(i) = state
            .enemies
            .iter()
            .position(|e| e.alive && e.position.distance_squared(position) < e.hit_radius * e.hit_radius)
        {
            return Some(HitTarget::Enemy(i));
        }
    }

    if let Some(boss) = state.boss.as_ref().filter(|b| b.alive) {
        let part_r = tuning.boss.part_radius;
        let part = (0..boss.parts.len()).find(|&i| {
            boss.part_position(i)
                .is_some_and(|p| p.distance_squared(position) < part_r * part_r)
        });
        if let Some(i) = part {
            return Some(HitTarget::Boss(BossHitRegion::Part(i)));
        }
        let body_r = tuning.boss.body_radius;
        if boss.position.distance_squared(position) < body_r * body_r {
            return Some(HitTarget::Boss(BossHitRegion::Body));
        }
    }

    if boss_only {
        return None;
    }
    let objective_r = tuning.objectives.hit_radius;
    state
        .objectives
        .iter()
        .position(|o| {
            o.is_hostile() && o.position.distance_squared(position) < objective_r * objective_r
        })
        .map(HitTarget::Objective)
}

/// Advance a player projectile. Returns whether it survives the tick.
fn step_player_projectile(
    state: &mut CombatState,
    tuning: &CombatTuning,
    projectile: &Projectile,
    dt: f32,
) -> bool {
    if let Some(aura) = projectile.aura {
        apply_aura(state, tuning, projectile.position, aura, dt);
    }

    // Area orbs drift through enemies and only stop on the boss
    let contact =
        player_projectile_contact(state, tuning, projectile.position, projectile.aura.is_some());
    if let Some(target) = contact {
        apply_hit(state, tuning, target, projectile.damage, KillCause::Projectile);
        if let Some(blast) = projectile.blast {
            apply_blast(state, tuning, projectile.position, blast);
        }
        return false;
    }

    let culled = !state.arena.inflate(CULL_MARGIN).contains(projectile.position);
    if projectile.expired() || projectile.position.y < FLOOR_Y || culled {
        if let Some(blast) = projectile.blast {
            apply_blast(state, tuning, projectile.position, blast);
        }
        return false;
    }
    true
}

/// Advance a hostile projectile. Returns whether it survives the tick.
fn step_hostile_projectile(
    state: &mut CombatState,
    tuning: &CombatTuning,
    projectile: &Projectile,
) -> bool {
    let player_r = tuning.player.hit_radius;
    if projectile
        .position
        .distance_squared(state.player.pose.position)
        < player_r * player_r
    {
        state.damage_player(projectile.damage);
        return false;
    }

    let owner = match projectile.owner {
        ProjectileOwner::ObjectiveTurret(id) => Some(id),
        _ => None,
    };
    let objective_r = tuning.objectives.hit_radius;
    let struck = state.objectives.iter().position(|o| {
        o.is_alive()
            && Some(o.id) != owner
            && o.position.distance_squared(projectile.position) < objective_r * objective_r
    });
    if let Some(index) = struck {
        damage_objective(state, tuning, index, projectile.damage, DamageSource::Hostile);
        return false;
    }

    let culled = !state.arena.inflate(CULL_MARGIN).contains(projectile.position);
    !(projectile.expired() || projectile.position.y < FLOOR_Y || culled)
}

/// Advance every projectile one tick and resolve contacts.
///
/// Non-finite projectiles are passed through untouched so the end-of-tick
/// sanitize pass can report and drop them.
pub fn step_projectiles(state: &mut CombatState, tuning: &CombatTuning, dt: f32) {
    let in_flight = std::mem::take(&mut state.projectiles);
    let mut survivors = Vec::with_capacity(in_flight.len());

    for mut projectile in in_flight {
        if !projectile.is_finite() {
            survivors.push(projectile);
            continue;
        }
        projectile.advance(dt);
        let keep = if projectile.owner.is_hostile() {
            step_hostile_projectile(state, tuning, &projectile)
        } else {
            step_player_projectile(state, tuning, &projectile, dt)
        };
        if keep {
            survivors.push(projectile);
        }
    }

    // Anything spawned while resolving hits joins the survivors
    survivors.append(&mut state.projectiles);
    state.projectiles = survivors;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boss::Boss;
    use crate::sim::enemy::{Enemy, EnemyRole, EnemyType, Target};
    use crate::sim::objective::ObjectiveSpec;
    use crate::sim::projectile::DeliveryMode;
    use crate::sim::state::SessionPhase;
    use crate::sim::weapons::standard_catalog;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (CombatState, CombatTuning) {
        let mut tuning = CombatTuning::default();
        // Deterministic loot: nothing drops unless a test asks for it
        tuning.pickups.drop_chance = 0.0;
        let mut state = CombatState::new(1, &tuning);
        state.phase = SessionPhase::Playing;
        state.install_objectives(
            &[ObjectiveSpec::new("ALPHA", Vec3::new(0.0, 0.0, -200.0))],
            &tuning,
        );
        (state, tuning)
    }

    fn add_enemy(state: &mut CombatState, tuning: &CombatTuning, position: Vec3) -> usize {
        let id = state.next_entity_id();
        state.enemies.push(Enemy::spawn(
            id,
            EnemyType::Normal,
            EnemyRole::Hunter,
            Target::Player,
            position,
            &tuning.enemies,
            1,
        ));
        state.enemies.len() - 1
    }

    #[test]
    fn test_ray_sphere() {
        let t = ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -10.0), 2.0);
        assert_eq!(t, Some(8.0));
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, -10.0), 2.0), None);
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 0.0, -10.0), 2.0), None);
        // Inside the sphere
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::X, Vec3::ZERO, 2.0), Some(0.0));
    }

    #[test]
    fn test_spread_stays_in_cone() {
        let mut rng = Pcg32::seed_from_u64(3);
        let cone = 0.12f32;
        for _ in 0..500 {
            let dir = spread_direction(Vec3::NEG_Z, cone, &mut rng);
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert!(dir.angle_between(Vec3::NEG_Z) <= cone + 1e-4);
        }
    }

    #[test]
    fn test_cast_ray_picks_nearest() {
        let (mut state, tuning) = setup();
        let far = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -60.0));
        let near = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -30.0));
        let hit = cast_ray(&state, &tuning, Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Z, 500.0);
        assert_eq!(hit.target, Some(HitTarget::Enemy(near)));
        assert_ne!(hit.target, Some(HitTarget::Enemy(far)));
    }

    #[test]
    fn test_miss_still_has_terminal_point() {
        let (state, tuning) = setup();
        let hit = cast_ray(&state, &tuning, Vec3::ZERO, Vec3::X, 100.0);
        assert!(!hit.is_hit());
        assert_eq!(hit.point, Vec3::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn test_max_range_bounds_ray() {
        let (mut state, tuning) = setup();
        add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -150.0));
        let hit = cast_ray(&state, &tuning, Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Z, 100.0);
        assert!(!hit.is_hit());
    }

    #[test]
    fn test_healthy_objective_does_not_block_ray() {
        let (mut state, tuning) = setup();
        let behind = add_enemy(&mut state, &tuning, Vec3::new(0.0, 0.0, -230.0));
        let hit = cast_ray(&state, &tuning, Vec3::ZERO, Vec3::NEG_Z, 500.0);
        assert_eq!(hit.target, Some(HitTarget::Enemy(behind)));

        state.objectives[0].apply_damage(500.0, DamageSource::Hostile, &tuning.objectives);
        let hit = cast_ray(&state, &tuning, Vec3::ZERO, Vec3::NEG_Z, 500.0);
        assert_eq!(hit.target, Some(HitTarget::Objective(0)));
    }

    #[test]
    fn test_shotgun_splash_radius() {
        let (mut state, tuning) = setup();
        let shotgun = standard_catalog()[1].clone();
        let primary = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -30.0));
        let inside = add_enemy(&mut state, &tuning, Vec3::new(60.0, 2.0, 60.0));
        let outside = add_enemy(&mut state, &tuning, Vec3::new(12.0, 2.0, -30.0));

        // Beside the impact point, clear of the ray itself
        let hit = cast_ray(&state, &tuning, Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Z, 100.0);
        assert_eq!(hit.target, Some(HitTarget::Enemy(primary)));
        state.enemies[inside].position = hit.point + Vec3::new(5.5, 0.0, -1.5);

        assert!(resolve_hitscan(
            &mut state,
            &tuning,
            &shotgun,
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::NEG_Z
        ));
        assert_eq!(state.enemies[primary].health, 10.0 - 2.5);
        assert_eq!(state.enemies[inside].health, 10.0 - 1.25);
        assert_eq!(state.enemies[outside].health, 10.0);
    }

    #[test]
    fn test_kill_scores_once() {
        let (mut state, tuning) = setup();
        let i = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -30.0));
        assert_eq!(
            damage_enemy(&mut state, &tuning, i, 4.0, KillCause::Hitscan),
            DamageOutcome::Wounded
        );
        assert_eq!(
            damage_enemy(&mut state, &tuning, i, 4.0, KillCause::Hitscan),
            DamageOutcome::Wounded
        );
        assert_eq!(
            damage_enemy(&mut state, &tuning, i, 4.0, KillCause::Hitscan),
            DamageOutcome::Killed
        );
        assert_eq!(
            damage_enemy(&mut state, &tuning, i, 4.0, KillCause::Hitscan),
            DamageOutcome::Ignored
        );
        let kills = state
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);
        assert_eq!(state.score, 100);
    }

    #[test]
    fn test_loot_drops_on_kill() {
        let (mut state, mut tuning) = setup();
        tuning.pickups.drop_chance = 1.0;
        let i = add_enemy(&mut state, &tuning, Vec3::new(5.0, 4.0, -30.0));
        damage_enemy(&mut state, &tuning, i, 50.0, KillCause::Hitscan);
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].position, Vec3::new(5.0, 2.0, -30.0));
    }

    #[test]
    fn test_contact_death_drops_loot_without_score() {
        let (mut state, mut tuning) = setup();
        tuning.pickups.drop_chance = 1.0;
        let i = add_enemy(&mut state, &tuning, Vec3::new(-8.0, 4.0, -40.0));
        remove_by_contact(&mut state, &tuning, i);
        assert!(!state.enemies[i].alive);
        assert_eq!(state.score, 0);
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].position, Vec3::new(-8.0, 2.0, -40.0));
        assert!(state.events.iter().any(|e| matches!(
            e,
            CombatEvent::EnemyKilled {
                cause: KillCause::Contact,
                score: 0,
                ..
            }
        )));

        // A second call finds the enemy already dead
        remove_by_contact(&mut state, &tuning, i);
        assert_eq!(state.pickups.len(), 1);
    }

    #[test]
    fn test_boss_weak_point_via_ray() {
        let (mut state, tuning) = setup();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut boss = Boss::spawn(Vec3::ZERO, &tuning.boss, &mut rng);
        boss.position = Vec3::new(0.0, 0.0, -100.0);
        boss.parts = vec![Vec3::new(0.0, 0.0, 40.0), Vec3::new(0.0, 50.0, 0.0)];
        boss.weak_points = vec![0];
        state.boss = Some(boss);

        // Straight down -Z: part 0 sits in front of the body
        let hit = cast_ray(&state, &tuning, Vec3::ZERO, Vec3::NEG_Z, 500.0);
        assert_eq!(hit.target, Some(HitTarget::Boss(BossHitRegion::Part(0))));
        let result = damage_boss(&mut state, &tuning, 10.0, BossHitRegion::Part(0));
        assert_eq!(result.applied, 50.0);
        assert!(result.critical);

        // Part 1 is not weak
        let result = damage_boss(&mut state, &tuning, 10.0, BossHitRegion::Part(1));
        assert_eq!(result.applied, 10.0);
        assert!(!result.critical);
    }

    #[test]
    fn test_hostile_damage_corrupts_and_releases_enemies() {
        let (mut state, tuning) = setup();
        let i = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -190.0));
        state.enemies[i].target = Target::Objective(1);

        let t = damage_objective(&mut state, &tuning, 0, 150.0, DamageSource::Hostile);
        assert_eq!(t, ObjectiveTransition::Corrupted);
        assert_eq!(state.enemies[i].target, Target::Player);
        assert!(state.events.iter().any(|e| matches!(
            e,
            CombatEvent::ObjectiveAlert {
                kind: AlertKind::Corrupted,
                ..
            }
        )));

        let t = damage_objective(&mut state, &tuning, 0, 60.0, DamageSource::Player);
        assert_eq!(t, ObjectiveTransition::Destroyed);
        assert_eq!(state.score, 500);
    }

    #[test]
    fn test_under_attack_alert_is_throttled_and_swarms() {
        let (mut state, tuning) = setup();
        let near = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -120.0));
        let far = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, 100.0));

        damage_objective(&mut state, &tuning, 0, 1.0, DamageSource::Hostile);
        damage_objective(&mut state, &tuning, 0, 1.0, DamageSource::Hostile);
        let alerts = state
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::ObjectiveAlert { .. }))
            .count();
        assert_eq!(alerts, 1);
        assert_eq!(state.enemies[near].target, Target::Objective(1));
        assert_eq!(state.enemies[near].role, EnemyRole::Destroyer);
        assert_eq!(state.enemies[far].target, Target::Player);

        state.clock += 2.0;
        damage_objective(&mut state, &tuning, 0, 1.0, DamageSource::Hostile);
        let alerts = state
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::ObjectiveAlert { .. }))
            .count();
        assert_eq!(alerts, 2);
    }

    #[test]
    fn test_rocket_detonates_on_impact() {
        let (mut state, tuning) = setup();
        let launcher = &standard_catalog()[2];
        let target = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -10.0));
        let bystander = add_enemy(&mut state, &tuning, Vec3::new(20.0, 2.0, -10.0));
        let distant = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -150.0));

        let id = state.next_entity_id();
        state.projectiles.push(
            Projectile::launch(
                id,
                ProjectileOwner::Player,
                Vec3::new(0.0, 2.0, -5.0),
                Vec3::NEG_Z,
                launcher.projectile_speed,
                launcher.projectile_lifetime,
                launcher.damage,
                DeliveryMode::AreaOnImpact,
            )
            .with_blast(launcher.blast),
        );
        step_projectiles(&mut state, &tuning, 1.0 / 60.0);

        assert!(state.projectiles.is_empty());
        assert!(!state.enemies[target].alive);
        assert!(!state.enemies[bystander].alive);
        assert!(state.enemies[distant].alive);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, CombatEvent::Explosion { radius, .. } if *radius == 40.0))
        );
    }

    #[test]
    fn test_orb_passes_through_enemies_with_aura() {
        let (mut state, tuning) = setup();
        let bfg = &standard_catalog()[4];
        let tank_like = add_enemy(&mut state, &tuning, Vec3::new(0.0, 2.0, -10.0));
        state.enemies[tank_like].health = 1000.0;
        state.enemies[tank_like].max_health = 1000.0;

        let id = state.next_entity_id();
        state.projectiles.push(
            Projectile::launch(
                id,
                ProjectileOwner::Player,
                Vec3::new(0.0, 2.0, -10.0),
                Vec3::NEG_Z,
                bfg.projectile_speed,
                bfg.projectile_lifetime,
                bfg.damage,
                DeliveryMode::AreaOnImpact,
            )
            .with_blast(bfg.blast)
            .with_aura(bfg.aura),
        );
        step_projectiles(&mut state, &tuning, 0.1);

        assert_eq!(state.projectiles.len(), 1);
        assert!((state.enemies[tank_like].health - 980.0).abs() < 1e-3);
    }

    #[test]
    fn test_hostile_shot_hits_player() {
        let (mut state, tuning) = setup();
        let id = state.next_entity_id();
        let shot = tuning.enemies.roster.imp.ranged.map(|r| r.shot).unwrap_or_default();
        state.projectiles.push(Projectile::hostile(
            id,
            ProjectileOwner::Enemy(EnemyType::Imp),
            Vec3::new(0.0, 2.0, -2.5),
            Vec3::Z,
            &shot,
        ));
        step_projectiles(&mut state, &tuning, 1.0 / 60.0);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.player.health, 85.0);
    }

    #[test]
    fn test_turret_shot_ignores_its_owner() {
        let (mut state, tuning) = setup();
        state.objectives[0].apply_damage(500.0, DamageSource::Hostile, &tuning.objectives);
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::hostile(
            id,
            ProjectileOwner::ObjectiveTurret(1),
            Vec3::new(0.0, 2.0, -195.0),
            Vec3::Z,
            &tuning.objectives.turret_shot,
        ));
        step_projectiles(&mut state, &tuning, 1.0 / 60.0);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.objectives[0].health, 50.0);
    }

    #[test]
    fn test_projectiles_culled_outside_arena() {
        let (mut state, tuning) = setup();
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::launch(
            id,
            ProjectileOwner::Player,
            Vec3::new(200.0, 2.0, 0.0),
            Vec3::X,
            300.0,
            5.0,
            6.0,
            DeliveryMode::Ballistic,
        ));
        step_projectiles(&mut state, &tuning, 1.0 / 60.0);
        assert!(state.projectiles.is_empty());
    }
}
