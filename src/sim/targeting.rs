//! Per-enemy targeting AI
//!
//! `think` is a pure function of one enemy and a read-only view of the
//! world. It never mutates anything, so every enemy can be evaluated
//! independently (the tick runs them in sequence, but a parallel map over
//! the enemy list would produce the same decisions). The returned
//! `EnemyDecision` is committed with `apply`, and any action it carries is
//! resolved afterwards by the tick, which owns damage and scoring.
//!
//! Resolution order for one enemy:
//! 1. Keep the assigned objective while it is still a valid enemy target.
//! 2. Otherwise destroyers switch to the nearest healthy objective; hunters
//!    (and destroyers with nothing left to attack) fall back to the player.
//! 3. Aggro override: the player within the aggro radius (destroyers use the
//!    much smaller self-defense radius) or a running retaliation timer
//!    sends the enemy after the player for this tick. Wraiths and
//!    berzerkers are immune.
//! 4. Move toward the resolved target.
//! 5. Contact, kamikaze or ranged fire depending on distance.

use glam::Vec3;

use super::enemy::{Enemy, EnemyRole, EnemyTuning, EnemyType, Target};
use super::objective::{Objective, ObjectiveId};
use super::projectile::ShotProfile;

/// Read-only world view for AI decisions
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub player: Vec3,
    pub objectives: &'a [Objective],
    pub tuning: &'a EnemyTuning,
}

impl AiContext<'_> {
    fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    /// Nearest objective enemies may still attack
    pub fn nearest_target_objective(&self, from: Vec3) -> Option<&Objective> {
        self.objectives
            .iter()
            .filter(|o| o.is_enemy_target())
            .min_by(|a, b| {
                a.position
                    .distance_squared(from)
                    .total_cmp(&b.position.distance_squared(from))
            })
    }
}

/// What an enemy does this tick besides moving
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    None,
    /// Reached the player: melee hit, costs the enemy its life
    StrikePlayer,
    /// Chewing on an objective (continuous damage)
    StrikeObjective(ObjectiveId),
    /// Berzerker detonation on its target
    Explode(Target),
    /// Ranged shot at the current destination
    Shoot {
        origin: Vec3,
        direction: Vec3,
        shot: ShotProfile,
    },
}

/// Outcome of one AI evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyDecision {
    /// Persistent assignment after re-resolution
    pub target: Target,
    /// Whether this tick's destination is the player
    pub engaged_player: bool,
    pub destination: Vec3,
    pub position: Vec3,
    pub facing: Vec3,
    pub retaliation_timer: f32,
    pub fire_timer: f32,
    pub action: EnemyAction,
    /// Assigned objective id that no longer exists in the table
    pub unknown_objective: Option<ObjectiveId>,
}

/// Re-resolve the persistent assignment (steps 1 and 2)
fn resolve_assignment(enemy: &Enemy, ctx: &AiContext) -> (Target, Option<ObjectiveId>) {
    let Target::Objective(id) = enemy.target else {
        // Destroyers chase the player only while no objective is left
        let target = match enemy.role {
            EnemyRole::Destroyer => ctx
                .nearest_target_objective(enemy.position)
                .map_or(Target::Player, |o| Target::Objective(o.id)),
            EnemyRole::Hunter => Target::Player,
        };
        return (target, None);
    };
    let current = ctx.objective(id);
    if current.is_some_and(|o| o.is_enemy_target()) {
        return (enemy.target, None);
    }
    let unknown = current.is_none().then_some(id);

    let fallback = match enemy.role {
        EnemyRole::Destroyer => ctx
            .nearest_target_objective(enemy.position)
            .map_or(Target::Player, |o| Target::Objective(o.id)),
        EnemyRole::Hunter => Target::Player,
    };
    (fallback, unknown)
}

/// Aggro override (step 3)
fn wants_player(enemy: &Enemy, retaliation_timer: f32, ctx: &AiContext) -> bool {
    if !enemy.kind.can_aggro() {
        return false;
    }
    if retaliation_timer > 0.0 {
        return true;
    }
    let radius = match enemy.role {
        EnemyRole::Hunter => enemy.aggro_radius,
        EnemyRole::Destroyer => ctx.tuning.self_defense_radius,
    };
    enemy.position.distance_squared(ctx.player) < radius * radius
}

/// Evaluate one enemy
pub fn think(enemy: &Enemy, ctx: &AiContext, dt: f32) -> EnemyDecision {
    let retaliation_timer = (enemy.retaliation_timer - dt).max(0.0);
    let (target, unknown_objective) = resolve_assignment(enemy, ctx);

    let objective_destination = target
        .objective()
        .and_then(|id| ctx.objective(id))
        .map(|o| (o.id, o.position));

    let engaged_player =
        objective_destination.is_none() || wants_player(enemy, retaliation_timer, ctx);
    let destination = match objective_destination {
        Some((_, position)) if !engaged_player => position,
        _ => ctx.player,
    };

    // Move, never overshooting the destination
    let to_target = destination - enemy.position;
    let distance = to_target.length();
    let direction = to_target.normalize_or_zero();
    let step = (enemy.speed * dt).min(distance);
    let position = enemy.position + direction * step;
    let facing = if direction == Vec3::ZERO {
        enemy.facing
    } else {
        direction
    };

    let mut fire_timer = enemy.fire_timer + dt;
    let dist_sq = position.distance_squared(destination);
    let contact = ctx.tuning.contact_radius;

    let action = if dist_sq < contact * contact {
        let kamikaze = enemy.kind == EnemyType::Berzerker;
        match objective_destination.filter(|_| !engaged_player) {
            None if kamikaze => EnemyAction::Explode(Target::Player),
            None => EnemyAction::StrikePlayer,
            Some((id, _)) if kamikaze => EnemyAction::Explode(Target::Objective(id)),
            Some((id, _)) => EnemyAction::StrikeObjective(id),
        }
    } else {
        match enemy.ranged {
            Some(ranged) => {
                let min = ctx.tuning.min_fire_range;
                let in_band = dist_sq >= min * min && dist_sq <= ranged.range * ranged.range;
                if in_band && fire_timer >= ranged.cooldown {
                    fire_timer = 0.0;
                    EnemyAction::Shoot {
                        origin: position,
                        direction: (destination - position).normalize_or_zero(),
                        shot: ranged.shot,
                    }
                } else {
                    EnemyAction::None
                }
            }
            None => EnemyAction::None,
        }
    };

    EnemyDecision {
        target,
        engaged_player,
        destination,
        position,
        facing,
        retaliation_timer,
        fire_timer,
        action,
        unknown_objective,
    }
}

/// Commit a decision's state changes to the enemy
pub fn apply(enemy: &mut Enemy, decision: &EnemyDecision) {
    enemy.target = decision.target;
    enemy.engaged_player = decision.engaged_player;
    enemy.position = decision.position;
    enemy.facing = decision.facing;
    enemy.retaliation_timer = decision.retaliation_timer;
    enemy.fire_timer = decision.fire_timer;
}

/// Pull nearby enemies onto an objective that is under attack.
/// Returns how many enemies were redirected.
pub fn swarm_objective(enemies: &mut [Enemy], objective: &Objective, radius: f32) -> usize {
    if !objective.is_enemy_target() {
        return 0;
    }
    let radius_sq = radius * radius;
    let mut redirected = 0;
    for enemy in enemies
        .iter_mut()
        .filter(|e| e.alive && e.position.distance_squared(objective.position) < radius_sq)
    {
        enemy.target = Target::Objective(objective.id);
        enemy.role = EnemyRole::Destroyer;
        enemy.retaliation_timer = 0.0;
        redirected += 1;
    }
    redirected
}

/// Send every enemy assigned to `objective` after the player instead
pub fn release_objective(enemies: &mut [Enemy], objective: ObjectiveId) {
    for enemy in enemies
        .iter_mut()
        .filter(|e| e.target == Target::Objective(objective))
    {
        enemy.target = Target::Player;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::objective::{DamageSource, ObjectivePhase, ObjectiveSpec, ObjectiveTuning};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn objectives() -> Vec<Objective> {
        let tuning = ObjectiveTuning::default();
        vec![
            Objective::new(1, &ObjectiveSpec::new("A", Vec3::new(0.0, 0.0, -200.0)), &tuning),
            Objective::new(2, &ObjectiveSpec::new("B", Vec3::new(60.0, 0.0, -120.0)), &tuning),
        ]
    }

    fn enemy(kind: EnemyType, role: EnemyRole, target: Target, position: Vec3) -> Enemy {
        Enemy::spawn(7, kind, role, target, position, &EnemyTuning::default(), 1)
    }

    fn corrupt(objective: &mut Objective) {
        objective.apply_damage(1000.0, DamageSource::Hostile, &ObjectiveTuning::default());
        assert_eq!(objective.phase, ObjectivePhase::Corrupted);
    }

    #[test]
    fn test_keeps_healthy_objective() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 400.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let e = enemy(EnemyType::Normal, EnemyRole::Destroyer, Target::Objective(1), Vec3::ZERO);
        let d = think(&e, &ctx, DT);
        assert_eq!(d.target, Target::Objective(1));
        assert!(!d.engaged_player);
        assert_eq!(d.destination, objs[0].position);
        assert!(d.position.z < 0.0);
    }

    #[test]
    fn test_destroyer_reassigned_to_nearest_living() {
        let mut objs = objectives();
        corrupt(&mut objs[0]);
        objs[0].apply_damage(1000.0, DamageSource::Player, &ObjectiveTuning::default());
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 400.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let e = enemy(
            EnemyType::Normal,
            EnemyRole::Destroyer,
            Target::Objective(1),
            Vec3::new(0.0, 4.0, -190.0),
        );
        let d = think(&e, &ctx, DT);
        assert_eq!(d.target, Target::Objective(2));
        assert_eq!(d.unknown_objective, None);
    }

    #[test]
    fn test_destroyer_falls_back_to_player_when_nothing_left() {
        let mut objs = objectives();
        for o in &mut objs {
            corrupt(o);
        }
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 400.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let e = enemy(EnemyType::Normal, EnemyRole::Destroyer, Target::Objective(1), Vec3::ZERO);
        let d = think(&e, &ctx, DT);
        assert_eq!(d.target, Target::Player);
        assert!(d.engaged_player);
    }

    #[test]
    fn test_released_destroyer_returns_to_living_objective() {
        let mut objs = objectives();
        corrupt(&mut objs[0]);
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 400.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let e = enemy(EnemyType::Normal, EnemyRole::Destroyer, Target::Player, Vec3::ZERO);
        let d = think(&e, &ctx, DT);
        assert_eq!(d.target, Target::Objective(2));
        assert!(!d.engaged_player);

        // Hunters keep the player
        let e = enemy(EnemyType::Normal, EnemyRole::Hunter, Target::Player, Vec3::ZERO);
        assert_eq!(think(&e, &ctx, DT).target, Target::Player);
    }

    #[test]
    fn test_unknown_objective_reported_and_resolved() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 400.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let e = enemy(EnemyType::Normal, EnemyRole::Destroyer, Target::Objective(99), Vec3::ZERO);
        let d = think(&e, &ctx, DT);
        assert_eq!(d.unknown_objective, Some(99));
        assert!(matches!(d.target, Target::Objective(1 | 2)));
    }

    #[test]
    fn test_hunter_aggro_radius() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let near = enemy(
            EnemyType::Normal,
            EnemyRole::Hunter,
            Target::Objective(1),
            Vec3::new(0.0, 4.0, -100.0),
        );
        let d = think(&near, &ctx, DT);
        assert!(d.engaged_player);
        assert_eq!(d.destination, ctx.player);
        // The assignment survives the override
        assert_eq!(d.target, Target::Objective(1));

        let far = enemy(
            EnemyType::Normal,
            EnemyRole::Hunter,
            Target::Objective(1),
            Vec3::new(0.0, 4.0, -150.0),
        );
        assert!(!think(&far, &ctx, DT).engaged_player);
    }

    #[test]
    fn test_destroyer_uses_self_defense_radius() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let mid = enemy(
            EnemyType::Normal,
            EnemyRole::Destroyer,
            Target::Objective(1),
            Vec3::new(0.0, 2.0, -50.0),
        );
        assert!(!think(&mid, &ctx, DT).engaged_player);

        let close = enemy(
            EnemyType::Normal,
            EnemyRole::Destroyer,
            Target::Objective(1),
            Vec3::new(0.0, 2.0, -8.0),
        );
        assert!(think(&close, &ctx, DT).engaged_player);
    }

    #[test]
    fn test_retaliation_overrides_role() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let mut e = enemy(
            EnemyType::Normal,
            EnemyRole::Destroyer,
            Target::Objective(1),
            Vec3::new(0.0, 2.0, -100.0),
        );
        e.take_damage(1.0, 4.0);
        let d = think(&e, &ctx, DT);
        assert!(d.engaged_player);
        assert!((d.retaliation_timer - (4.0 - DT)).abs() < 1e-5);

        e.retaliation_timer = 0.0;
        assert!(!think(&e, &ctx, DT).engaged_player);
    }

    #[test]
    fn test_wraith_and_berzerker_ignore_player() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };
        for kind in [EnemyType::Wraith, EnemyType::Berzerker] {
            let mut e = enemy(kind, EnemyRole::Hunter, Target::Objective(1), Vec3::new(0.0, 2.0, -20.0));
            e.retaliation_timer = 3.0;
            assert!(!think(&e, &ctx, DT).engaged_player, "{}", kind.as_str());
        }
    }

    #[test]
    fn test_contact_outcomes() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };

        let melee = enemy(EnemyType::Normal, EnemyRole::Hunter, Target::Player, Vec3::new(0.0, 2.0, -5.0));
        assert_eq!(think(&melee, &ctx, DT).action, EnemyAction::StrikePlayer);

        let kamikaze = enemy(
            EnemyType::Berzerker,
            EnemyRole::Destroyer,
            Target::Objective(1),
            Vec3::new(0.0, 0.0, -195.0),
        );
        assert_eq!(
            think(&kamikaze, &ctx, DT).action,
            EnemyAction::Explode(Target::Objective(1))
        );

        let chewer = enemy(
            EnemyType::Wraith,
            EnemyRole::Destroyer,
            Target::Objective(1),
            Vec3::new(0.0, 0.0, -195.0),
        );
        assert_eq!(think(&chewer, &ctx, DT).action, EnemyAction::StrikeObjective(1));
    }

    #[test]
    fn test_ranged_fire_respects_band_and_cooldown() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let mut imp = enemy(EnemyType::Imp, EnemyRole::Hunter, Target::Player, Vec3::new(0.0, 2.0, -60.0));

        let d = think(&imp, &ctx, DT);
        assert_eq!(d.action, EnemyAction::None);

        imp.fire_timer = 2.0;
        let d = think(&imp, &ctx, DT);
        match d.action {
            EnemyAction::Shoot { direction, shot, .. } => {
                assert!(direction.z > 0.99);
                assert_eq!(shot.damage, 15.0);
            }
            other => panic!("expected a shot, got {other:?}"),
        }
        assert_eq!(d.fire_timer, 0.0);

        // Out of range: timer keeps charging, no shot
        imp.position = Vec3::new(0.0, 2.0, -115.0);
        let d = think(&imp, &ctx, DT);
        assert_eq!(d.action, EnemyAction::None);
        assert!(d.fire_timer > 2.0);
    }

    #[test]
    fn test_zero_length_direction_does_not_move() {
        let objs = objectives();
        let tuning = EnemyTuning::default();
        let ctx = AiContext {
            player: Vec3::new(0.0, 2.0, 0.0),
            objectives: &objs,
            tuning: &tuning,
        };
        let e = enemy(EnemyType::Normal, EnemyRole::Hunter, Target::Player, Vec3::new(0.0, 2.0, 0.0));
        let d = think(&e, &ctx, DT);
        assert_eq!(d.position, e.position);
        assert_eq!(d.facing, e.facing);
        assert!(d.position.is_finite());
    }

    #[test]
    fn test_swarm_and_release() {
        let objs = objectives();
        let mut enemies = vec![
            enemy(EnemyType::Normal, EnemyRole::Hunter, Target::Player, Vec3::new(0.0, 2.0, -150.0)),
            enemy(EnemyType::Normal, EnemyRole::Hunter, Target::Player, Vec3::new(0.0, 2.0, 200.0)),
        ];
        enemies[0].retaliation_timer = 2.0;
        assert_eq!(swarm_objective(&mut enemies, &objs[0], 150.0), 1);
        assert_eq!(enemies[0].target, Target::Objective(1));
        assert_eq!(enemies[0].role, EnemyRole::Destroyer);
        assert_eq!(enemies[0].retaliation_timer, 0.0);
        assert_eq!(enemies[1].target, Target::Player);

        release_objective(&mut enemies, 1);
        assert_eq!(enemies[0].target, Target::Player);
    }

    proptest! {
        #[test]
        fn prop_destroyer_never_keeps_dead_target(
            destroyed in proptest::collection::vec(any::<bool>(), 2),
            x in -70.0f32..70.0,
            z in -240.0f32..20.0,
        ) {
            let mut objs = objectives();
            for (o, kill) in objs.iter_mut().zip(destroyed) {
                if kill {
                    corrupt(o);
                    o.apply_damage(1000.0, DamageSource::Player, &ObjectiveTuning::default());
                }
            }
            let tuning = EnemyTuning::default();
            let ctx = AiContext {
                player: Vec3::new(0.0, 2.0, 300.0),
                objectives: &objs,
                tuning: &tuning,
            };
            let e = enemy(EnemyType::Normal, EnemyRole::Destroyer, Target::Objective(1), Vec3::new(x, 4.0, z));
            let d = think(&e, &ctx, DT);
            match d.target {
                Target::Objective(id) => {
                    let o = objs.iter().find(|o| o.id == id);
                    prop_assert!(o.is_some_and(|o| o.is_enemy_target()));
                }
                Target::Player => {
                    prop_assert!(objs.iter().all(|o| !o.is_enemy_target()));
                }
            }
        }
    }
}
