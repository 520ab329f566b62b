//! Prismata Defense headless runner
//!
//! Plays a seeded combat session with a simple autopilot (turn toward the
//! closest threat, shoot with the best loaded weapon) and logs the event
//! stream. Useful for balance checks: `RUST_LOG=debug prismata-defense 42 300`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec3;

    use prismata_defense::consts::SIM_DT;
    use prismata_defense::sim::{
        AlertKind, CombatEvent, CombatListener, CombatSession, EnemyType, ObjectiveId,
        ObjectivePhase, ObjectiveSpec, PlayerPose, SessionPhase,
    };
    use prismata_defense::{CombatTuning, RelativeDirection};

    /// Logs the presentation-facing callbacks
    struct EventLog;

    impl CombatListener for EventLog {
        fn on_objective_alert(
            &mut self,
            _objective: ObjectiveId,
            name: &str,
            kind: AlertKind,
            direction: RelativeDirection,
        ) {
            log::info!("ALERT {} {:?} ({})", name, kind, direction.as_str());
        }

        fn on_enemy_killed(&mut self, id: u32, kind: EnemyType, score: u64) {
            log::debug!("killed {} {} (+{})", kind.as_str(), id, score);
        }

        fn on_objective_state_changed(&mut self, objective: ObjectiveId, phase: ObjectivePhase) {
            log::info!("objective {} is now {}", objective, phase.as_str());
        }

        fn on_wave_complete(&mut self, wave: u32) {
            log::info!("WAVE {} COMPLETE", wave);
        }

        fn on_game_over(&mut self, wave: u32, score: u64) {
            log::info!("GAME OVER on wave {} with {} points", wave, score);
        }

        fn on_victory(&mut self, score: u64) {
            log::info!("VICTORY with {} points", score);
        }

        fn on_event(&mut self, event: &CombatEvent) {
            if let CombatEvent::BossWeakPointsChanged { weak_points } = event {
                log::trace!("weak points {:?}", weak_points);
            }
        }
    }

    fn crystals() -> Vec<ObjectiveSpec> {
        vec![
            ObjectiveSpec::new("RESNET", Vec3::new(-40.0, 0.0, -80.0)),
            ObjectiveSpec::new("TRANSFORMER", Vec3::new(40.0, 0.0, -80.0)),
            ObjectiveSpec::new("UNET", Vec3::new(-40.0, 0.0, -180.0)),
            ObjectiveSpec::new("GAN", Vec3::new(40.0, 0.0, -180.0)),
        ]
    }

    /// Closest live threat: the boss body, an enemy, or a corrupted objective
    fn closest_threat(session: &CombatSession, eye: Vec3) -> Option<Vec3> {
        let boss = session.boss().map(|b| b.position);
        let enemies = session.enemies().into_iter().map(|e| e.position);
        let turrets = session
            .objectives()
            .into_iter()
            .filter(|o| o.phase == ObjectivePhase::Corrupted)
            .map(|o| o.position);
        boss.into_iter()
            .chain(enemies)
            .chain(turrets)
            .min_by(|a, b| a.distance_squared(eye).total_cmp(&b.distance_squared(eye)))
    }

    /// Highest slot that still has ammo
    fn best_weapon(session: &CombatSession) -> usize {
        session
            .weapons()
            .iter()
            .rev()
            .find(|w| w.ammo != 0)
            .map_or(0, |w| w.index)
    }

    pub fn run(seed: u64, seconds: f32) {
        let mut session = CombatSession::new(CombatTuning::default(), seed);
        session.add_listener(Box::new(EventLog));
        session.activate(&crystals(), None);

        let eye = Vec3::new(0.0, 2.0, 0.0);
        let steps = (seconds / SIM_DT).ceil() as u64;
        for _ in 0..steps {
            if let Some(target) = closest_threat(&session, eye) {
                session.set_player_pose(PlayerPose::new(eye, target - eye));
                let slot = best_weapon(&session);
                if session.current_weapon().map(|w| w.index) != Some(slot) {
                    session.switch_weapon(slot);
                }
                session.fire();
            }
            session.update(SIM_DT);
            session.drain_events();
            if session.phase() != SessionPhase::Playing {
                break;
            }
        }

        log::info!(
            "Finished: phase {:?}, wave {}, score {}, health {:.0}, faults {}",
            session.phase(),
            session.wave(),
            session.score(),
            session.player_health(),
            session.fault_count()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(180.0);
    log::info!("Prismata Defense (headless) seed {} for {}s", seed, seconds);
    headless::run(seed, seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `web::start`
}
