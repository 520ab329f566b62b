//! Wave director
//!
//! Drives `Idle -> Spawning -> Draining -> Complete` for each wave, then the
//! boss encounter and the victory countdown. The director never touches
//! entities itself; it returns `DirectorCommand`s that the tick executes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{EnemyRole, EnemyType};

/// Wave-gated archetype roll. Rules are evaluated in order and the first
/// one whose own roll succeeds wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    /// First wave on which the rule applies
    pub min_wave: u32,
    pub chance: f32,
    pub kind: EnemyType,
}

impl SpawnRule {
    pub fn new(min_wave: u32, chance: f32, kind: EnemyType) -> Self {
        Self {
            min_wave,
            chance,
            kind,
        }
    }
}

/// Wave balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub base_budget: u32,
    pub budget_per_wave: u32,
    /// Live enemy cap, checked at spawn time
    pub max_concurrent: usize,
    /// Spawn interval: max(min, base - step * wave)
    pub spawn_interval_base: f32,
    pub spawn_interval_step: f32,
    pub spawn_interval_min: f32,
    /// Pause between a completed wave and the next one
    pub intermission: f32,
    /// Wave number that launches the boss instead of a normal wave
    pub boss_wave: u32,
    pub destroyer_chance: f32,
    pub spawn_rules: Vec<SpawnRule>,
    /// Preferred spawn distance band around the player
    pub spawn_min_distance: f32,
    pub spawn_max_distance: f32,
    pub spawn_attempts: u32,
    /// Boss fight minion trickle
    pub minion_interval: f32,
    pub minion_cap: usize,
    pub minion_budget: u32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_budget: 15,
            budget_per_wave: 8,
            max_concurrent: 30,
            spawn_interval_base: 2.0,
            spawn_interval_step: 0.35,
            spawn_interval_min: 0.2,
            intermission: 3.0,
            boss_wave: 5,
            destroyer_chance: 0.8,
            spawn_rules: vec![
                SpawnRule::new(2, 0.3, EnemyType::Imp),
                SpawnRule::new(3, 0.2, EnemyType::Wraith),
                SpawnRule::new(4, 0.15, EnemyType::Tank),
                SpawnRule::new(5, 0.1, EnemyType::Berzerker),
                SpawnRule::new(3, 0.1, EnemyType::Scout),
            ],
            spawn_min_distance: 30.0,
            spawn_max_distance: 80.0,
            spawn_attempts: 5,
            minion_interval: 3.0,
            minion_cap: 8,
            minion_budget: 50,
        }
    }
}

impl WaveTuning {
    pub fn budget_for(&self, wave: u32) -> u32 {
        self.base_budget
            .saturating_add(wave.saturating_mul(self.budget_per_wave))
    }

    pub fn spawn_interval(&self, wave: u32) -> f32 {
        (self.spawn_interval_base - self.spawn_interval_step * wave as f32)
            .max(self.spawn_interval_min)
    }
}

/// Director state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavePhase {
    #[default]
    Idle,
    /// Budget left; spawning on an interval
    Spawning,
    /// Budget spent; waiting for the field to clear
    Draining,
    /// Wave cleared; intermission running
    Complete,
    BossFight,
    /// Boss down; victory countdown running
    BossDefeated,
    Finished,
}

/// Work requested from the session by one director update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectorCommand {
    Spawn {
        kind: EnemyType,
        role: EnemyRole,
        wave: u32,
    },
    WaveStarted(u32),
    WaveComplete(u32),
    StartBoss,
    Victory,
}

/// Roll an archetype for `wave`. Later rules take precedence over earlier ones.
pub fn roll_enemy_type<R: Rng>(rng: &mut R, wave: u32, rules: &[SpawnRule]) -> EnemyType {
    for rule in rules.iter().rev() {
        if wave >= rule.min_wave && rng.random::<f32>() < rule.chance {
            return rule.kind;
        }
    }
    EnemyType::Normal
}

pub fn roll_role<R: Rng>(rng: &mut R, destroyer_chance: f32) -> EnemyRole {
    if rng.random::<f32>() < destroyer_chance {
        EnemyRole::Destroyer
    } else {
        EnemyRole::Hunter
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveDirector {
    pub wave: u32,
    pub phase: WavePhase,
    /// Enemies left to spawn this wave
    pub budget: u32,
    /// Enemies spawned this wave
    pub spawned: u32,
    pub spawn_timer: f32,
    /// Intermission or victory countdown
    pub countdown: f32,
    pub minion_budget: u32,
}

impl WaveDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn in_boss_fight(&self) -> bool {
        self.phase == WavePhase::BossFight
    }

    /// Begin wave `wave` (clamped to at least 1). Reaching the boss wave
    /// starts the boss encounter instead.
    pub fn start_wave(&mut self, wave: u32, tuning: &WaveTuning) -> DirectorCommand {
        let wave = wave.max(1);
        self.wave = wave;
        self.spawned = 0;
        self.spawn_timer = 0.0;
        self.countdown = 0.0;

        if wave >= tuning.boss_wave {
            self.begin_boss(tuning);
            return DirectorCommand::StartBoss;
        }

        self.budget = tuning.budget_for(wave);
        self.phase = WavePhase::Spawning;
        log::info!("Wave {} started (budget {})", wave, self.budget);
        DirectorCommand::WaveStarted(wave)
    }

    fn begin_boss(&mut self, tuning: &WaveTuning) {
        self.wave = self.wave.max(tuning.boss_wave);
        self.budget = 0;
        self.minion_budget = tuning.minion_budget;
        self.phase = WavePhase::BossFight;
        log::info!("Boss encounter started");
    }

    /// Called by the session when the boss dies
    pub fn boss_defeated(&mut self, victory_delay: f32) {
        if self.phase == WavePhase::BossFight {
            self.phase = WavePhase::BossDefeated;
            self.countdown = victory_delay;
        }
    }

    /// Advance timers. `live_enemies` is the current live count and is used
    /// for the concurrent cap at the moment of each spawn.
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        live_enemies: usize,
        tuning: &WaveTuning,
        rng: &mut R,
    ) -> Vec<DirectorCommand> {
        let mut commands = Vec::new();

        match self.phase {
            WavePhase::Idle | WavePhase::Finished => {}
            WavePhase::Spawning => {
                self.spawn_timer += dt;
                if self.spawn_timer >= tuning.spawn_interval(self.wave)
                    && self.budget > 0
                    && live_enemies < tuning.max_concurrent
                {
                    self.spawn_timer = 0.0;
                    self.budget -= 1;
                    self.spawned += 1;
                    commands.push(self.roll_spawn(tuning, rng));
                }
                if self.budget == 0 {
                    self.phase = WavePhase::Draining;
                }
            }
            WavePhase::Draining => {
                if live_enemies == 0 {
                    self.phase = WavePhase::Complete;
                    self.countdown = tuning.intermission;
                    log::info!("Wave {} complete", self.wave);
                    commands.push(DirectorCommand::WaveComplete(self.wave));
                }
            }
            WavePhase::Complete => {
                self.countdown -= dt;
                if self.countdown <= 0.0 {
                    commands.push(self.start_wave(self.wave + 1, tuning));
                }
            }
            WavePhase::BossFight => {
                self.spawn_timer += dt;
                if self.spawn_timer >= tuning.minion_interval {
                    self.spawn_timer = 0.0;
                    if self.minion_budget > 0 && live_enemies < tuning.minion_cap {
                        self.minion_budget -= 1;
                        commands.push(self.roll_spawn(tuning, rng));
                    }
                }
            }
            WavePhase::BossDefeated => {
                self.countdown -= dt;
                if self.countdown <= 0.0 {
                    self.phase = WavePhase::Finished;
                    commands.push(DirectorCommand::Victory);
                }
            }
        }

        commands
    }

    fn roll_spawn<R: Rng>(&self, tuning: &WaveTuning, rng: &mut R) -> DirectorCommand {
        let kind = roll_enemy_type(rng, self.wave, &tuning.spawn_rules);
        let role = roll_role(rng, tuning.destroyer_chance);
        DirectorCommand::Spawn {
            kind,
            role,
            wave: self.wave,
        }
    }
}
