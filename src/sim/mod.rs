//! Deterministic simulation module
//!
//! All combat logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod arena;
pub mod boss;
pub mod cheats;
pub mod collision;
pub mod enemy;
pub mod events;
pub mod objective;
pub mod pickups;
pub mod projectile;
pub mod session;
pub mod state;
pub mod targeting;
pub mod tick;
pub mod wave;
pub mod weapons;

pub use arena::ArenaBounds;
pub use boss::{Boss, BossTuning};
pub use cheats::{Cheat, CheatBuffer};
pub use enemy::{Enemy, EnemyRole, EnemyType, Target};
pub use events::{AlertKind, CombatEvent, CombatListener, KillCause};
pub use objective::{Objective, ObjectiveId, ObjectivePhase, ObjectiveSpec};
pub use pickups::{Pickup, PickupKind};
pub use projectile::{DeliveryMode, Projectile, ProjectileOwner};
pub use session::{
    BossView, CombatSession, CombatSnapshot, EnemyView, ObjectiveView, PickupView,
    ProjectileView, WeaponView,
};
pub use state::{CombatState, EntityId, PlayerPose, SessionPhase, SimFault};
pub use tick::tick;
pub use wave::{WaveDirector, WavePhase};
pub use weapons::{FireResult, Loadout, WeaponArchetype, standard_catalog};
