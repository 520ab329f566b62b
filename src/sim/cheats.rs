//! Classic keyboard cheat codes
//!
//! Keys are fed one at a time into a short rolling buffer; a code fires as
//! soon as the buffer ends with it.

use serde::{Deserialize, Serialize};

use super::events::CombatEvent;
use super::state::CombatState;

/// Keys kept in the rolling buffer
const BUFFER_LEN: usize = 10;

/// Seconds between typing the warp code and the boss arriving
pub const BOSS_WARP_DELAY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cheat {
    /// Toggle invulnerability and restore health
    GodMode,
    /// Refill every weapon
    FullAmmo,
    /// Jump to the boss encounter after a short delay
    WarpToBoss,
}

impl Cheat {
    pub const ALL: [Cheat; 3] = [Cheat::GodMode, Cheat::FullAmmo, Cheat::WarpToBoss];

    pub fn code(&self) -> &'static str {
        match self {
            Cheat::GodMode => "iddqd",
            Cheat::FullAmmo => "idkfa",
            Cheat::WarpToBoss => "idclev5",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheatBuffer {
    keys: String,
}

impl CheatBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one key press. Returns the cheat it completes, if any.
    pub fn push(&mut self, key: char) -> Option<Cheat> {
        self.keys.extend(key.to_lowercase());
        let excess = self.keys.chars().count().saturating_sub(BUFFER_LEN);
        if excess > 0 {
            self.keys = self.keys.chars().skip(excess).collect();
        }
        Cheat::ALL
            .into_iter()
            .find(|c| self.keys.ends_with(c.code()))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Apply a cheat to the running state
pub fn apply(state: &mut CombatState, cheat: Cheat) {
    match cheat {
        Cheat::GodMode => {
            state.player.god_mode = !state.player.god_mode;
            state.player.health = state.player.max_health;
            log::info!(
                "God mode {}",
                if state.player.god_mode { "on" } else { "off" }
            );
        }
        Cheat::FullAmmo => {
            state.loadout.refill_all();
            log::info!("Ammo refilled");
        }
        Cheat::WarpToBoss => {
            state.boss_warp_timer = Some(BOSS_WARP_DELAY);
            log::info!("Warping to boss");
        }
    }
    state.push_event(CombatEvent::CheatActivated {
        cheat,
        god_mode: state.player.god_mode,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::CombatTuning;

    fn type_all(buffer: &mut CheatBuffer, keys: &str) -> Vec<Cheat> {
        keys.chars().filter_map(|k| buffer.push(k)).collect()
    }

    #[test]
    fn test_codes_recognized_case_insensitively() {
        let mut buffer = CheatBuffer::new();
        assert_eq!(type_all(&mut buffer, "xxIDDQD"), vec![Cheat::GodMode]);
        assert_eq!(type_all(&mut buffer, "idkfa"), vec![Cheat::FullAmmo]);
        assert_eq!(type_all(&mut buffer, "idclev5"), vec![Cheat::WarpToBoss]);
    }

    #[test]
    fn test_buffer_is_bounded() {
        let mut buffer = CheatBuffer::new();
        type_all(&mut buffer, "abcdefghijklmnopqrstuvwxyz");
        assert_eq!(buffer.keys.chars().count(), BUFFER_LEN);
        assert_eq!(buffer.keys, "qrstuvwxyz");
    }

    #[test]
    fn test_partial_code_does_nothing() {
        let mut buffer = CheatBuffer::new();
        assert!(type_all(&mut buffer, "iddq").is_empty());
        buffer.clear();
        assert!(type_all(&mut buffer, "d").is_empty());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Cheat::from_code(" IDKFA "), Some(Cheat::FullAmmo));
        assert_eq!(Cheat::from_code("idspispopd"), None);
    }

    #[test]
    fn test_apply_god_mode_toggles_and_heals() {
        let tuning = CombatTuning::default();
        let mut state = CombatState::new(1, &tuning);
        state.player.health = 10.0;
        apply(&mut state, Cheat::GodMode);
        assert!(state.player.god_mode);
        assert_eq!(state.player.health, state.player.max_health);
        apply(&mut state, Cheat::GodMode);
        assert!(!state.player.god_mode);
    }

    #[test]
    fn test_apply_warp_arms_timer() {
        let tuning = CombatTuning::default();
        let mut state = CombatState::new(1, &tuning);
        apply(&mut state, Cheat::WarpToBoss);
        assert_eq!(state.boss_warp_timer, Some(BOSS_WARP_DELAY));
    }
}
