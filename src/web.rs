//! Browser bridge for the gallery presentation layer
//!
//! Exposes `CombatSession` to JavaScript. Structured data crosses the
//! boundary as JSON strings; events can be pulled with `drain_events` or
//! pushed to a JS callback registered with `set_listener`.

use wasm_bindgen::prelude::*;

use crate::sim::{
    ArenaBounds, Cheat, CombatEvent, CombatListener, CombatSession, ObjectiveSpec, PlayerPose,
};
use crate::tuning::CombatTuning;
use glam::Vec3;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("Logger already initialized");
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Forwards every combat event to a JS function as a JSON string
struct JsListener {
    callback: js_sys::Function,
}

impl CombatListener for JsListener {
    fn on_event(&mut self, event: &CombatEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Failed to encode event: {}", err);
                return;
            }
        };
        if let Err(err) = self.callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::warn!("Event listener threw: {:?}", err);
        }
    }
}

#[wasm_bindgen]
pub struct WebSession {
    session: CombatSession,
}

#[wasm_bindgen]
impl WebSession {
    /// Create a session. `tuning_json` overrides the reference balance;
    /// without a seed the current time is used.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>, seed: Option<f64>) -> Result<WebSession, JsValue> {
        let tuning = match tuning_json {
            Some(json) => CombatTuning::from_json(&json).map_err(js_error)?,
            None => CombatTuning::default(),
        };
        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        log::info!("Combat session created (seed {})", seed);
        Ok(Self {
            session: CombatSession::new(tuning, seed),
        })
    }

    /// `objectives_json`: `[{"name": "ALPHA", "position": [x, y, z]}, ...]`
    pub fn activate(
        &mut self,
        objectives_json: &str,
        arena_json: Option<String>,
    ) -> Result<(), JsValue> {
        let objectives: Vec<ObjectiveSpec> =
            serde_json::from_str(objectives_json).map_err(js_error)?;
        let arena = arena_json
            .map(|json| serde_json::from_str::<ArenaBounds>(&json))
            .transpose()
            .map_err(js_error)?;
        self.session.activate(&objectives, arena);
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.session.deactivate();
    }

    pub fn reset_session(&mut self) {
        self.session.reset_session();
    }

    pub fn update(&mut self, dt: f32) {
        self.session.update(dt);
    }

    pub fn set_player_pose(&mut self, px: f32, py: f32, pz: f32, fx: f32, fy: f32, fz: f32) {
        self.session.set_player_pose(PlayerPose::new(
            Vec3::new(px, py, pz),
            Vec3::new(fx, fy, fz),
        ));
    }

    pub fn set_trigger(&mut self, held: bool) {
        self.session.set_trigger(held);
    }

    /// Pull the trigger once. Returns the outcome as JSON.
    pub fn fire(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.fire()).map_err(js_error)
    }

    pub fn switch_weapon(&mut self, index: usize) -> bool {
        self.session.switch_weapon(index)
    }

    pub fn start_wave(&mut self, wave: u32) {
        self.session.start_wave(wave);
    }

    pub fn warp_to_boss(&mut self) {
        self.session.warp_to_boss();
    }

    /// Feed a key into the cheat buffer; returns the cheat code it completed
    pub fn type_cheat(&mut self, key: &str) -> Option<String> {
        let mut completed = None;
        for ch in key.chars() {
            if let Some(cheat) = self.session.type_cheat(ch) {
                completed = Some(cheat.code().to_string());
            }
        }
        completed
    }

    /// Apply a cheat by code (`iddqd`, `idkfa`, `idclev5`)
    pub fn apply_cheat(&mut self, code: &str) -> bool {
        match Cheat::from_code(code) {
            Some(cheat) => {
                self.session.apply_cheat(cheat);
                true
            }
            None => false,
        }
    }

    /// Receive every event as it is produced
    pub fn set_listener(&mut self, callback: js_sys::Function) {
        self.session.add_listener(Box::new(JsListener { callback }));
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(js_error)
    }

    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_events()).map_err(js_error)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn wave(&self) -> u32 {
        self.session.wave()
    }

    pub fn score(&self) -> f64 {
        self.session.score() as f64
    }

    pub fn player_health(&self) -> f32 {
        self.session.player_health()
    }
}
