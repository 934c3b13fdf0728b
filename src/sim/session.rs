/// Session: the continuous-clock driver around the turn pipeline.
///
/// `frame` runs once per rendered frame with the caller's resolved intent
/// and a monotonic timestamp in seconds. It never reads a clock itself:
///
///   1. Tutorial update
///   2. Turn (movement) and bomb planting, if the player can act
///   3. Frame-clock updates: explosions, portals
///   4. Portal entry: zoom in, then load the portal's level
///   5. Death: restore the checkpoint after a delay
///   6. Victory: long zoom, then the next level (or start over)

use tracing::{error, info};

use crate::config::GameConfig;
use crate::domain::entity::{EyeState, TurnIntent};
use super::checkpoint::restore_checkpoint;
use super::event::GameEvent;
use super::level::{LevelSource, LoadError};
use super::progress::{load_hub, load_level_from_portal, load_next_level, restart_from_first_level};
use super::step;
use super::world::SimState;

const PORTAL_ZOOM: f32 = 2.5;
const VICTORY_ZOOM: f32 = 3.0;

pub struct Session {
    pub state: SimState,
    last_frame: Option<f64>,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        Session {
            state: SimState::new(config.rules.clone(), config.worlds.clone(), config.seed),
            last_frame: None,
        }
    }

    pub fn from_state(state: SimState) -> Self {
        Session { state, last_frame: None }
    }

    /// Load the first world's hub.
    pub fn start(&mut self, source: &dyn LevelSource) -> Result<Vec<GameEvent>, LoadError> {
        let mut events = Vec::new();
        if restart_from_first_level(&mut self.state, source)? {
            events.push(self.level_loaded());
        }
        Ok(events)
    }

    /// Back to the current world's hub (menu "exit level").
    pub fn return_to_hub(&mut self, source: &dyn LevelSource) -> Result<Vec<GameEvent>, LoadError> {
        let mut events = Vec::new();
        if load_hub(&mut self.state, source)? {
            events.push(self.level_loaded());
        }
        Ok(events)
    }

    /// A failed level load is reported as `LoadFailed`; the rest of the
    /// frame still runs.
    pub fn frame(&mut self, intent: &TurnIntent, now: f64, source: &dyn LevelSource) -> Vec<GameEvent> {
        let dt = self.last_frame.map_or(0.0, |t| (now - t).max(0.0)) as f32;
        self.last_frame = Some(now);

        let mut events = Vec::new();
        let s = &mut self.state;

        // 1. Tutorial
        s.tutorial.update(intent);
        s.tutorial.popup.animate(dt);

        // 2. Turn
        if s.accepts_turns() {
            if let Some(dir) = intent.movement {
                s.tutorial.track_step(now, intent.running);
                events.extend(step::turn(s, dir, now));
            }
            if intent.place_bomb {
                events.extend(step::plant_bomb(s));
            }
        }

        // 3. Frame clock
        step::update_explosions(s);
        events.extend(step::update_portals(s));

        // 4-6. Transitions
        if let Err(e) = self.update_portal_entry(now, source, &mut events) {
            events.push(load_failed(e));
        }
        self.update_death(now, &mut events);
        if let Err(e) = self.update_victory(now, source, &mut events) {
            events.push(load_failed(e));
        }

        let p = &mut self.state.player;
        p.eyes = if p.dead { EyeState::Cringe } else { EyeState::Open };

        events
    }

    fn update_portal_entry(&mut self, now: f64, source: &dyn LevelSource, events: &mut Vec<GameEvent>) -> Result<(), LoadError> {
        let Some(entry) = self.state.player.portal_entry else { return Ok(()) };
        let duration = self.state.rules.portal_entry_seconds;
        let elapsed = now - entry.started_at;

        if elapsed < duration {
            let t = (elapsed / duration).max(0.0) as f32;
            self.state.view_zoom = 1.0 + t * t * (PORTAL_ZOOM - 1.0);
            return Ok(());
        }

        self.state.player.portal_entry = None;
        self.state.view_zoom = 1.0;
        if load_level_from_portal(&mut self.state, source, entry.portal_id)? {
            events.push(self.level_loaded());
        }
        Ok(())
    }

    fn update_death(&mut self, now: f64, events: &mut Vec<GameEvent>) {
        let p = &self.state.player;
        if !p.dead || now <= p.death_time + self.state.rules.death_restore_seconds {
            return;
        }
        if restore_checkpoint(&mut self.state) {
            events.push(GameEvent::CheckpointRestored);
        }
    }

    fn update_victory(&mut self, now: f64, source: &dyn LevelSource, events: &mut Vec<GameEvent>) -> Result<(), LoadError> {
        let Some(since) = self.state.player.victory_time else { return Ok(()) };
        let duration = self.state.rules.victory_seconds;
        let elapsed = now - since;

        if elapsed < duration {
            let t = (elapsed / duration).max(0.0) as f32;
            let eased = t * t * (3.0 - 2.0 * t);
            self.state.view_zoom = 1.0 + eased * (VICTORY_ZOOM - 1.0);
            return Ok(());
        }

        self.state.player.victory_time = None;
        self.state.view_zoom = 1.0;
        if load_next_level(&mut self.state, source)? {
            events.push(self.level_loaded());
        } else {
            info!("all worlds complete, starting over");
            events.push(GameEvent::GameComplete);
            if restart_from_first_level(&mut self.state, source)? {
                events.push(self.level_loaded());
            }
        }
        Ok(())
    }

    fn level_loaded(&self) -> GameEvent {
        GameEvent::LevelLoaded { path: self.state.level_path.clone(), hub: self.state.in_hub }
    }
}

fn load_failed(e: LoadError) -> GameEvent {
    error!(error = %e, "level transition failed");
    GameEvent::LoadFailed { reason: e.to_string() }
}
