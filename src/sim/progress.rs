/// World graph: an ordered list of worlds, each a hub plus the levels its
/// portals lead to. Portal `n` maps to `levels[n - 1]`.
///
/// Navigation misses are ordinary gameplay (last world finished, portal
/// without a level), so they return `None` / `false`, never an error.

use tracing::{info, warn};

use crate::config::WorldDef;
use super::level::{install_level, load_level, LevelSource, LoadError};
use super::world::SimState;

#[derive(Clone, Debug, Default)]
pub struct Worlds {
    worlds: Vec<WorldDef>,
    current: usize,
}

impl Worlds {
    pub fn new(worlds: Vec<WorldDef>) -> Self {
        Worlds { worlds, current: 0 }
    }

    pub fn current_index(&self) -> usize { self.current }
    pub fn len(&self) -> usize { self.worlds.len() }
    pub fn is_empty(&self) -> bool { self.worlds.is_empty() }

    pub fn first(&self) -> Option<&WorldDef> {
        self.worlds.first()
    }

    pub fn current(&self) -> Option<&WorldDef> {
        self.worlds.get(self.current)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current().map(|w| w.name.as_str())
    }

    pub fn hub(&self) -> Option<&str> {
        self.current().map(|w| w.hub.as_str())
    }

    pub fn level_for_portal(&self, portal: u32) -> Option<&str> {
        let index = (portal as usize).checked_sub(1)?;
        self.current()?.levels.get(index).map(String::as_str)
    }

    pub fn has_level(&self, portal: u32) -> bool {
        self.level_for_portal(portal).is_some()
    }

    pub fn level_count(&self) -> usize {
        self.current().map_or(0, |w| w.levels.len())
    }

    /// The world `advance` would move to, without moving.
    pub fn peek_next(&self) -> Option<&WorldDef> {
        self.worlds.get(self.current + 1)
    }

    /// Move to the next world. False at the last one.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < self.worlds.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

// ══════════════════════════════════════════════════════════════
// Level transitions
// ══════════════════════════════════════════════════════════════

/// Load the current world's hub. `Ok(false)` when there is no world.
pub fn load_hub(state: &mut SimState, source: &dyn LevelSource) -> Result<bool, LoadError> {
    let Some(hub) = state.worlds.hub().map(str::to_owned) else {
        warn!(world = state.worlds.current_index(), "no hub for world");
        return Ok(false);
    };
    load_level(state, source, &hub, true)?;
    Ok(true)
}

/// After a victory: a level returns to its hub, a hub moves on to the next
/// world. `Ok(false)` when the last world is done. The world index only
/// moves once the next hub has loaded.
pub fn load_next_level(state: &mut SimState, source: &dyn LevelSource) -> Result<bool, LoadError> {
    if !state.in_hub {
        return load_hub(state, source);
    }
    let Some(hub) = state.worlds.peek_next().map(|w| w.hub.clone()) else {
        return Ok(false);
    };
    let level = source.load(&hub)?;

    state.worlds.advance();
    info!(world = state.worlds.current_name().unwrap_or(""), "world_advanced");
    install_level(state, &level, &hub, true);
    Ok(true)
}

/// Back to the first world's hub with a fresh tutorial. Nothing changes
/// when that hub fails to load.
pub fn restart_from_first_level(state: &mut SimState, source: &dyn LevelSource) -> Result<bool, LoadError> {
    let Some(hub) = state.worlds.first().map(|w| w.hub.clone()) else {
        warn!("no worlds to restart from");
        return Ok(false);
    };
    let level = source.load(&hub)?;

    state.tutorial = Default::default();
    state.worlds.reset();
    install_level(state, &level, &hub, true);
    Ok(true)
}

/// `Ok(false)` when the portal leads nowhere in this world.
pub fn load_level_from_portal(state: &mut SimState, source: &dyn LevelSource, portal: u32) -> Result<bool, LoadError> {
    let Some(path) = state.worlds.level_for_portal(portal).map(str::to_owned) else {
        warn!(portal, world = state.worlds.current_index(), "portal has no level");
        return Ok(false);
    };
    load_level(state, source, &path, false)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_worlds, Rules};
    use crate::sim::level::EmbeddedLevels;
    use crate::sim::tutorial::TutorialPhase;

    fn two_worlds() -> Vec<WorldDef> {
        vec![
            WorldDef { name: "One".into(), hub: "hub".into(), levels: vec!["level-1".into(), "level-2".into()] },
            WorldDef { name: "Two".into(), hub: "level-2".into(), levels: vec![] },
        ]
    }

    #[test]
    fn portal_numbers_are_one_based() {
        let w = Worlds::new(default_worlds());
        assert_eq!(w.hub(), Some("hub"));
        assert_eq!(w.level_for_portal(1), Some("level-1"));
        assert_eq!(w.level_for_portal(2), Some("level-2"));
        assert_eq!(w.level_for_portal(0), None);
        assert_eq!(w.level_for_portal(3), None);
        assert!(w.has_level(2));
        assert_eq!(w.level_count(), 2);
    }

    #[test]
    fn advance_stops_at_last_world() {
        let mut w = Worlds::new(two_worlds());
        assert!(w.advance());
        assert_eq!(w.current_name(), Some("Two"));
        assert!(!w.advance());
        assert_eq!(w.current_index(), 1);
        w.reset();
        assert_eq!(w.current_index(), 0);
    }

    #[test]
    fn empty_graph_has_nothing() {
        let mut w = Worlds::new(vec![]);
        assert_eq!(w.hub(), None);
        assert_eq!(w.level_for_portal(1), None);
        assert!(!w.advance());
    }

    #[test]
    fn next_level_walks_hub_level_hub_world() {
        let source = EmbeddedLevels::builtin();
        let mut s = SimState::new(Rules::default(), two_worlds(), 3);

        assert!(load_hub(&mut s, &source).unwrap());
        assert!(s.in_hub);

        assert!(load_level_from_portal(&mut s, &source, 1).unwrap());
        assert_eq!(s.level_path, "level-1");
        assert!(!s.in_hub);

        // Level → hub
        assert!(load_next_level(&mut s, &source).unwrap());
        assert_eq!(s.level_path, "hub");
        // Hub → next world's hub
        assert!(load_next_level(&mut s, &source).unwrap());
        assert_eq!(s.level_path, "level-2");
        assert!(s.in_hub);
        // Last world done
        assert!(!load_next_level(&mut s, &source).unwrap());
    }

    #[test]
    fn unmapped_portal_is_a_quiet_miss() {
        let source = EmbeddedLevels::builtin();
        let mut s = SimState::new(Rules::default(), default_worlds(), 3);
        load_hub(&mut s, &source).unwrap();
        assert!(!load_level_from_portal(&mut s, &source, 7).unwrap());
        assert_eq!(s.level_path, "hub");
    }

    #[test]
    fn restart_resets_world_and_tutorial() {
        let source = EmbeddedLevels::builtin();
        let mut s = SimState::new(Rules::default(), two_worlds(), 3);
        s.worlds.advance();
        s.tutorial.phase = TutorialPhase::Done;

        assert!(restart_from_first_level(&mut s, &source).unwrap());
        assert_eq!(s.worlds.current_index(), 0);
        assert_eq!(s.level_path, "hub");
        assert_eq!(s.tutorial.phase, TutorialPhase::Move);
    }

    #[test]
    fn failed_world_advance_keeps_current_world() {
        let source = EmbeddedLevels::builtin();
        let worlds = vec![
            WorldDef { name: "One".into(), hub: "hub".into(), levels: vec!["level-1".into()] },
            WorldDef { name: "Two".into(), hub: "missing".into(), levels: vec!["level-2".into()] },
        ];
        let mut s = SimState::new(Rules::default(), worlds, 3);
        load_hub(&mut s, &source).unwrap();

        assert!(matches!(load_next_level(&mut s, &source), Err(LoadError::UnknownLevel(_))));
        assert_eq!(s.worlds.current_index(), 0);
        assert_eq!(s.level_path, "hub");
        assert!(s.in_hub);
        assert_eq!(s.worlds.level_for_portal(1), Some("level-1"));
    }

    #[test]
    fn failed_restart_keeps_world_and_tutorial() {
        let source = EmbeddedLevels::builtin();
        let worlds = vec![
            WorldDef { name: "Broken".into(), hub: "missing".into(), levels: vec![] },
            WorldDef { name: "Two".into(), hub: "hub".into(), levels: vec![] },
        ];
        let mut s = SimState::new(Rules::default(), worlds, 3);
        s.worlds.advance();
        load_hub(&mut s, &source).unwrap();
        s.tutorial.phase = TutorialPhase::Done;

        assert!(restart_from_first_level(&mut s, &source).is_err());
        assert_eq!(s.worlds.current_index(), 1);
        assert_eq!(s.tutorial.phase, TutorialPhase::Done);
        assert_eq!(s.level_path, "hub");
    }

    #[test]
    fn missing_level_is_an_error() {
        let source = EmbeddedLevels::builtin();
        let worlds = vec![WorldDef { name: "X".into(), hub: "nope".into(), levels: vec![] }];
        let mut s = SimState::new(Rules::default(), worlds, 3);
        assert!(matches!(load_hub(&mut s, &source), Err(LoadError::UnknownLevel(_))));
    }
}
