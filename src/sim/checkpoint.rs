/// In-memory checkpoint: one snapshot per level.
///
/// Taken on level load and whenever the player collects a checkpoint item.
/// Restored after death. Everything is deep-copied, including each eeper's
/// distance field, so later turns never write through into the snapshot.
///
/// Explosions are not part of a checkpoint: cells burning at capture time
/// are stored as floor, and restore clears the explosion list.

use tracing::info;

use crate::domain::cell::{Cell, Grid};
use crate::domain::entity::{Bomb, Eeper, EyeState, Item};
use crate::domain::geom::IVec2;
use super::world::SimState;

#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub grid: Grid,
    pub player_position: IVec2,
    pub keys: u32,
    pub bombs: u32,
    pub bomb_slots: u32,
    pub eepers: Vec<Eeper>,
    pub items: Vec<Item>,
    pub bomb_list: Vec<Bomb>,
}

// ══════════════════════════════════════════════════════════════
// Capture / restore (SimState ↔ Checkpoint)
// ══════════════════════════════════════════════════════════════

pub fn capture_checkpoint(s: &SimState) -> Checkpoint {
    let mut grid = s.grid.clone();
    for e in &s.explosions {
        grid.set(e.position, Cell::Floor);
    }

    Checkpoint {
        grid,
        player_position: s.player.position,
        keys: s.player.keys,
        bombs: s.player.bombs,
        bomb_slots: s.player.bomb_slots,
        eepers: s.eepers.clone(),
        items: s.items.clone(),
        bomb_list: s.bombs.clone(),
    }
}

pub fn save_checkpoint(s: &mut SimState) {
    s.checkpoint = Some(capture_checkpoint(s));
    info!(
        level = %s.level_path,
        x = s.player.position.x,
        y = s.player.position.y,
        "checkpoint_saved"
    );
}

/// Roll back to the last checkpoint. Returns false when none was taken.
pub fn restore_checkpoint(s: &mut SimState) -> bool {
    let Some(cp) = s.checkpoint.as_ref() else { return false };

    s.grid = cp.grid.clone();
    s.eepers = cp.eepers.clone();
    s.items = cp.items.clone();
    s.bombs = cp.bomb_list.clone();
    s.explosions.clear();

    let p = &mut s.player;
    p.position = cp.player_position;
    p.prev_position = cp.player_position;
    p.keys = cp.keys;
    p.bombs = cp.bombs;
    p.bomb_slots = cp.bomb_slots;
    p.health = 1.0;
    p.dead = false;
    p.death_time = 0.0;
    p.eyes = EyeState::Open;
    p.portal_entry = None;

    // Transition state
    for portal in &mut s.portals {
        portal.activated = false;
    }
    s.view_zoom = 1.0;

    info!(level = %s.level_path, "checkpoint_restored");
    true
}
