/// Map rules: who may stand where, and the region fills used by doors and
/// blasts. Pure functions over the grid, no entity mutation here.
///
/// ## Occupancy
///   - Player:  `Floor` only (doors are handled by the turn logic).
///   - Hunters (guard, mother): the whole footprint must be in bounds, on
///     `Floor` or live `Explosion`, and clear of every other live eeper.
///   - Gnome:   `Floor` only.
///
/// ## Fills
///   - Door clusters open 8-connected, over cells of the starting type.
///   - Blasts consume barricades 4-connected.

use std::collections::VecDeque;

use super::cell::{Cell, Grid};
use super::entity::Eeper;
use super::geom::{Direction, IVec2, Rect, NEIGHBORS_8};

// ══════════════════════════════════════════════════════════════
// Occupancy
// ══════════════════════════════════════════════════════════════

/// Could eeper `me` stand with its top-left at `pos`?
pub fn hunter_can_stand(grid: &Grid, eepers: &[Eeper], me: usize, size: IVec2, pos: IVec2) -> bool {
    let body = Rect::new(pos, size);
    if !body.cells().all(|c| grid.get(c).map_or(false, Cell::is_eeper_ground)) {
        return false;
    }
    eepers.iter().enumerate().all(|(i, other)| {
        i == me || other.dead || !other.footprint().overlaps(&body)
    })
}

#[inline]
pub fn gnome_can_stand(grid: &Grid, pos: IVec2) -> bool {
    grid.get(pos) == Some(Cell::Floor)
}

/// Is `pos` covered by any live eeper other than `me`?
pub fn occupied_by_other(eepers: &[Eeper], me: usize, pos: IVec2) -> bool {
    eepers.iter().enumerate().any(|(i, e)| i != me && !e.dead && e.overlaps_cell(pos))
}

// ══════════════════════════════════════════════════════════════
// Fills
// ══════════════════════════════════════════════════════════════

/// 8-connected cluster of cells sharing the type at `start`.
/// Empty unless `start` is a Door or Barricade.
pub fn door_cluster(grid: &Grid, start: IVec2) -> Vec<IVec2> {
    let kind = match grid.get(start) {
        Some(c @ (Cell::Door | Cell::Barricade)) => c,
        _ => return vec![],
    };
    flood(grid, start, kind, &NEIGHBORS_8)
}

/// Open the door cluster at `start`. Returns how many cells became floor.
pub fn open_door_cluster(grid: &mut Grid, start: IVec2) -> usize {
    let cells = door_cluster(grid, start);
    for &p in &cells {
        grid.set(p, Cell::Floor);
    }
    cells.len()
}

/// 4-connected region of `kind` cells containing `start`.
pub fn region(grid: &Grid, start: IVec2, kind: Cell) -> Vec<IVec2> {
    let cardinals = Direction::ALL.map(Direction::unit);
    flood(grid, start, kind, &cardinals)
}

fn flood(grid: &Grid, start: IVec2, kind: Cell, offsets: &[IVec2]) -> Vec<IVec2> {
    if grid.get(start) != Some(kind) { return vec![]; }

    let w = grid.width() as usize;
    let mut seen = vec![false; w * grid.height() as usize];
    let mut out = Vec::new();
    let mut queue = VecDeque::new();

    if let Some(i) = grid.index(start) {
        seen[i] = true;
    }
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        out.push(cur);
        for &off in offsets {
            let next = cur + off;
            let Some(i) = grid.index(next) else { continue };
            if seen[i] || grid.at(next) != kind { continue; }
            seen[i] = true;
            queue.push_back(next);
        }
    }

    out
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
