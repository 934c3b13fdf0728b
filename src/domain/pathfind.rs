/// Grid pathfinding.
///
/// Two tools:
///   1. **Distance field**: multi-source BFS seeded from a target footprint.
///      Every eeper that hunts or flees reads one of these.
///   2. **Point-to-point BFS**: shortest cell path over floor, for simple
///      single-cell queries.
///
/// Occupancy is always a caller-supplied predicate so that footprint-aware
/// collision (a 3×3 guard needs room for all nine cells) stays with the
/// caller. Out-of-bounds cells are never passed to the predicate.

use std::collections::VecDeque;

use super::cell::{Cell, Grid};
use super::geom::{Direction, IVec2, Rect};

pub const UNREACHABLE: i32 = -1;

// ══════════════════════════════════════════════════════════════
// Distance field
// ══════════════════════════════════════════════════════════════

/// BFS distances sized to the map.
/// `-1` = unreachable, `0` = overlapping the target, `N` = N hops away.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DistanceField {
    width: i32,
    height: i32,
    distances: Vec<i32>,
}

impl DistanceField {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        DistanceField { width, height, distances: vec![UNREACHABLE; (width * height) as usize] }
    }

    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }

    fn index(&self, p: IVec2) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    /// Distance at `p`; out of bounds reads as unreachable.
    pub fn get(&self, p: IVec2) -> i32 {
        self.index(p).map_or(UNREACHABLE, |i| self.distances[i])
    }

    /// `Some(d)` if `p` was reached.
    pub fn reached(&self, p: IVec2) -> Option<i32> {
        let d = self.get(p);
        if d >= 0 { Some(d) } else { None }
    }

    fn set(&mut self, p: IVec2, d: i32) {
        if let Some(i) = self.index(p) {
            self.distances[i] = d;
        }
    }

    /// Raw row-major distances. For renderers.
    pub fn cells(&self) -> &[i32] {
        &self.distances
    }
}

/// Compute a distance field over a `width × height` map.
///
/// - Every cell of `target` satisfying `can_occupy` is seeded with 0.
/// - BFS expands in `Direction::ALL` order. Each hop may slide up to
///   `stride` cells in one direction, stopping at the first visited cell,
///   map edge, or cell failing `can_occupy`. Every slid-over cell gets
///   `parent + 1`.
/// - A cell whose distance has reached `step_limit` is kept but not expanded.
pub fn compute_distance_map<F>(
    width: i32,
    height: i32,
    target: Rect,
    step_limit: i32,
    stride: i32,
    mut can_occupy: F,
) -> DistanceField
where
    F: FnMut(IVec2) -> bool,
{
    let mut field = DistanceField::new(width, height);
    let mut queue: VecDeque<IVec2> = VecDeque::with_capacity(64);

    for p in target.cells() {
        if field.index(p).is_none() || field.get(p) == 0 { continue; }
        if can_occupy(p) {
            field.set(p, 0);
            queue.push_back(p);
        }
    }

    while let Some(pos) = queue.pop_front() {
        let here = field.get(pos);
        if here >= step_limit { continue; }

        for dir in Direction::ALL {
            let mut next = pos;
            for _ in 0..stride.max(1) {
                next += dir.unit();
                if field.index(next).is_none() { break; }
                if field.get(next) >= 0 { break; }
                if !can_occupy(next) { break; }
                field.set(next, here + 1);
                queue.push_back(next);
            }
        }
    }

    field
}

// ══════════════════════════════════════════════════════════════
// Point-to-point BFS
// ══════════════════════════════════════════════════════════════

/// Shortest 4-connected path over `Floor` from `start` to `end`, both
/// inclusive. `None` when unreachable or either end is off the floor.
pub fn bfs_path(grid: &Grid, start: IVec2, end: IVec2) -> Option<Vec<IVec2>> {
    let walkable = |p: IVec2| grid.get(p) == Some(Cell::Floor);
    if !walkable(start) || !walkable(end) { return None; }

    let w = grid.width() as usize;
    let h = grid.height() as usize;
    let mut parent: Vec<Option<IVec2>> = vec![None; w * h];
    let mut visited = vec![false; w * h];
    let idx = |p: IVec2| p.y as usize * w + p.x as usize;

    let mut queue = VecDeque::new();
    visited[idx(start)] = true;
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        if cur == end {
            let mut path = vec![cur];
            let mut at = cur;
            while let Some(prev) = parent[idx(at)] {
                path.push(prev);
                at = prev;
            }
            path.reverse();
            return Some(path);
        }
        for dir in Direction::ALL {
            let next = cur + dir.unit();
            if !walkable(next) || visited[idx(next)] { continue; }
            visited[idx(next)] = true;
            parent[idx(next)] = Some(cur);
            queue.push_back(next);
        }
    }

    None
}
