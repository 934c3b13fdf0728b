/// SimState: the complete state of a running game.
///
/// One aggregate owns the map and every entity list. Phase functions in
/// `sim::step`, `sim::checkpoint` and `sim::level` take it by `&mut` and
/// never keep references across calls.
///
/// ## Clocks
///   - Turn clock: `turn` counts `step::turn` calls. Bombs, items, eepers.
///   - Frame clock: `update_explosions` / `update_portals`, once per frame.
///   - Wall clock: caller-supplied seconds, stored only as timestamps.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{Rules, WorldDef};
use crate::domain::cell::Grid;
use crate::domain::entity::{Bomb, Eeper, EeperKind, Explosion, Item, ItemKind, Player, Portal};
use crate::domain::geom::IVec2;
use super::checkpoint::Checkpoint;
use super::progress::Worlds;
use super::tutorial::Tutorial;

pub struct SimState {
    // ── Map ──
    pub grid: Grid,

    // ── Entities ──
    pub player: Player,
    pub eepers: Vec<Eeper>,
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<Explosion>,
    pub items: Vec<Item>,
    pub portals: Vec<Portal>,

    // ── Level / progression ──
    pub checkpoint: Option<Checkpoint>,
    pub worlds: Worlds,
    pub level_path: String,
    pub in_hub: bool,

    // ── Meta ──
    pub rules: Rules,
    pub turn: u64,
    /// Camera zoom, animated by the session on portal entry and victory.
    pub view_zoom: f32,
    pub tutorial: Tutorial,

    rng: ChaCha8Rng,
}

// ── Construction ──

impl SimState {
    pub fn new(rules: Rules, worlds: Vec<WorldDef>, seed: u64) -> Self {
        SimState {
            grid: Grid::new(0, 0, Default::default()),
            player: Player::new(IVec2::ZERO),
            eepers: vec![],
            bombs: vec![],
            explosions: vec![],
            items: vec![],
            portals: vec![],
            checkpoint: None,
            worlds: Worlds::new(worlds),
            level_path: String::new(),
            in_hub: false,
            rules,
            turn: 0,
            view_zoom: 1.0,
            tutorial: Tutorial::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Bare state over a prepared grid. Used by tests and tools.
    pub fn with_grid(grid: Grid, player: IVec2, rules: Rules) -> Self {
        let mut state = SimState::new(rules, vec![], 0);
        state.grid = grid;
        state.player = Player::new(player);
        state
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }
}

// ── Entity helpers ──

impl SimState {
    /// Uniform pick among candidates. The only source of randomness in the
    /// simulation, so a fixed seed replays identically.
    pub fn choose<T: Copy>(&mut self, options: &[T]) -> Option<T> {
        options.choose(&mut self.rng).copied()
    }

    /// Add an eeper, reusing a dead slot so indices stay small.
    pub fn spawn_eeper(&mut self, kind: EeperKind, position: IVec2) -> usize {
        let eeper = Eeper::new(kind, position);
        if let Some(i) = self.eepers.iter().position(|e| e.dead) {
            self.eepers[i] = eeper;
            i
        } else {
            self.eepers.push(eeper);
            self.eepers.len() - 1
        }
    }

    pub fn spawn_item(&mut self, kind: ItemKind, position: IVec2) {
        self.items.push(Item::new(kind, position));
    }

    pub fn live_eepers(&self) -> impl Iterator<Item = &Eeper> {
        self.eepers.iter().filter(|e| !e.dead)
    }

    pub fn portal(&self, id: u32) -> Option<&Portal> {
        self.portals.iter().find(|p| p.id == id)
    }

    /// Can the player take a turn right now?
    pub fn accepts_turns(&self) -> bool {
        !self.player.dead && self.player.portal_entry.is_none() && !self.player.reached_father()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Cell;

    #[test]
    fn choose_is_seeded() {
        let opts = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut a = SimState::new(Rules::default(), vec![], 42);
        let mut b = SimState::new(Rules::default(), vec![], 42);
        let xs: Vec<_> = (0..16).map(|_| a.choose(&opts)).collect();
        let ys: Vec<_> = (0..16).map(|_| b.choose(&opts)).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.choose::<i32>(&[]), None);
    }

    #[test]
    fn spawn_reuses_dead_slots() {
        let mut s = SimState::with_grid(Grid::new(20, 20, Cell::Floor), IVec2::ZERO, Rules::default());
        let a = s.spawn_eeper(EeperKind::Guard, IVec2::new(1, 1));
        let b = s.spawn_eeper(EeperKind::Gnome, IVec2::new(9, 9));
        assert_eq!((a, b), (0, 1));
        s.eepers[0].dead = true;
        assert_eq!(s.spawn_eeper(EeperKind::Guard, IVec2::new(5, 5)), 0);
        assert_eq!(s.live_eepers().count(), 2);
    }

    #[test]
    fn turns_gated_by_player_state() {
        let mut s = SimState::with_grid(Grid::new(3, 3, Cell::Floor), IVec2::ZERO, Rules::default());
        assert!(s.accepts_turns());
        s.player.victory_time = Some(1.0);
        assert!(!s.accepts_turns());
    }
}
