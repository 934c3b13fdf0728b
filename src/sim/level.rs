/// Level loading: sources, the text marker format, and atomic install.
///
/// ## Sources
///   - `DirLevelSource`: `.txt` files under a directory
///   - `EmbeddedLevels`: built-in world (`hub`, `level-1`, `level-2`)
///   - `Fallback(a, b)`: try `a`, then `b` when `a` has no such level
///
/// ## Text format (one char per cell):
///   ' ' = None (void)          '.' = Floor
///   '#' = Wall                 'D' = Door
///   '%' = Barricade            '@' = Player spawn
///   'g' = Guard (top-left)     'M' = Mother (top-left)
///   'n' = Gnome                'F' = Father (top-left)
///   'k' = Key                  'b' = Bomb refill
///   's' = Bomb slot            'c' = Checkpoint
///   '1'..'9' = Portal centre with that id
///
/// Lines starting with `;` are comments. Short rows are padded with void.
/// Every spawn marker has floor underneath.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::domain::cell::{Cell, Grid};
use crate::domain::entity::{EeperKind, ItemKind, Player, Portal};
use crate::domain::geom::{Direction, IVec2};
use super::checkpoint::save_checkpoint;
use super::world::SimState;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read level {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("level {0} has no rows")]
    Empty(String),
    #[error("level {path}: row {row} has {found} cells, expected {expected}")]
    Ragged { path: String, row: usize, expected: usize, found: usize },
    /// `line` and `column` are 1-based positions in the source text.
    #[error("level {path}: unknown marker {ch:?} at line {line}, column {column}")]
    UnknownMarker { path: String, ch: char, line: usize, column: usize },
    #[error("level {0} has no player spawn")]
    MissingPlayer(String),
    #[error("level {path}: second player spawn at ({}, {})", .at.x, .at.y)]
    MultiplePlayers { path: String, at: IVec2 },
    #[error("level {path}: portal {id} appears twice")]
    DuplicatePortal { path: String, id: u32 },
    #[error("no level named {0}")]
    UnknownLevel(String),
}

// ══════════════════════════════════════════════════════════════
// Marker grid
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Marker {
    #[default]
    None,
    Floor,
    Wall,
    Door,
    Barricade,
    Player,
    Guard,
    Mother,
    Gnome,
    Father,
    Key,
    BombRefill,
    BombSlot,
    Checkpoint,
    Portal(u32),
}

impl Marker {
    pub fn from_char(ch: char) -> Option<Marker> {
        Some(match ch {
            ' ' => Marker::None,
            '.' => Marker::Floor,
            '#' => Marker::Wall,
            'D' => Marker::Door,
            '%' => Marker::Barricade,
            '@' => Marker::Player,
            'g' => Marker::Guard,
            'M' => Marker::Mother,
            'n' => Marker::Gnome,
            'F' => Marker::Father,
            'k' => Marker::Key,
            'b' => Marker::BombRefill,
            's' => Marker::BombSlot,
            'c' => Marker::Checkpoint,
            '1'..='9' => Marker::Portal(ch as u32 - '0' as u32),
            _ => return None,
        })
    }

    /// Terrain under the marker.
    pub fn cell(self) -> Cell {
        match self {
            Marker::None => Cell::None,
            Marker::Wall => Cell::Wall,
            Marker::Door => Cell::Door,
            Marker::Barricade => Cell::Barricade,
            _ => Cell::Floor,
        }
    }
}

/// A validated level: exactly one player, unique portal ids.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGrid {
    pub width: i32,
    pub height: i32,
    markers: Vec<Marker>,
    pub player: IVec2,
}

impl LevelGrid {
    pub fn from_rows(path: &str, rows: Vec<Vec<Marker>>) -> Result<Self, LoadError> {
        let expected = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || expected == 0 {
            return Err(LoadError::Empty(path.into()));
        }

        let mut player = None;
        let mut portals = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(LoadError::Ragged { path: path.into(), row: y, expected, found: row.len() });
            }
            for (x, &m) in row.iter().enumerate() {
                let at = IVec2::new(x as i32, y as i32);
                match m {
                    Marker::Player if player.is_some() => {
                        return Err(LoadError::MultiplePlayers { path: path.into(), at });
                    }
                    Marker::Player => player = Some(at),
                    Marker::Portal(id) if portals.contains(&id) => {
                        return Err(LoadError::DuplicatePortal { path: path.into(), id });
                    }
                    Marker::Portal(id) => portals.push(id),
                    _ => {}
                }
            }
        }
        let player = player.ok_or_else(|| LoadError::MissingPlayer(path.into()))?;

        Ok(LevelGrid {
            width: expected as i32,
            height: rows.len() as i32,
            markers: rows.into_iter().flatten().collect(),
            player,
        })
    }

    pub fn get(&self, p: IVec2) -> Marker {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return Marker::None;
        }
        self.markers[(p.y * self.width + p.x) as usize]
    }

    /// Every cell with its marker, row-major.
    pub fn markers(&self) -> impl Iterator<Item = (IVec2, Marker)> + '_ {
        let w = self.width;
        self.markers.iter().enumerate().map(move |(i, &m)| {
            let i = i as i32;
            (IVec2::new(i % w, i / w), m)
        })
    }

    pub fn to_grid(&self) -> Grid {
        let mut grid = Grid::new(self.width, self.height, Cell::None);
        for (p, m) in self.markers() {
            grid.set(p, m.cell());
        }
        grid
    }
}

/// Parse the text format. Validates before returning.
pub fn parse_level_text(path: &str, text: &str) -> Result<LevelGrid, LoadError> {
    // Keep each row's line number in the file for error reports
    let mut lines: Vec<(usize, &str)> = text.lines()
        .enumerate()
        .filter(|(_, l)| !l.starts_with(';'))
        .collect();
    while lines.last().map_or(false, |(_, l)| l.trim().is_empty()) {
        lines.pop();
    }

    let width = lines.iter().map(|(_, l)| l.chars().count()).max().unwrap_or(0);
    let mut rows = Vec::with_capacity(lines.len());
    for &(n, line) in &lines {
        let mut row = Vec::with_capacity(width);
        for (x, ch) in line.chars().enumerate() {
            let m = Marker::from_char(ch).ok_or_else(|| LoadError::UnknownMarker {
                path: path.into(),
                ch,
                line: n + 1,
                column: x + 1,
            })?;
            row.push(m);
        }
        row.resize(width, Marker::None);
        rows.push(row);
    }

    LevelGrid::from_rows(path, rows)
}

// ══════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════

pub trait LevelSource {
    fn load(&self, path: &str) -> Result<LevelGrid, LoadError>;
}

/// Text levels on disk. `path` is relative to `root`; `.txt` is implied.
pub struct DirLevelSource {
    pub root: PathBuf,
}

impl DirLevelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirLevelSource { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let direct = self.root.join(path);
        if direct.is_file() { return Some(direct); }
        let with_ext = direct.with_extension("txt");
        with_ext.is_file().then_some(with_ext)
    }
}

impl LevelSource for DirLevelSource {
    fn load(&self, path: &str) -> Result<LevelGrid, LoadError> {
        let file = self.resolve(path).ok_or_else(|| LoadError::UnknownLevel(path.into()))?;
        let text = std::fs::read_to_string(&file)
            .map_err(|source| LoadError::Io { path: file.clone(), source })?;
        parse_level_text(path, &text)
    }
}

/// Levels held in memory, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedLevels {
    levels: HashMap<String, String>,
}

impl EmbeddedLevels {
    /// The built-in world.
    pub fn builtin() -> Self {
        let mut levels = EmbeddedLevels::default();
        levels.insert("hub", &HUB);
        levels.insert("level-1", &LEVEL_1);
        levels.insert("level-2", &LEVEL_2);
        levels
    }

    pub fn insert(&mut self, name: &str, rows: &[&str]) {
        self.levels.insert(name.to_string(), rows.join("\n"));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }
}

impl LevelSource for EmbeddedLevels {
    fn load(&self, path: &str) -> Result<LevelGrid, LoadError> {
        let text = self.levels.get(path).ok_or_else(|| LoadError::UnknownLevel(path.into()))?;
        parse_level_text(path, text)
    }
}

/// Try the first source, fall back to the second for unknown names.
pub struct Fallback<A, B>(pub A, pub B);

impl<A: LevelSource, B: LevelSource> LevelSource for Fallback<A, B> {
    fn load(&self, path: &str) -> Result<LevelGrid, LoadError> {
        match self.0.load(path) {
            Err(LoadError::UnknownLevel(_)) => self.1.load(path),
            other => other,
        }
    }
}

/// Sources for a levels directory that may not exist.
pub fn default_source(levels_dir: &Path) -> Fallback<DirLevelSource, EmbeddedLevels> {
    Fallback(DirLevelSource::new(levels_dir), EmbeddedLevels::builtin())
}

// ══════════════════════════════════════════════════════════════
// Install
// ══════════════════════════════════════════════════════════════

/// Load `path` and replace the running level. Nothing changes on error.
pub fn load_level(state: &mut SimState, source: &dyn LevelSource, path: &str, is_hub: bool) -> Result<(), LoadError> {
    let level = source.load(path)?;
    install_level(state, &level, path, is_hub);
    Ok(())
}

pub fn install_level(state: &mut SimState, level: &LevelGrid, path: &str, is_hub: bool) {
    state.grid = level.to_grid();
    state.bombs.clear();
    state.explosions.clear();
    state.eepers.clear();
    state.items.clear();
    state.portals.clear();

    for (p, m) in level.markers() {
        match m {
            Marker::Guard => { state.spawn_eeper(EeperKind::Guard, p); }
            Marker::Mother => { state.spawn_eeper(EeperKind::Mother, p); }
            Marker::Gnome => { state.spawn_eeper(EeperKind::Gnome, p); }
            Marker::Father => { state.spawn_eeper(EeperKind::Father, p); }
            Marker::Key => state.spawn_item(ItemKind::Key, p),
            Marker::BombRefill => state.spawn_item(ItemKind::BombRefill, p),
            Marker::BombSlot => state.spawn_item(ItemKind::BombSlot, p),
            Marker::Checkpoint => state.spawn_item(ItemKind::Checkpoint, p),
            Marker::Portal(id) => state.portals.push(Portal::new(id, p)),
            _ => {}
        }
    }

    let facing = state.player.facing;
    state.player = Player::new(level.player);
    state.player.facing = facing;
    state.player.eyes_target = level.player + Direction::Down.unit();
    state.player.reset_for_level();

    state.level_path = path.to_string();
    state.in_hub = is_hub;
    state.view_zoom = 1.0;
    save_checkpoint(state);

    info!(
        path,
        hub = is_hub,
        width = level.width,
        height = level.height,
        eepers = state.eepers.len(),
        items = state.items.len(),
        portals = state.portals.len(),
        "level_loaded"
    );
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

const HUB: [&str; 19] = [
    "; the burrow: two gates, one door, and dad asleep behind it",
    "##########################",
    "#........................#",
    "#.....b.........@........#",
    "#........................#",
    "#...1.......2............#",
    "#........................#",
    "#....................k...#",
    "######DD##################",
    "   #..........#",
    "   #F.........#",
    "   #..........#",
    "   #..........#",
    "   #..........#",
    "   #..........#",
    "   #..........#",
    "   #..........#",
    "   #..........#",
    "   ############",
];

const LEVEL_1: [&str; 20] = [
    "; keys and doors; the gnome carries a spare",
    "#########################",
    "#.@.....#.......#.......#",
    "#.......#.......#..n....#",
    "#...k...D..g....#.......#",
    "#.......#.......D.......#",
    "#.......#.......#...c...#",
    "#########.......#########",
    "        #.......#",
    "        #...b...#",
    "        ####D####",
    "        #F......#",
    "        #.......#",
    "        #.......#",
    "        #.......#",
    "        #.......#",
    "        #.......#",
    "        #.......#",
    "        #########",
    "",
];

const LEVEL_2: [&str; 22] = [
    "; mother guards the barricade",
    "##############################",
    "#.@......#...................#",
    "#..b.....%...M...............#",
    "#..s.....%...................#",
    "#..b.....%...................#",
    "#........%...................#",
    "#..c.....%...................#",
    "#........%...................#",
    "#........%...................#",
    "##########..........%%%%######",
    "         #..........%........#",
    "         #..........%F.......#",
    "         #..........%........#",
    "         #..........%........#",
    "         #..........%........#",
    "         #..........%........#",
    "         #..........%........#",
    "         #..........%........#",
    "         #..........%........#",
    "         #####################",
    "",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::domain::entity::EeperKind;

    fn fresh_state() -> SimState {
        SimState::new(Rules::default(), crate::config::default_worlds(), 1)
    }

    #[test]
    fn parses_markers_and_pads_rows() {
        let level = parse_level_text("t", "; comment\n#@.\n%g\n").unwrap();
        assert_eq!((level.width, level.height), (3, 2));
        assert_eq!(level.player, IVec2::new(1, 0));
        assert_eq!(level.get(IVec2::new(0, 1)), Marker::Barricade);
        assert_eq!(level.get(IVec2::new(2, 1)), Marker::None);
        assert_eq!(level.get(IVec2::new(9, 9)), Marker::None);

        let grid = level.to_grid();
        assert_eq!(grid.at(IVec2::new(1, 1)), Cell::Floor); // under the guard
        assert_eq!(grid.at(IVec2::new(2, 1)), Cell::None);
    }

    #[test]
    fn rejects_bad_levels() {
        assert!(matches!(parse_level_text("a", "; nothing\n\n"), Err(LoadError::Empty(_))));
        assert!(matches!(parse_level_text("b", "..\n.."), Err(LoadError::MissingPlayer(_))));
        assert!(matches!(
            parse_level_text("c", "@.\n.@"),
            Err(LoadError::MultiplePlayers { at, .. }) if at == IVec2::new(1, 1)
        ));
        assert!(matches!(
            parse_level_text("d", "@.x"),
            Err(LoadError::UnknownMarker { ch: 'x', line: 1, column: 3, .. })
        ));
        // Comment lines still count towards the reported line
        assert!(matches!(
            parse_level_text("d2", "; header\n; second\n@..\n.?."),
            Err(LoadError::UnknownMarker { ch: '?', line: 4, column: 2, .. })
        ));
        assert!(matches!(
            parse_level_text("e", "@1..1"),
            Err(LoadError::DuplicatePortal { id: 1, .. })
        ));
        assert!(matches!(
            LevelGrid::from_rows("f", vec![vec![Marker::Player, Marker::Floor], vec![Marker::Floor]]),
            Err(LoadError::Ragged { row: 1, expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn portal_digits_map_to_ids() {
        assert_eq!(Marker::from_char('7'), Some(Marker::Portal(7)));
        assert_eq!(Marker::from_char('0'), None);
    }

    #[test]
    fn builtin_levels_are_valid() {
        let levels = EmbeddedLevels::builtin();
        for name in ["hub", "level-1", "level-2"] {
            let level = levels.load(name).unwrap();
            let fathers = level.markers().filter(|(_, m)| *m == Marker::Father).count();
            assert_eq!(fathers, 1, "{name}");
        }
        assert!(matches!(levels.load("level-9"), Err(LoadError::UnknownLevel(_))));
    }

    #[test]
    fn builtin_eepers_fit_their_rooms() {
        let levels = EmbeddedLevels::builtin();
        for name in ["hub", "level-1", "level-2"] {
            let level = levels.load(name).unwrap();
            let grid = level.to_grid();
            for (p, m) in level.markers() {
                let kind = match m {
                    Marker::Guard => EeperKind::Guard,
                    Marker::Mother => EeperKind::Mother,
                    Marker::Father => EeperKind::Father,
                    Marker::Gnome => EeperKind::Gnome,
                    _ => continue,
                };
                let body = crate::domain::geom::Rect::new(p, kind.size());
                assert!(body.cells().all(|c| grid.at(c) == Cell::Floor), "{name}: {kind:?} at {p:?}");
            }
        }
    }

    #[test]
    fn load_installs_level_and_checkpoint() {
        let mut s = fresh_state();
        s.player.kill(1.0);
        s.view_zoom = 2.5;
        load_level(&mut s, &EmbeddedLevels::builtin(), "level-1", false).unwrap();

        assert_eq!(s.level_path, "level-1");
        assert!(!s.in_hub);
        assert_eq!(s.player.position, IVec2::new(2, 1));
        assert!(!s.player.dead);
        assert_eq!((s.player.bombs, s.player.bomb_slots, s.player.keys), (0, 1, 0));
        assert_eq!(s.view_zoom, 1.0);
        assert_eq!(s.live_eepers().count(), 3);
        assert_eq!(s.items.len(), 3);
        assert_eq!(s.grid.at(IVec2::new(8, 3)), Cell::Door);
        let cp = s.checkpoint.as_ref().unwrap();
        assert_eq!(cp.player_position, s.player.position);
    }

    #[test]
    fn failed_load_keeps_current_level() {
        let mut s = fresh_state();
        let source = EmbeddedLevels::builtin();
        load_level(&mut s, &source, "hub", true).unwrap();
        let grid = s.grid.clone();

        let mut broken = EmbeddedLevels::default();
        broken.insert("hub", &["#@#", "#@#"]);
        assert!(load_level(&mut s, &broken, "hub", true).is_err());
        assert!(load_level(&mut s, &source, "nowhere", false).is_err());

        assert_eq!(s.grid, grid);
        assert_eq!(s.level_path, "hub");
        assert_eq!(s.portals.len(), 2);
    }

    #[test]
    fn fallback_tries_the_second_source() {
        let mut first = EmbeddedLevels::default();
        first.insert("a", &["@."]);
        let chain = Fallback(first, EmbeddedLevels::builtin());
        assert_eq!(chain.load("a").unwrap().width, 2);
        assert!(chain.load("hub").is_ok());
        assert!(chain.load("zzz").is_err());
    }

    #[test]
    fn directory_source_reads_txt_files() {
        let dir = std::env::temp_dir().join(format!("eepers-levels-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("w1")).unwrap();
        std::fs::write(dir.join("w1/room.txt"), "#####\n#@.k#\n#####\n").unwrap();

        let source = DirLevelSource::new(&dir);
        let level = source.load("w1/room").unwrap();
        assert_eq!(level.get(IVec2::new(3, 1)), Marker::Key);
        assert!(source.load("w1/room.txt").is_ok());
        assert!(matches!(source.load("w1/missing"), Err(LoadError::UnknownLevel(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
