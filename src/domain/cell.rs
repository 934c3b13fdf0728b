/// Map cells and the grid that holds them.
/// Cell properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

use super::geom::IVec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    None,      // Void outside the playable area
    Floor,
    Wall,
    Door,      // Opened (as a whole cluster) with a key
    Barricade, // Destroyed (as a whole cluster) by explosions
    Explosion, // Transient overlay, decays back to Floor
}

impl Cell {
    /// Can the player step onto this cell?
    pub fn is_walkable(self) -> bool {
        matches!(self, Cell::Floor)
    }

    /// Can a chasing eeper stand here? Live explosions don't stop them.
    pub fn is_eeper_ground(self) -> bool {
        matches!(self, Cell::Floor | Cell::Explosion)
    }

    /// Does this cell stop an explosion ray without being consumed?
    pub fn stops_blast(self) -> bool {
        matches!(self, Cell::None | Cell::Wall | Cell::Door)
    }
}

/// Row-major 2D cell array. Dimensions are fixed at construction.
/// Every access is bounds-checked: out of bounds reads as `None` and
/// writes are dropped.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: i32, height: i32, fill: Cell) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Grid { width, height, cells: vec![fill; (width * height) as usize] }
    }

    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }

    #[inline]
    pub fn in_bounds(&self, p: IVec2) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    pub fn index(&self, p: IVec2) -> Option<usize> {
        if self.in_bounds(p) {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, p: IVec2) -> Option<Cell> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Cell at `p`, with out-of-bounds reading as `Cell::None`.
    #[inline]
    pub fn at(&self, p: IVec2) -> Cell {
        self.get(p).unwrap_or(Cell::None)
    }

    /// Returns false (and changes nothing) when `p` is out of bounds.
    #[inline]
    pub fn set(&mut self, p: IVec2, cell: Cell) -> bool {
        match self.index(p) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Rows of cells, top to bottom. For renderers.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }
}
