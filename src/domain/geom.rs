/// Grid geometry: integer vectors, cardinal directions and rectangular
/// footprints. Everything here is `Copy` and passed by value.

use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub const ZERO: IVec2 = IVec2 { x: 0, y: 0 };
    pub const ONE: IVec2 = IVec2 { x: 1, y: 1 };

    pub const fn new(x: i32, y: i32) -> Self {
        IVec2 { x, y }
    }

    pub const fn splat(v: i32) -> Self {
        IVec2 { x: v, y: v }
    }

    /// Squared euclidean length. Used for proximity thresholds.
    pub fn length_sq(self) -> i32 {
        self.x * self.x + self.y * self.y
    }
}

impl Add for IVec2 {
    type Output = IVec2;
    fn add(self, o: IVec2) -> IVec2 { IVec2::new(self.x + o.x, self.y + o.y) }
}

impl AddAssign for IVec2 {
    fn add_assign(&mut self, o: IVec2) {
        self.x += o.x;
        self.y += o.y;
    }
}

impl Sub for IVec2 {
    type Output = IVec2;
    fn sub(self, o: IVec2) -> IVec2 { IVec2::new(self.x - o.x, self.y - o.y) }
}

impl Mul<i32> for IVec2 {
    type Output = IVec2;
    fn mul(self, s: i32) -> IVec2 { IVec2::new(self.x * s, self.y * s) }
}

/// Cardinal direction. `ALL` is the fixed BFS visiting order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Down, Direction::Up, Direction::Right, Direction::Left];

    pub fn unit(self) -> IVec2 {
        match self {
            Direction::Down => IVec2::new(0, 1),
            Direction::Up => IVec2::new(0, -1),
            Direction::Right => IVec2::new(1, 0),
            Direction::Left => IVec2::new(-1, 0),
        }
    }
}

/// 8-neighbourhood offsets (cardinals first, then diagonals).
pub const NEIGHBORS_8: [IVec2; 8] = [
    IVec2 { x: 0, y: 1 },
    IVec2 { x: 0, y: -1 },
    IVec2 { x: 1, y: 0 },
    IVec2 { x: -1, y: 0 },
    IVec2 { x: -1, y: -1 },
    IVec2 { x: -1, y: 1 },
    IVec2 { x: 1, y: -1 },
    IVec2 { x: 1, y: 1 },
];

/// Axis-aligned footprint: `origin` is the top-left cell, `size` the extent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub origin: IVec2,
    pub size: IVec2,
}

impl Rect {
    pub const fn new(origin: IVec2, size: IVec2) -> Self {
        Rect { origin, size }
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.origin.x && p.x < self.origin.x + self.size.x
            && p.y >= self.origin.y && p.y < self.origin.y + self.size.y
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.origin.x < other.origin.x + other.size.x
            && other.origin.x < self.origin.x + self.size.x
            && self.origin.y < other.origin.y + other.size.y
            && other.origin.y < self.origin.y + self.size.y
    }

    /// Grow by `n` cells on every side.
    pub fn inflate(&self, n: i32) -> Rect {
        Rect::new(self.origin - IVec2::splat(n), self.size + IVec2::splat(2 * n))
    }

    /// Every cell inside the rectangle, row by row.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> {
        let Rect { origin, size } = *self;
        (0..size.y.max(0)).flat_map(move |dy| {
            (0..size.x.max(0)).map(move |dx| IVec2::new(origin.x + dx, origin.y + dy))
        })
    }
}
