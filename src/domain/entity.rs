/// Entities: Player, Eeper, Bomb, Explosion, Item, Portal.
/// Pure data plus small lifecycle helpers; all turn logic lives in `sim::step`.

use super::geom::{Direction, IVec2, Rect};
use super::pathfind::DistanceField;

/// Expression shown by a creature's eyes. Driven by the simulation,
/// drawn by the renderer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum EyeState {
    #[default]
    Open,
    Closed,
    Angry,
    Cringe,
    Surprised,
}

/// Per-frame input, already resolved from keys/buttons.
/// `running` = movement repeats while held; otherwise only fresh presses move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TurnIntent {
    pub movement: Option<Direction>,
    pub running: bool,
    pub place_bomb: bool,
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Portal the player is falling into. Completes on the session clock.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PortalEntry {
    pub portal_id: u32,
    pub started_at: f64,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub position: IVec2,
    pub prev_position: IVec2,
    pub facing: Direction,
    pub eyes: EyeState,
    pub eyes_target: IVec2,
    pub health: f32,
    pub keys: u32,
    pub bombs: u32,
    pub bomb_slots: u32,
    pub dead: bool,
    pub death_time: f64,
    pub victory_time: Option<f64>,
    pub portal_entry: Option<PortalEntry>,
}

impl Player {
    pub fn new(position: IVec2) -> Self {
        Player {
            position,
            prev_position: position,
            facing: Direction::Down,
            eyes: EyeState::Open,
            eyes_target: position + Direction::Down.unit(),
            health: 1.0,
            keys: 0,
            bombs: 0,
            bomb_slots: 1,
            dead: false,
            death_time: 0.0,
            victory_time: None,
            portal_entry: None,
        }
    }

    pub fn reached_father(&self) -> bool {
        self.victory_time.is_some()
    }

    /// Idempotent: the first death time wins.
    pub fn kill(&mut self, now: f64) -> bool {
        if self.dead { return false; }
        self.dead = true;
        self.health = 0.0;
        self.death_time = now;
        self.eyes = EyeState::Cringe;
        true
    }

    /// Back to level-start stats, keeping position.
    pub fn reset_for_level(&mut self) {
        self.health = 1.0;
        self.dead = false;
        self.death_time = 0.0;
        self.victory_time = None;
        self.portal_entry = None;
        self.bomb_slots = 1;
        self.bombs = 0;
        self.keys = 0;
        self.eyes = EyeState::Open;
    }
}

// ══════════════════════════════════════════════════════════════
// Eepers
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EeperKind {
    Guard,
    Mother,
    Gnome,
    Father,
}

pub const GUARD_SIZE: i32 = 3;
pub const MOTHER_SIZE: i32 = 7;
pub const GNOME_SIZE: i32 = 1;
pub const FATHER_SIZE: i32 = 7;

impl EeperKind {
    pub fn size(self) -> IVec2 {
        IVec2::splat(match self {
            EeperKind::Guard => GUARD_SIZE,
            EeperKind::Mother => MOTHER_SIZE,
            EeperKind::Gnome => GNOME_SIZE,
            EeperKind::Father => FATHER_SIZE,
        })
    }

    /// Guards and mothers share the chase behaviour and have health.
    pub fn is_hunter(self) -> bool {
        matches!(self, EeperKind::Guard | EeperKind::Mother)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Eeper {
    pub kind: EeperKind,
    pub dead: bool,
    pub position: IVec2,
    pub prev_position: IVec2,
    pub size: IVec2,
    pub health: f32,
    pub attack_cooldown: i32,
    /// Set while resolving this turn's explosions, consumed once.
    pub damaged: bool,
    pub eyes: EyeState,
    pub eyes_target: IVec2,
    /// Distance to the player, recomputed every turn. Empty for Father.
    pub path: DistanceField,
}

impl Eeper {
    pub fn new(kind: EeperKind, position: IVec2) -> Self {
        let size = kind.size();
        Eeper {
            kind,
            dead: false,
            position,
            prev_position: position,
            size,
            health: 1.0,
            attack_cooldown: 0,
            damaged: false,
            eyes: EyeState::Closed,
            eyes_target: position + IVec2::new(size.x / 2, size.y),
            path: DistanceField::default(),
        }
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn overlaps_cell(&self, p: IVec2) -> bool {
        self.footprint().contains(p)
    }

    /// Distance from the eeper's own cell in its current path.
    pub fn distance(&self) -> i32 {
        self.path.get(self.position)
    }
}

// ══════════════════════════════════════════════════════════════
// Bombs / explosions
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bomb {
    pub position: IVec2,
    pub countdown: u32,
}

/// Decaying blast overlay. Lives on the frame clock, not the turn clock.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Explosion {
    pub position: IVec2,
    pub timer: u32,
    pub initial_timer: u32,
}

impl Explosion {
    pub fn new(position: IVec2, lifetime: u32) -> Self {
        Explosion { position, timer: lifetime, initial_timer: lifetime }
    }

    /// 1.0 when fresh → 0.0 when about to vanish.
    pub fn fade(&self) -> f32 {
        if self.initial_timer == 0 { return 0.0; }
        self.timer as f32 / self.initial_timer as f32
    }
}

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ItemKind {
    Key,
    BombRefill, // Stays in place, recharges after each pickup
    Checkpoint,
    BombSlot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Item {
    pub kind: ItemKind,
    pub position: IVec2,
    /// Turns until a refill can be picked up again.
    pub cooldown: u32,
}

impl Item {
    pub fn new(kind: ItemKind, position: IVec2) -> Self {
        Item { kind, position, cooldown: 0 }
    }
}

// ══════════════════════════════════════════════════════════════
// Portals
// ══════════════════════════════════════════════════════════════

/// 3×3 gate in a hub. Opens while the player is near.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Portal {
    pub id: u32,
    pub center: IVec2,
    pub open_progress: f32,
    pub activated: bool,
}

impl Portal {
    pub fn new(id: u32, center: IVec2) -> Self {
        Portal { id, center, open_progress: 0.0, activated: false }
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.center - IVec2::ONE, IVec2::splat(3))
    }

    pub fn contains(&self, p: IVec2) -> bool {
        self.footprint().contains(p)
    }

    pub fn distance_sq(&self, p: IVec2) -> i32 {
        (self.center - p).length_sq()
    }
}
