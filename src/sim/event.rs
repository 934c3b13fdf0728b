/// Events emitted during a simulation turn or frame.
/// The presentation layer consumes these for animation/sound.

use crate::domain::entity::{EeperKind, ItemKind};
use crate::domain::geom::IVec2;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Footstep { at: IVec2 },
    ItemPicked { kind: ItemKind, at: IVec2 },
    DoorOpened { at: IVec2, cells: usize },
    CheckpointSaved,
    CheckpointRestored,
    BombPlanted { at: IVec2 },
    Blast { at: IVec2 },
    BarricadeDestroyed { cells: usize },
    EeperStep { index: usize, kind: EeperKind, from: IVec2, to: IVec2 },
    EeperDamaged { index: usize, health: f32 },
    EeperKilled { index: usize, kind: EeperKind, at: IVec2 },
    GuardsSpawned { count: usize },
    KeyDropped { at: IVec2 },
    PortalOpening { id: u32 },
    PortalClosing { id: u32 },
    PortalEntered { id: u32 },
    PlayerKilled,
    Victory,
    LevelLoaded { path: String, hub: bool },
    /// A transition could not load its level; the running level stays.
    LoadFailed { reason: String },
    GameComplete,
}
