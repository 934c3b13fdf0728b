/// Eeper AI: one decision per eeper per turn.
///
/// Decisions are pure: `decide` reads the map and entities and returns an
/// `EeperPlan`; `sim::step` applies it (random pick among candidates,
/// cooldowns, kills). Behaviour by kind:
///
///   1. **Hunt** (guard, mother): footprint-aware distance field toward the
///      player; lunge along a straight line to any cell one hop closer once
///      the attack cooldown runs out. Mother is a big guard.
///   2. **Flee** (gnome): short-range floor-only field; step to a neighbour
///      strictly farther from the player.
///   3. **Watch** (father): never moves; wins the level when touched.

use super::cell::Grid;
use super::entity::{Eeper, EeperKind, EyeState};
use super::geom::{Direction, IVec2, Rect};
use super::pathfind::{compute_distance_map, DistanceField};
use super::rules::{gnome_can_stand, hunter_can_stand, occupied_by_other};
use crate::config::Rules;

/// Read-only view of everything an eeper may look at.
pub struct AiView<'a> {
    pub grid: &'a Grid,
    pub eepers: &'a [Eeper],
    pub player: IVec2,
    pub rules: &'a Rules,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Action {
    /// Nothing to do (asleep, unreachable, or father watching).
    Idle,
    /// Already overlapping the player.
    Catch,
    /// Player in sight but the attack cooldown is still running.
    Wait,
    /// Cooldown done: jump to one of these cells (may be empty) and re-arm.
    Lunge(Vec<IVec2>),
    /// Step to one of these cells; stay put when empty.
    Flee(Vec<IVec2>),
    /// Player stepped into father's footprint.
    ReachFather,
}

#[derive(Clone, Debug)]
pub struct EeperPlan {
    /// Fresh distance field; `None` keeps the old one.
    pub path: Option<DistanceField>,
    pub action: Action,
    pub eyes: EyeState,
    pub eyes_target: IVec2,
}

pub fn decide(view: &AiView, me: usize) -> EeperPlan {
    let eeper = &view.eepers[me];
    match eeper.kind {
        EeperKind::Guard | EeperKind::Mother => hunt(view, me),
        EeperKind::Gnome => flee(view, me),
        EeperKind::Father => watch(view, me),
    }
}

// ── Hunt (guard / mother) ──

fn hunt(view: &AiView, me: usize) -> EeperPlan {
    let eeper = &view.eepers[me];
    let size = eeper.size;
    let can_stand = |p: IVec2| hunter_can_stand(view.grid, view.eepers, me, size, p);

    // Every top-left cell from which the body would cover the player
    let target = Rect::new(view.player - (size - IVec2::ONE), size);
    let path = compute_distance_map(
        view.grid.width(), view.grid.height(),
        target,
        view.rules.guard_step_limit,
        view.rules.guard_step_stride,
        can_stand,
    );

    let here = path.get(eeper.position);
    let action = if here == 0 {
        Action::Catch
    } else if here > 0 {
        if eeper.attack_cooldown <= 0 {
            Action::Lunge(lunge_targets(&path, eeper.position, here, view.rules.guard_step_stride, can_stand))
        } else {
            Action::Wait
        }
    } else {
        Action::Idle
    };

    let (eyes, eyes_target) = match here {
        d if d < 0 => (EyeState::Closed, below(eeper)),
        0 | 1 => (EyeState::Angry, view.player),
        _ => (EyeState::Open, view.player),
    };

    EeperPlan { path: Some(path), action, eyes, eyes_target }
}

/// Walk outward in each direction and keep the first cell one hop closer.
fn lunge_targets<F>(path: &DistanceField, from: IVec2, here: i32, stride: i32, can_stand: F) -> Vec<IVec2>
where
    F: Fn(IVec2) -> bool,
{
    let mut out = Vec::with_capacity(4);
    for dir in Direction::ALL {
        let mut p = from;
        for _ in 0..stride.max(1) {
            p += dir.unit();
            if !can_stand(p) { break; }
            if path.get(p) == here - 1 {
                out.push(p);
                break;
            }
        }
    }
    out
}

// ── Flee (gnome) ──

fn flee(view: &AiView, me: usize) -> EeperPlan {
    let eeper = &view.eepers[me];
    let path = compute_distance_map(
        view.grid.width(), view.grid.height(),
        Rect::new(view.player, IVec2::ONE),
        view.rules.gnome_step_limit,
        1,
        |p| gnome_can_stand(view.grid, p),
    );

    let here = path.get(eeper.position);
    if here < 0 {
        return EeperPlan {
            path: Some(path),
            action: Action::Idle,
            eyes: EyeState::Closed,
            eyes_target: below(eeper),
        };
    }

    let away: Vec<IVec2> = Direction::ALL.iter()
        .map(|d| eeper.position + d.unit())
        .filter(|&p| gnome_can_stand(view.grid, p))
        .filter(|&p| !occupied_by_other(view.eepers, me, p))
        .filter(|&p| path.get(p) > here)
        .collect();

    EeperPlan {
        path: Some(path),
        action: Action::Flee(away),
        eyes: EyeState::Surprised,
        eyes_target: view.player,
    }
}

// ── Watch (father) ──

fn watch(view: &AiView, me: usize) -> EeperPlan {
    let eeper = &view.eepers[me];
    let body = eeper.footprint();

    if body.contains(view.player) {
        return EeperPlan { path: None, action: Action::ReachFather, eyes: EyeState::Open, eyes_target: view.player };
    }

    let (eyes, eyes_target) = if body.inflate(view.rules.father_wake_radius).contains(view.player) {
        (EyeState::Open, view.player)
    } else {
        (EyeState::Closed, below(eeper))
    };
    EeperPlan { path: None, action: Action::Idle, eyes, eyes_target }
}

fn below(eeper: &Eeper) -> IVec2 {
    eeper.position + IVec2::new(eeper.size.x / 2, eeper.size.y)
}
