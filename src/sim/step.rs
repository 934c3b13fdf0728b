/// The turn pipeline: advances the simulation by one discrete turn.
///
/// Processing order (fixed):
///   1. Player move / door / item pickup / portal check
///   2. Item cooldowns
///   3. Eeper AI (decide → apply, one eeper at a time)
///   4. Bomb countdowns → explosions → damage resolution
///
/// Planting a bomb is a separate action that does not advance the turn.
/// Explosions and portals animate on the frame clock via
/// `update_explosions` / `update_portals`.

use tracing::{debug, info};

use crate::domain::ai::{self, Action, AiView, EeperPlan};
use crate::domain::cell::Cell;
use crate::domain::entity::{Bomb, EeperKind, EyeState, Explosion, ItemKind, PortalEntry};
use crate::domain::geom::{Direction, IVec2};
use crate::domain::rules;
use super::checkpoint::save_checkpoint;
use super::event::GameEvent;
use super::world::SimState;

/// Offsets of the guards that replace a dead mother, tiling her 7×7 body.
const MOTHER_BROOD: [IVec2; 4] = [
    IVec2 { x: 0, y: 0 },
    IVec2 { x: 4, y: 0 },
    IVec2 { x: 0, y: 4 },
    IVec2 { x: 4, y: 4 },
];

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// One turn in direction `dir`. `now` is wall-clock seconds, stored only
/// as timestamps. No-op while dead, entering a portal or victorious.
pub fn turn(state: &mut SimState, dir: Direction, now: f64) -> Vec<GameEvent> {
    if !state.accepts_turns() { return vec![]; }

    let mut events = Vec::new();
    state.turn += 1;

    player_turn(state, dir, now, &mut events);
    items_turn(state);
    update_eepers(state, now, &mut events);
    update_bombs(state, now, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn player_turn(state: &mut SimState, dir: Direction, now: f64, events: &mut Vec<GameEvent>) {
    let player = &mut state.player;
    player.prev_position = player.position;
    player.facing = dir;
    let target = player.position + dir.unit();
    player.eyes_target = target + dir.unit();

    match state.grid.get(target) {
        Some(Cell::Floor) => {
            state.player.position = target;
            events.push(GameEvent::Footstep { at: target });
            pick_up_items(state, target, events);
            check_portal_entry(state, target, now, events);
        }
        Some(Cell::Door) if state.player.keys > 0 => {
            state.player.keys -= 1;
            let cells = rules::open_door_cluster(&mut state.grid, target);
            state.player.position = target;
            info!(x = target.x, y = target.y, cells, "door_opened");
            events.push(GameEvent::DoorOpened { at: target, cells });
        }
        // Walls, barricades, locked doors, void, off-map
        _ => {}
    }
}

fn pick_up_items(state: &mut SimState, at: IVec2, events: &mut Vec<GameEvent>) {
    let mut checkpoint = false;
    let mut i = 0;
    while i < state.items.len() {
        let item = state.items[i];
        if item.position != at {
            i += 1;
            continue;
        }

        let player = &mut state.player;
        match item.kind {
            ItemKind::Key => {
                player.keys += 1;
                state.items.remove(i);
                events.push(GameEvent::ItemPicked { kind: item.kind, at });
            }
            ItemKind::BombSlot => {
                player.bomb_slots += 1;
                state.items.remove(i);
                events.push(GameEvent::ItemPicked { kind: item.kind, at });
            }
            ItemKind::Checkpoint => {
                checkpoint = true;
                state.items.remove(i);
                events.push(GameEvent::ItemPicked { kind: item.kind, at });
            }
            ItemKind::BombRefill => {
                // Refills stay on the map and recharge
                if player.bombs < player.bomb_slots && item.cooldown == 0 {
                    if player.bombs == 0 {
                        state.tutorial.first_bomb_picked();
                    }
                    player.bombs += 1;
                    state.items[i].cooldown = state.rules.bomb_refill_cooldown;
                    events.push(GameEvent::ItemPicked { kind: item.kind, at });
                }
                i += 1;
            }
        }
    }

    if checkpoint {
        save_checkpoint(state);
        events.push(GameEvent::CheckpointSaved);
    }
}

fn check_portal_entry(state: &mut SimState, at: IVec2, now: f64, events: &mut Vec<GameEvent>) {
    let threshold = state.rules.portal_enter_progress;
    let Some(portal) = state.portals.iter_mut()
        .find(|p| p.contains(at) && p.open_progress > threshold)
    else { return };

    portal.activated = true;
    state.player.portal_entry = Some(PortalEntry { portal_id: portal.id, started_at: now });
    info!(portal = portal.id, "portal_entered");
    events.push(GameEvent::PortalEntered { id: portal.id });
}

/// Drop a bomb under the player. Does not advance the turn.
pub fn plant_bomb(state: &mut SimState) -> Vec<GameEvent> {
    if !state.accepts_turns() || state.player.bombs == 0 { return vec![]; }

    state.player.bombs -= 1;
    let at = state.player.position;
    state.bombs.push(Bomb { position: at, countdown: state.rules.bomb_countdown });
    debug!(x = at.x, y = at.y, "bomb_planted");
    vec![GameEvent::BombPlanted { at }]
}

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

fn items_turn(state: &mut SimState) {
    for item in &mut state.items {
        item.cooldown = item.cooldown.saturating_sub(1);
    }
}

// ══════════════════════════════════════════════════════════════
// Eepers
// ══════════════════════════════════════════════════════════════

fn update_eepers(state: &mut SimState, now: f64, events: &mut Vec<GameEvent>) {
    for i in 0..state.eepers.len() {
        if state.eepers[i].dead { continue; }

        let plan = {
            let view = AiView {
                grid: &state.grid,
                eepers: &state.eepers,
                player: state.player.position,
                rules: &state.rules,
            };
            ai::decide(&view, i)
        };
        apply_plan(state, i, plan, now, events);
    }
}

fn apply_plan(state: &mut SimState, i: usize, plan: EeperPlan, now: f64, events: &mut Vec<GameEvent>) {
    let EeperPlan { path, action, eyes, eyes_target } = plan;
    let heal = state.rules.eeper_heal_rate;

    let eeper = &mut state.eepers[i];
    let kind = eeper.kind;
    eeper.prev_position = eeper.position;
    eeper.eyes = eyes;
    eeper.eyes_target = eyes_target;
    if let Some(path) = path {
        eeper.path = path;
    }
    if kind.is_hunter() {
        eeper.health = (eeper.health + heal).min(1.0);
    }
    debug!(eeper = i, ?kind, ?action, "eeper_turn");

    match action {
        Action::Idle => {}
        Action::Catch => catch_player(state, now, events),
        Action::Wait => state.eepers[i].attack_cooldown -= 1,
        Action::Lunge(targets) => {
            if let Some(to) = state.choose(&targets) {
                move_eeper(state, i, to, events);
            }
            state.eepers[i].attack_cooldown = state.rules.guard_attack_cooldown;
            if state.eepers[i].overlaps_cell(state.player.position) {
                catch_player(state, now, events);
            }
        }
        Action::Flee(targets) => {
            if let Some(to) = state.choose(&targets) {
                move_eeper(state, i, to, events);
            }
        }
        Action::ReachFather => {
            if state.player.victory_time.is_none() {
                state.player.victory_time = Some(now);
                info!(turn = state.turn, "victory");
                events.push(GameEvent::Victory);
            }
        }
    }
}

fn move_eeper(state: &mut SimState, i: usize, to: IVec2, events: &mut Vec<GameEvent>) {
    let eeper = &mut state.eepers[i];
    let from = eeper.position;
    eeper.position = to;
    events.push(GameEvent::EeperStep { index: i, kind: eeper.kind, from, to });
}

fn catch_player(state: &mut SimState, now: f64, events: &mut Vec<GameEvent>) {
    if state.player.kill(now) {
        info!(x = state.player.position.x, y = state.player.position.y, "player_killed");
        events.push(GameEvent::PlayerKilled);
    }
}

// ══════════════════════════════════════════════════════════════
// Bombs / explosions
// ══════════════════════════════════════════════════════════════

fn update_bombs(state: &mut SimState, now: f64, events: &mut Vec<GameEvent>) {
    for eeper in &mut state.eepers {
        eeper.damaged = false;
    }

    let mut fired = Vec::new();
    state.bombs.retain_mut(|bomb| {
        bomb.countdown = bomb.countdown.saturating_sub(1);
        if bomb.countdown == 0 {
            fired.push(bomb.position);
            false
        } else {
            true
        }
    });

    for at in fired {
        explode(state, at, now, events);
    }
    resolve_damage(state, events);
}

/// Blast at `origin`: a cross of `explosion_range` cells, stopped by walls,
/// doors and void; a barricade hit consumes its whole 4-connected region.
/// Marks every overlapped eeper as damaged and kills the player if caught.
pub fn explode(state: &mut SimState, origin: IVec2, now: f64, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Blast { at: origin });
    ignite(state, origin, now, events);

    let range = state.rules.explosion_range;
    for dir in Direction::ALL {
        for step in 1..=range {
            let p = origin + dir.unit() * step;
            let Some(cell) = state.grid.get(p) else { break };
            if cell.stops_blast() { break; }

            if cell == Cell::Barricade {
                let region = rules::region(&state.grid, p, Cell::Barricade);
                events.push(GameEvent::BarricadeDestroyed { cells: region.len() });
                for c in region {
                    ignite(state, c, now, events);
                }
                break;
            }
            ignite(state, p, now, events);
        }
    }
}

fn ignite(state: &mut SimState, p: IVec2, now: f64, events: &mut Vec<GameEvent>) {
    if !state.grid.set(p, Cell::Explosion) { return; }

    match state.explosions.iter().position(|e| e.position == p) {
        Some(k) => {
            let e = &mut state.explosions[k];
            e.timer = e.initial_timer;
        }
        None => {
            let lifetime = state.rules.explosion_lifetime;
            state.explosions.push(Explosion::new(p, lifetime));
        }
    }

    if state.player.position == p {
        catch_player(state, now, events);
    }
    for eeper in &mut state.eepers {
        if !eeper.dead && eeper.overlaps_cell(p) {
            eeper.damaged = true;
        }
    }
}

fn resolve_damage(state: &mut SimState, events: &mut Vec<GameEvent>) {
    let damage = state.rules.explosion_damage;
    let mut broods = Vec::new();
    let mut keys = Vec::new();

    for (i, eeper) in state.eepers.iter_mut().enumerate() {
        if eeper.dead || !eeper.damaged { continue; }

        match eeper.kind {
            EeperKind::Guard | EeperKind::Mother => {
                eeper.eyes = EyeState::Cringe;
                eeper.health -= damage;
                events.push(GameEvent::EeperDamaged { index: i, health: eeper.health.max(0.0) });
                if eeper.health <= 0.0 {
                    eeper.health = 0.0;
                    eeper.dead = true;
                    events.push(GameEvent::EeperKilled { index: i, kind: eeper.kind, at: eeper.position });
                    if eeper.kind == EeperKind::Mother {
                        broods.push(eeper.position);
                    }
                }
            }
            EeperKind::Gnome => {
                eeper.dead = true;
                events.push(GameEvent::EeperKilled { index: i, kind: eeper.kind, at: eeper.position });
                keys.push(eeper.position);
            }
            EeperKind::Father => {}
        }
    }

    for at in keys {
        state.spawn_item(ItemKind::Key, at);
        events.push(GameEvent::KeyDropped { at });
    }
    for origin in broods {
        for off in MOTHER_BROOD {
            state.spawn_eeper(EeperKind::Guard, origin + off);
        }
        info!(x = origin.x, y = origin.y, "mother_split");
        events.push(GameEvent::GuardsSpawned { count: MOTHER_BROOD.len() });
    }
}

// ══════════════════════════════════════════════════════════════
// Frame clock
// ══════════════════════════════════════════════════════════════

/// Once per rendered frame: age explosions, revert expired ones to floor.
pub fn update_explosions(state: &mut SimState) {
    let grid = &mut state.grid;
    state.explosions.retain_mut(|e| {
        e.timer = e.timer.saturating_sub(1);
        if e.timer == 0 {
            grid.set(e.position, Cell::Floor);
            false
        } else {
            true
        }
    });
}

/// Once per rendered frame: open portals near the player, close the rest.
pub fn update_portals(state: &mut SimState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let player = state.player.position;
    let rules = &state.rules;

    for portal in &mut state.portals {
        let prev = portal.open_progress;
        if portal.distance_sq(player) < rules.portal_open_distance_sq {
            portal.open_progress = (prev + rules.portal_open_speed).min(1.0);
            if prev <= 0.0 && portal.open_progress > 0.0 {
                events.push(GameEvent::PortalOpening { id: portal.id });
            }
        } else {
            portal.open_progress = (prev - rules.portal_close_speed).max(0.0);
            if prev >= 1.0 && portal.open_progress < 1.0 {
                events.push(GameEvent::PortalClosing { id: portal.id });
            }
        }
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::domain::cell::Grid;
    use crate::domain::entity::{Item, Portal};
    use crate::sim::tutorial::TutorialPhase;

    /// Legend: '#'=Wall  '.'=Floor  'D'=Door  '%'=Barricade  ' '=None
    fn grid_from(rows: &[&str]) -> Grid {
        let mut g = Grid::new(rows[0].len() as i32, rows.len() as i32, Cell::None);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let c = match ch {
                    '#' => Cell::Wall,
                    '.' => Cell::Floor,
                    'D' => Cell::Door,
                    '%' => Cell::Barricade,
                    _ => Cell::None,
                };
                g.set(IVec2::new(x as i32, y as i32), c);
            }
        }
        g
    }

    fn room(w: i32, h: i32, player: IVec2) -> SimState {
        SimState::with_grid(Grid::new(w, h, Cell::Floor), player, Rules::default())
    }

    fn count_blasts(events: &[GameEvent]) -> usize {
        events.iter().filter(|e| matches!(e, GameEvent::Blast { .. })).count()
    }

    // ── Player ──

    #[test]
    fn door_unlock_scenario() {
        let mut s = SimState::with_grid(
            grid_from(&[
                "..D.",
                "...D",
            ]),
            IVec2::new(1, 0),
            Rules::default(),
        );
        s.items.push(Item::new(ItemKind::Key, IVec2::new(1, 1)));

        // Locked without a key
        turn(&mut s, Direction::Right, 0.0);
        assert_eq!(s.player.position, IVec2::new(1, 0));
        assert_eq!(s.grid.at(IVec2::new(2, 0)), Cell::Door);

        turn(&mut s, Direction::Down, 0.1);
        assert_eq!(s.player.keys, 1);
        assert!(s.items.is_empty());
        turn(&mut s, Direction::Up, 0.2);

        let events = turn(&mut s, Direction::Right, 0.3);
        assert_eq!(s.player.keys, 0);
        assert_eq!(s.player.position, IVec2::new(2, 0));
        assert_eq!(s.grid.at(IVec2::new(2, 0)), Cell::Floor);
        assert_eq!(s.grid.at(IVec2::new(3, 1)), Cell::Floor);
        assert!(events.contains(&GameEvent::DoorOpened { at: IVec2::new(2, 0), cells: 2 }));
    }

    #[test]
    fn barricades_block_the_player() {
        let mut s = SimState::with_grid(grid_from(&[".%."]), IVec2::ZERO, Rules::default());
        s.player.keys = 1;
        turn(&mut s, Direction::Right, 0.0);
        assert_eq!(s.player.position, IVec2::ZERO);
        assert_eq!(s.player.keys, 1);
    }

    #[test]
    fn off_map_move_still_turns_the_player() {
        let mut s = room(3, 3, IVec2::ZERO);
        let events = turn(&mut s, Direction::Left, 0.0);
        assert_eq!(s.player.position, IVec2::ZERO);
        assert_eq!(s.player.facing, Direction::Left);
        assert_eq!(s.turn, 1);
        assert!(events.is_empty());
    }

    #[test]
    fn bomb_refill_recharges_in_place() {
        let mut s = room(5, 1, IVec2::ZERO);
        s.tutorial.phase = TutorialPhase::WaitingForBombPick;
        s.items.push(Item::new(ItemKind::BombRefill, IVec2::new(1, 0)));

        turn(&mut s, Direction::Right, 0.0);
        assert_eq!(s.player.bombs, 1);
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].cooldown, 9); // ticked once this turn
        assert_eq!(s.tutorial.phase, TutorialPhase::PlaceBombs);

        // Full: no pickup even once recharged
        turn(&mut s, Direction::Left, 0.1);
        turn(&mut s, Direction::Right, 0.2);
        assert_eq!(s.player.bombs, 1);

        // Spend it, then the cooldown still blocks
        plant_bomb(&mut s);
        turn(&mut s, Direction::Right, 0.3);
        turn(&mut s, Direction::Left, 0.4);
        assert_eq!(s.player.bombs, 0);
        assert!(s.items[0].cooldown > 0);
    }

    #[test]
    fn bomb_slot_and_checkpoint_pickups() {
        let mut s = room(4, 1, IVec2::ZERO);
        s.items.push(Item::new(ItemKind::BombSlot, IVec2::new(1, 0)));
        s.items.push(Item::new(ItemKind::Checkpoint, IVec2::new(2, 0)));

        turn(&mut s, Direction::Right, 0.0);
        assert_eq!(s.player.bomb_slots, 2);

        let events = turn(&mut s, Direction::Right, 0.1);
        assert!(events.contains(&GameEvent::CheckpointSaved));
        assert!(s.items.is_empty());
        let cp = s.checkpoint.as_ref().unwrap();
        assert_eq!(cp.player_position, IVec2::new(2, 0));
        assert_eq!(cp.bomb_slots, 2);
    }

    #[test]
    fn open_portal_starts_entry() {
        let mut s = room(10, 10, IVec2::new(5, 2));
        s.portals.push(Portal::new(1, IVec2::new(5, 5)));
        s.portals[0].open_progress = 1.0;

        turn(&mut s, Direction::Down, 1.0);
        assert!(s.player.portal_entry.is_none()); // (5,3) is outside the gate

        let events = turn(&mut s, Direction::Down, 2.0);
        assert_eq!(s.player.portal_entry, Some(PortalEntry { portal_id: 1, started_at: 2.0 }));
        assert!(events.contains(&GameEvent::PortalEntered { id: 1 }));
        // Further turns wait for the level switch
        assert!(turn(&mut s, Direction::Down, 2.1).is_empty());
    }

    #[test]
    fn half_open_portal_is_not_entered() {
        let mut s = room(10, 10, IVec2::new(5, 3));
        s.portals.push(Portal::new(1, IVec2::new(5, 5)));
        s.portals[0].open_progress = 0.6;
        turn(&mut s, Direction::Down, 0.0);
        assert!(s.player.portal_entry.is_none());
    }

    // ── Eepers ──

    #[test]
    fn gnome_flees_scenario() {
        for seed in 0..8 {
            let mut s = room(5, 3, IVec2::new(0, 2));
            s.rules.gnome_step_limit = 10;
            s.reseed(seed);
            s.spawn_eeper(EeperKind::Gnome, IVec2::new(2, 1));

            // Player bumps the map edge and stays put
            turn(&mut s, Direction::Left, 0.0);
            let at = s.eepers[0].position;
            assert!(at == IVec2::new(2, 0) || at == IVec2::new(3, 1), "gnome went to {at:?}");
            assert_eq!(s.eepers[0].eyes, EyeState::Surprised);
        }
    }

    #[test]
    fn guard_lunge_catches_player() {
        let mut s = room(12, 3, IVec2::new(11, 1));
        s.rules.guard_step_limit = 10;
        s.spawn_eeper(EeperKind::Guard, IVec2::new(0, 0));

        let events = turn(&mut s, Direction::Right, 5.0);
        assert_eq!(s.eepers[0].position, IVec2::new(9, 0));
        assert_eq!(s.eepers[0].attack_cooldown, 10);
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert!(s.player.dead);
        assert_eq!(s.player.death_time, 5.0);
        assert!(turn(&mut s, Direction::Left, 6.0).is_empty());
    }

    #[test]
    fn guard_cooldown_ticks_only_when_player_reachable() {
        let mut s = SimState::with_grid(
            grid_from(&[
                "....#..",
                "....#..",
                "....#..",
            ]),
            IVec2::new(6, 1),
            Rules::default(),
        );
        let g = s.spawn_eeper(EeperKind::Guard, IVec2::new(0, 0));
        s.eepers[g].attack_cooldown = 3;
        s.eepers[g].health = 0.995;

        turn(&mut s, Direction::Right, 0.0);
        assert_eq!(s.eepers[g].attack_cooldown, 3);
        assert_eq!(s.eepers[g].eyes, EyeState::Closed);
        assert_eq!(s.eepers[g].health, 1.0);
    }

    #[test]
    fn reaching_father_wins_once() {
        let mut s = room(12, 12, IVec2::new(4, 5));
        s.spawn_eeper(EeperKind::Father, IVec2::new(5, 5));

        let events = turn(&mut s, Direction::Right, 3.0);
        assert!(events.contains(&GameEvent::Victory));
        assert_eq!(s.player.victory_time, Some(3.0));
        assert!(turn(&mut s, Direction::Right, 4.0).is_empty());
        assert_eq!(s.player.victory_time, Some(3.0));
    }

    // ── Bombs ──

    #[test]
    fn bomb_fires_exactly_n_turns_later() {
        let mut s = room(12, 5, IVec2::new(1, 1));
        s.player.bombs = 1;
        assert_eq!(plant_bomb(&mut s), vec![GameEvent::BombPlanted { at: IVec2::new(1, 1) }]);
        assert_eq!(s.player.bombs, 0);
        assert!(plant_bomb(&mut s).is_empty());

        let mut blasts = 0;
        for (n, dir) in [Direction::Down, Direction::Right, Direction::Right].into_iter().enumerate() {
            blasts += count_blasts(&turn(&mut s, dir, n as f64));
            if n < 2 {
                assert_eq!(s.bombs.len(), 1);
                assert_eq!(blasts, 0);
            }
        }
        assert_eq!(blasts, 1);
        assert!(s.bombs.is_empty());
        assert_eq!(s.grid.at(IVec2::new(1, 1)), Cell::Explosion);
        assert!(!s.player.dead); // (3,2) is off the cross

        assert_eq!(count_blasts(&turn(&mut s, Direction::Right, 4.0)), 0);
    }

    #[test]
    fn player_in_blast_dies() {
        let mut s = room(8, 1, IVec2::new(3, 0));
        let mut events = vec![];
        explode(&mut s, IVec2::new(0, 0), 1.5, &mut events);
        assert!(s.player.dead);
        assert!(events.contains(&GameEvent::PlayerKilled));
    }

    #[test]
    fn blast_stops_at_walls_and_doors() {
        let mut s = SimState::with_grid(
            grid_from(&[
                "..#...",
                "......",
                "D.....",
                "......",
            ]),
            IVec2::new(5, 3),
            Rules::default(),
        );
        let gnome = s.spawn_eeper(EeperKind::Gnome, IVec2::new(3, 0));
        let mut events = vec![];
        explode(&mut s, IVec2::new(0, 0), 0.0, &mut events);

        assert_eq!(s.grid.at(IVec2::new(1, 0)), Cell::Explosion);
        assert_eq!(s.grid.at(IVec2::new(2, 0)), Cell::Wall);
        assert_eq!(s.grid.at(IVec2::new(3, 0)), Cell::Floor);
        assert_eq!(s.grid.at(IVec2::new(0, 1)), Cell::Explosion);
        assert_eq!(s.grid.at(IVec2::new(0, 2)), Cell::Door);
        assert_eq!(s.grid.at(IVec2::new(0, 3)), Cell::Floor);
        assert!(!s.eepers[gnome].damaged);
    }

    #[test]
    fn blast_consumes_whole_barricade_region() {
        let mut s = SimState::with_grid(
            grid_from(&[
                ".%%..",
                "..%..",
                "...%.",
            ]),
            IVec2::new(4, 0),
            Rules::default(),
        );
        let mut events = vec![];
        explode(&mut s, IVec2::new(0, 0), 0.0, &mut events);

        for p in [IVec2::new(1, 0), IVec2::new(2, 0), IVec2::new(2, 1)] {
            assert_eq!(s.grid.at(p), Cell::Explosion);
        }
        assert_eq!(s.grid.at(IVec2::new(3, 2)), Cell::Barricade);
        assert_eq!(s.grid.at(IVec2::new(3, 0)), Cell::Floor); // stopped behind
        assert!(events.contains(&GameEvent::BarricadeDestroyed { cells: 3 }));
        assert!(!s.player.dead);
    }

    #[test]
    fn guard_dies_on_third_hit() {
        let mut s = room(12, 12, IVec2::new(0, 0));
        let g = s.spawn_eeper(EeperKind::Guard, IVec2::new(4, 4));
        s.eepers[g].attack_cooldown = 100;

        let hit = |s: &mut SimState| {
            s.bombs.push(Bomb { position: IVec2::new(5, 5), countdown: 1 });
            let mut events = vec![];
            update_bombs(s, 0.0, &mut events);
            events
        };

        hit(&mut s);
        assert!(!s.eepers[g].dead);
        assert!((s.eepers[g].health - 0.55).abs() < 1e-4);
        assert_eq!(s.eepers[g].eyes, EyeState::Cringe);
        hit(&mut s);
        assert!(!s.eepers[g].dead);
        assert!(s.eepers[g].health > 0.0);
        let events = hit(&mut s);
        assert!(s.eepers[g].dead);
        assert!(events.iter().any(|e| matches!(e, GameEvent::EeperKilled { kind: EeperKind::Guard, .. })));
    }

    #[test]
    fn mother_death_spawns_four_guards() {
        let mut s = room(24, 24, IVec2::new(0, 0));
        s.spawn_eeper(EeperKind::Mother, IVec2::new(10, 10));
        s.eepers[0].health = 0.4;
        s.bombs.push(Bomb { position: IVec2::new(12, 12), countdown: 1 });

        let mut events = vec![];
        update_bombs(&mut s, 0.0, &mut events);

        let mut guards: Vec<IVec2> = s.live_eepers()
            .inspect(|e| {
                assert_eq!(e.kind, EeperKind::Guard);
                assert_eq!(e.health, 1.0);
            })
            .map(|e| e.position)
            .collect();
        guards.sort_by_key(|p| (p.y, p.x));
        assert_eq!(guards, vec![
            IVec2::new(10, 10), IVec2::new(14, 10),
            IVec2::new(10, 14), IVec2::new(14, 14),
        ]);
        assert!(events.contains(&GameEvent::GuardsSpawned { count: 4 }));
    }

    #[test]
    fn gnome_drops_key_and_father_shrugs() {
        let mut s = room(20, 20, IVec2::new(19, 19));
        let gnome = s.spawn_eeper(EeperKind::Gnome, IVec2::new(2, 0));
        let father = s.spawn_eeper(EeperKind::Father, IVec2::new(0, 3));
        s.bombs.push(Bomb { position: IVec2::new(0, 0), countdown: 1 });

        let mut events = vec![];
        update_bombs(&mut s, 0.0, &mut events);
        assert!(s.eepers[gnome].dead);
        assert!(!s.eepers[father].dead);
        assert_eq!(s.items, vec![Item::new(ItemKind::Key, IVec2::new(2, 0))]);
    }

    // ── Frame clock ──

    #[test]
    fn explosions_fade_back_to_floor() {
        let mut s = room(3, 1, IVec2::new(2, 0));
        s.rules.explosion_lifetime = 2;
        s.rules.explosion_range = 1;
        let mut events = vec![];
        explode(&mut s, IVec2::ZERO, 0.0, &mut events);
        assert_eq!(s.explosions.len(), 2);

        update_explosions(&mut s);
        assert_eq!(s.grid.at(IVec2::ZERO), Cell::Explosion);
        update_explosions(&mut s);
        assert!(s.explosions.is_empty());
        assert_eq!(s.grid.count(Cell::Explosion), 0);
    }

    #[test]
    fn reignite_refreshes_instead_of_stacking() {
        let mut s = room(5, 5, IVec2::new(4, 4));
        let mut events = vec![];
        explode(&mut s, IVec2::ZERO, 0.0, &mut events);
        let n = s.explosions.len();
        update_explosions(&mut s);
        explode(&mut s, IVec2::ZERO, 0.0, &mut events);
        assert_eq!(s.explosions.len(), n);
        assert!(s.explosions.iter().all(|e| e.timer == e.initial_timer));
    }

    #[test]
    fn portals_open_near_and_close_far() {
        let mut s = room(20, 5, IVec2::new(2, 2));
        s.portals.push(Portal::new(1, IVec2::new(3, 2)));

        let events = update_portals(&mut s);
        assert_eq!(events, vec![GameEvent::PortalOpening { id: 1 }]);
        for _ in 0..10 { update_portals(&mut s); }
        assert_eq!(s.portals[0].open_progress, 1.0);

        s.player.position = IVec2::new(6, 2); // distance² 9: not strictly inside
        assert_eq!(update_portals(&mut s), vec![GameEvent::PortalClosing { id: 1 }]);
        for _ in 0..10 { update_portals(&mut s); }
        assert_eq!(s.portals[0].open_progress, 0.0);
    }
}
