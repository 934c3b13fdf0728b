/// Input state tracker.
///
/// Tracks which keys are currently held down and resolves them into a
/// `TurnIntent` once per frame:
///   - A fresh press of a movement key always moves one turn
///   - A held movement key keeps moving only while running (Shift or
///     uppercase WASD)
///   - Bomb planting is edge-triggered
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::TurnIntent;
use crate::domain::geom::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Out-of-turn requests handled by the binary, not the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Quit,
    Restart,
    Hub,
}

#[derive(Clone, Copy, Debug)]
struct Held {
    since: Instant,
    shift: bool,
    /// Event order; the latest key wins when several are held.
    seq: u64,
}

pub struct InputState {
    /// Last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Held>,

    /// Keys that went from "not held" to "held" during the most recent drain.
    fresh_presses: Vec<KeyCode>,

    commands: Vec<Command>,

    next_seq: u64,

    /// Time of the most recent drain; held-ness is judged against it.
    now: Instant,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            commands: Vec::with_capacity(2),
            next_seq: 0,
            now: Instant::now(),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before `Session::frame`.
    pub fn drain_events(&mut self) {
        self.begin_frame(Instant::now());

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key);
            }
        }

        self.expire();
    }

    fn begin_frame(&mut self, now: Instant) {
        self.now = now;
        self.fresh_presses.clear();
        self.commands.clear();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                return;
            }
            // Not confirmed: rely on the timeout instead
            KeyEventKind::Release => return,
            _ => {}
        }

        if let Some(cmd) = command_for(&key) {
            if key.kind == KeyEventKind::Press {
                self.commands.push(cmd);
            }
            return;
        }

        let was_held = self.is_held(key.code);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        self.next_seq += 1;
        self.last_active.insert(key.code, Held { since: self.now, shift, seq: self.next_seq });
        if !was_held {
            self.fresh_presses.push(key.code);
        }
    }

    fn expire(&mut self) {
        let now = self.now;
        self.last_active.retain(|_, h| now.duration_since(h.since) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |h| self.now.duration_since(h.since) < HOLD_TIMEOUT)
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Resolve this frame's keys into a turn request.
    pub fn intent(&self) -> TurnIntent {
        let mut intent = TurnIntent {
            place_bomb: self.was_pressed(KeyCode::Char(' ')),
            ..Default::default()
        };

        // Latest fresh press first
        for code in self.fresh_presses.iter().rev() {
            if let Some((dir, upper)) = movement_for(*code) {
                intent.movement = Some(dir);
                intent.running = upper || self.shift_on(*code);
                return intent;
            }
        }

        let running = self.last_active.iter()
            .filter(|(code, _)| self.is_held(**code))
            .filter_map(|(code, held)| {
                let (dir, upper) = movement_for(*code)?;
                (upper || held.shift).then_some((held.seq, dir))
            })
            .max_by_key(|(seq, _)| *seq);

        if let Some((_, dir)) = running {
            intent.movement = Some(dir);
            intent.running = true;
        }
        intent
    }

    fn shift_on(&self, code: KeyCode) -> bool {
        self.last_active.get(&code).map_or(false, |h| h.shift)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Key mapping ──

/// Movement direction for a key, plus whether the key itself means running.
fn movement_for(code: KeyCode) -> Option<(Direction, bool)> {
    match code {
        KeyCode::Up => Some((Direction::Up, false)),
        KeyCode::Down => Some((Direction::Down, false)),
        KeyCode::Left => Some((Direction::Left, false)),
        KeyCode::Right => Some((Direction::Right, false)),
        KeyCode::Char(c) => {
            let dir = match c.to_ascii_lowercase() {
                'w' => Direction::Up,
                's' => Direction::Down,
                'a' => Direction::Left,
                'd' => Direction::Right,
                _ => return None,
            };
            Some((dir, c.is_ascii_uppercase()))
        }
        _ => None,
    }
}

fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(Command::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('r') => Some(Command::Restart),
        KeyCode::Char('h') => Some(Command::Hub),
        _ => None,
    }
}
