/// First-run tutorial: a small phase machine fed by intents and step times.
///
///   Move → WaitingForSprint → Sprint → WaitingForBombPick → PlaceBombs → Done
///
/// Waiting phases are silent. `WaitingForSprint` watches for the player
/// tapping quickly and only then suggests running. `WaitingForBombPick`
/// is advanced from the turn pipeline when the first bomb is collected.

use crate::domain::entity::TurnIntent;

/// Steps closer together than this count as hurrying.
const HURRY_INTERVAL: f64 = 0.2;
const HURRY_THRESHOLD: u32 = 10;
/// Popup grow/shrink rate, per second.
const POPUP_SPEED: f32 = 5.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TutorialPhase {
    Move,
    WaitingForSprint,
    Sprint,
    WaitingForBombPick,
    PlaceBombs,
    Done,
}

impl TutorialPhase {
    pub fn label(self) -> Option<&'static str> {
        match self {
            TutorialPhase::Move => Some("Use arrow keys or WASD to move."),
            TutorialPhase::Sprint => Some("Hold SHIFT to sprint."),
            TutorialPhase::PlaceBombs => Some("Press SPACE to plant a bomb."),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Popup {
    pub label: &'static str,
    pub visible: bool,
    /// 0.0 hidden → 1.0 fully shown.
    pub animation: f32,
}

impl Popup {
    pub fn animate(&mut self, dt: f32) {
        let delta = dt * POPUP_SPEED;
        self.animation = if self.visible {
            (self.animation + delta).min(1.0)
        } else {
            (self.animation - delta).max(0.0)
        };
    }
}

#[derive(Clone, Debug)]
pub struct Tutorial {
    pub phase: TutorialPhase,
    pub hurry_count: u32,
    pub prev_step_at: Option<f64>,
    pub popup: Popup,
    pub knows_how_to_move: bool,
    pub knows_how_to_sprint: bool,
    pub knows_how_to_place_bombs: bool,
}

impl Tutorial {
    pub fn new() -> Self {
        Tutorial {
            phase: TutorialPhase::Move,
            hurry_count: 0,
            prev_step_at: None,
            popup: Popup::default(),
            knows_how_to_move: false,
            knows_how_to_sprint: false,
            knows_how_to_place_bombs: false,
        }
    }

    /// Once per frame, before the turn runs.
    pub fn update(&mut self, intent: &TurnIntent) {
        match self.phase {
            TutorialPhase::Move => {
                if intent.movement.is_some() {
                    self.knows_how_to_move = true;
                    self.advance(TutorialPhase::WaitingForSprint);
                }
            }
            TutorialPhase::WaitingForSprint => {
                if self.hurry_count >= HURRY_THRESHOLD {
                    self.advance(TutorialPhase::Sprint);
                }
            }
            TutorialPhase::Sprint => {
                if intent.running {
                    self.knows_how_to_sprint = true;
                    self.advance(TutorialPhase::WaitingForBombPick);
                }
            }
            TutorialPhase::WaitingForBombPick => {}
            TutorialPhase::PlaceBombs => {
                if intent.place_bomb {
                    self.knows_how_to_place_bombs = true;
                    self.advance(TutorialPhase::Done);
                }
            }
            TutorialPhase::Done => {}
        }
        self.sync_popup();
    }

    /// Record a player step taken at `now` (seconds).
    pub fn track_step(&mut self, now: f64, running: bool) {
        if self.phase != TutorialPhase::WaitingForSprint { return; }

        let hurried = self.prev_step_at.map_or(false, |t| now - t < HURRY_INTERVAL);
        if hurried {
            self.hurry_count += 1;
        } else {
            self.hurry_count = self.hurry_count.saturating_sub(1);
        }
        self.prev_step_at = Some(now);

        if running {
            self.knows_how_to_sprint = true;
        }
    }

    /// The player collected a bomb while holding none.
    pub fn first_bomb_picked(&mut self) {
        if self.phase == TutorialPhase::WaitingForBombPick {
            self.advance(TutorialPhase::PlaceBombs);
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == TutorialPhase::Done
    }

    fn advance(&mut self, next: TutorialPhase) {
        tracing::debug!(from = ?self.phase, to = ?next, "tutorial");
        self.phase = next;
    }

    fn sync_popup(&mut self) {
        match self.phase.label() {
            Some(label) => {
                self.popup.label = label;
                self.popup.visible = true;
            }
            None => self.popup.visible = false,
        }
    }
}

impl Default for Tutorial {
    fn default() -> Self { Self::new() }
}
