/// Terminal view for the binary: one glyph pair per cell, HUD below the map.
///
/// Rows are composed into strings and compared with the previous frame;
/// only changed rows are rewritten. Commands are batched with `queue!`
/// and flushed once per frame.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Print, ResetColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Cell;
use crate::domain::entity::{EeperKind, ItemKind};
use crate::domain::geom::IVec2;
use crate::sim::world::SimState;

/// Terminal columns per game cell.
const CELL_W: usize = 2;

pub struct View {
    writer: BufWriter<Stdout>,
    back: Vec<String>,
}

impl View {
    pub fn new() -> Self {
        View { writer: BufWriter::with_capacity(16384, io::stdout()), back: Vec::new() }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.writer, terminal::EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, s: &SimState) -> io::Result<()> {
        let front = compose(s);
        if front.len() != self.back.len() {
            queue!(self.writer, Clear(ClearType::All))?;
            self.back.clear();
        }
        for (row, line) in front.iter().enumerate() {
            if self.back.get(row) == Some(line) {
                continue;
            }
            queue!(
                self.writer,
                MoveTo(0, row as u16),
                Clear(ClearType::CurrentLine),
                Print(line)
            )?;
        }
        self.writer.flush()?;
        self.back = front;
        Ok(())
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

// ── Composition ──

fn compose(s: &SimState) -> Vec<String> {
    let mut lines = Vec::with_capacity(s.grid.height() as usize + 3);
    for y in 0..s.grid.height() {
        let mut line = String::with_capacity(s.grid.width() as usize * CELL_W);
        for x in 0..s.grid.width() {
            let g = glyph(s, IVec2::new(x, y));
            for _ in 0..CELL_W {
                line.push(g);
            }
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(hud(s));
    lines.push(status(s).to_string());
    lines
}

/// The character drawn for one cell, topmost layer first.
fn glyph(s: &SimState, p: IVec2) -> char {
    if s.player.position == p {
        return if s.player.dead { 'x' } else { '@' };
    }
    if let Some(e) = s.live_eepers().find(|e| e.overlaps_cell(p)) {
        return match e.kind {
            EeperKind::Guard => 'G',
            EeperKind::Mother => 'M',
            EeperKind::Gnome => 'n',
            EeperKind::Father => 'F',
        };
    }
    if s.grid.at(p) == Cell::Explosion {
        return '*';
    }
    if let Some(b) = s.bombs.iter().find(|b| b.position == p) {
        return char::from_digit(b.countdown.min(9), 10).unwrap_or('o');
    }
    if let Some(item) = s.items.iter().find(|i| i.position == p) {
        return match item.kind {
            ItemKind::Key => 'k',
            ItemKind::BombRefill if item.cooldown > 0 => ',',
            ItemKind::BombRefill => 'b',
            ItemKind::BombSlot => 's',
            ItemKind::Checkpoint => 'c',
        };
    }
    if let Some(portal) = s.portals.iter().find(|g| g.contains(p)) {
        if portal.center == p {
            return char::from_digit(portal.id.min(9), 10).unwrap_or('O');
        }
        return if portal.open_progress > 0.5 { 'O' } else { 'o' };
    }
    match s.grid.at(p) {
        Cell::None => ' ',
        Cell::Floor => '.',
        Cell::Wall => '#',
        Cell::Door => 'D',
        Cell::Barricade => '%',
        Cell::Explosion => '*',
    }
}

fn hud(s: &SimState) -> String {
    let world = s.worlds.current_name().unwrap_or("?");
    format!(
        "{world} / {}   keys {}   bombs {}/{}   turn {}   zoom {:.2}",
        s.level_path, s.player.keys, s.player.bombs, s.player.bomb_slots, s.turn, s.view_zoom
    )
}

fn status(s: &SimState) -> &'static str {
    if s.player.dead {
        "You were caught..."
    } else if s.player.victory_time.is_some() {
        "Dad is awake. Well done!"
    } else if s.player.portal_entry.is_some() {
        "Falling through the gate..."
    } else if s.tutorial.popup.visible {
        s.tutorial.popup.label
    } else {
        "arrows/WASD move  SHIFT run  SPACE bomb  r restart  h hub  q quit"
    }
}
