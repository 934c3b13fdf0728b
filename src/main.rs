/// Entry point and frame loop.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{debug, error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use eepers::config::{log_file_path, GameConfig};
use eepers::sim::event::GameEvent;
use eepers::sim::level::{default_source, LevelSource};
use eepers::sim::session::Session;
use eepers::ui::input::{Command, InputState};
use eepers::ui::view::View;

fn main() {
    let log_path = init_tracing();

    let config = GameConfig::load();
    let source = default_source(&config.levels_dir);
    let mut session = Session::new(&config);

    if let Err(e) = session.start(&source) {
        error!(error = %e, "could not load the first hub");
        eprintln!("Level load failed: {e}");
        return;
    }

    let mut view = View::new();
    if let Err(e) = view.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut input = InputState::new();
    input.honor_release = enable_release_events();

    let result = frame_loop(&mut session, &mut view, &mut input, &source, &config);

    if input.honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = view.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!("Thanks for playing Eepers! ({} turns)", session.state.turn);
    if let Some(path) = log_path {
        println!("Log: {}", path.display());
    }
}

/// The view owns the terminal, so logs go to a file. Returns its path,
/// or `None` when it could not be opened (logging is then dropped).
fn init_tracing() -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let path = log_file_path();
    let file = path.parent()
        .and_then(|dir| fs::create_dir_all(dir).ok())
        .and_then(|_| File::create(&path).ok());

    let (path, writer) = match file {
        Some(file) => (Some(path), BoxMakeWriter::new(Mutex::new(file))),
        None => (None, BoxMakeWriter::new(io::sink)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    path
}

/// Ask the terminal for key release events. False when unsupported.
fn enable_release_events() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn frame_loop(
    session: &mut Session,
    view: &mut View,
    input: &mut InputState,
    source: &dyn LevelSource,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = Duration::from_millis(config.frame_ms);
    let started = Instant::now();

    loop {
        let frame_start = Instant::now();
        input.drain_events();

        let mut results = Vec::new();
        for cmd in input.commands() {
            match cmd {
                Command::Quit => return Ok(()),
                Command::Restart => results.push(session.start(source)),
                Command::Hub => results.push(session.return_to_hub(source)),
            }
        }

        let now = started.elapsed().as_secs_f64();
        for result in results {
            match result {
                Ok(events) => log_events(&events),
                // A broken level file keeps the current level running
                Err(e) => error!(error = %e, "level transition failed"),
            }
        }
        log_events(&session.frame(&input.intent(), now, source));

        view.render(&session.state)?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LevelLoaded { path, hub } => info!(%path, hub, "level_loaded"),
            GameEvent::GameComplete => info!("game_complete"),
            other => debug!(event = ?other),
        }
    }
}
