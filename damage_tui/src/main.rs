//! damage_tui - Interactive sandbox for armor, damage, power and upgrade rules

mod app;
mod simulation;
mod snapshot;
mod ui;

use app::{App, AppError};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use damage_core::{default_game_data, GameData};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "damage_tui.log";

fn init_logging() -> io::Result<()> {
    let file = File::create(LOG_FILE)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("damage_core=debug,damage_tui=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Shipped data, or the four TOML files of the directory given on the command line
fn load_data() -> Result<GameData, AppError> {
    let data = match std::env::args().nth(1) {
        Some(dir) => GameData::load_dir(Path::new(&dir))?,
        None => default_game_data()?,
    };
    app::check_lineup(&data)?;
    Ok(data)
}

fn main() -> Result<(), AppError> {
    init_logging()?;
    let data = load_data()?;
    let seed = rand::random::<u64>();
    tracing::info!(seed, templates = data.templates.len(), "starting sandbox");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(data, seed);

    // Main loop
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match (key.code, key.modifiers) {
                    (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => break,
                    (KeyCode::Tab, _) => app.next_tab(),
                    (KeyCode::BackTab, _) => app.prev_tab(),
                    (KeyCode::Char('1'), _) => app.set_tab(0),
                    (KeyCode::Char('2'), _) => app.set_tab(1),
                    (KeyCode::Char('3'), _) => app.set_tab(2),
                    (KeyCode::Char('4'), _) => app.set_tab(3),
                    (KeyCode::Char('5'), _) => app.set_tab(4),
                    (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.on_up(),
                    (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.on_down(),
                    (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.on_left(),
                    (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.on_right(),
                    (KeyCode::Enter, _) => app.on_enter(),
                    (KeyCode::Char(' '), _) => app.on_space(),
                    (KeyCode::Char('a'), _) => app.attack(),
                    (KeyCode::Char('H'), _) => app.heal(),
                    (KeyCode::Char('+'), _) => app.adjust_amount(25.0),
                    (KeyCode::Char('-'), _) => app.adjust_amount(-25.0),
                    (KeyCode::Char('t'), _) => app.advance_frames(30),
                    (KeyCode::Char('p'), _) => app.toggle_pause(),
                    (KeyCode::Char('s'), _) => app.sabotage(),
                    (KeyCode::Char('x'), _) => app.steal(),
                    (KeyCode::Char('w'), _) => app.export_snapshot(),
                    (KeyCode::Char('r'), _) => app.reset(),
                    (KeyCode::Char('?'), _) => app.toggle_help(),
                    _ => {}
                }
            }
        }

        app.tick();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    Ok(())
}
