#[macro_use]
extern crate prettytable;

use anyhow::{anyhow, Context};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use directories::ProjectDirs;
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod interface;
mod model;
mod theme;
mod ui;

use app::App;
use cli::{Command::*, CommandLineArgs};
use model::Store;

const DATABASE_FILE: &str = "tasks.db";
const LOG_FILE: &str = "worklog.log";

/// The application data directory, created if missing.
fn find_data_dir() -> Option<PathBuf> {
    let base_dirs = ProjectDirs::from("com", "gozque", "worklog")?;
    let root_dir = base_dirs.data_dir();
    if !root_dir.exists() {
        std::fs::create_dir_all(root_dir).ok()?;
    }
    Some(root_dir.to_path_buf())
}

/// Send tracing events to a file: the terminal belongs to the window.
/// The level comes from RUST_LOG and defaults to info.
fn install_tracing(log_path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}.", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let CommandLineArgs {
        action,
        database_file,
        log_file,
    } = CommandLineArgs::from_args();

    let data_dir = find_data_dir();
    let database_file = database_file
        .or_else(|| data_dir.as_ref().map(|dir| dir.join(DATABASE_FILE)))
        .ok_or_else(|| anyhow!("Failed to find database file."))?;
    let log_file = log_file
        .or_else(|| data_dir.as_ref().map(|dir| dir.join(LOG_FILE)))
        .ok_or_else(|| anyhow!("Failed to find log file."))?;

    install_tracing(&log_file)?;
    tracing::info!(database = %database_file.display(), "opening task database");

    let store = Store::open(&database_file)?;

    // Perform the action.
    let store = match action {
        None => run_window(store)?,
        Some(List) => {
            interface::list(&store)?;
            store
        }
        Some(Start { user, description }) => {
            interface::start(&store, &user, &description)?;
            store
        }
        Some(End { id }) => {
            interface::end(&store, id)?;
            store
        }
    };
    store.close()
}

/// Take over the terminal, run the window until the user quits and hand
/// the store back.
fn run_window(store: Store) -> anyhow::Result<Store> {
    let mut app = App::new(store)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(app.into_store())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
        if app.should_quit() {
            tracing::info!("window closed");
            return Ok(());
        }
    }
}
