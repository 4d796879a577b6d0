use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mx_atlas::{config::AppConfig, state::AppState, ui};

/// Przeglądarka granic stanów i gmin Meksyku
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Katalog z plikami GeoJSON (nadpisuje konfigurację)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Plik konfiguracji TOML
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Od razu otwórz stan (np. "cdmx")
    #[arg(short, long)]
    state: Option<String>,

    /// Zaznacz region na liście
    #[arg(long)]
    select: Option<String>,

    /// Dziennik (stdout należy do interfejsu)
    #[arg(long, value_name = "FILE", default_value = "mx-atlas.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create log file: {:?}", path))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }
    info!(dir = ?config.data.dir, "starting");

    let mut state = AppState::new(&config)
        .with_context(|| format!("Failed to open data directory: {:?}", config.data.dir))?;
    if let Some(label) = &cli.state {
        state.open_state(label)?;
    }
    if let Some(label) = &cli.select {
        state.select_label(label);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, state: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, state))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? {
                if state.handle_input(code) {
                    return Ok(());
                }
            }
        }
    }
}
