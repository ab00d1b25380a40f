//! usrdir-manager binary entry point.
//!
//! Parses the CLI, initializes the terminal in raw mode, runs the TUI event
//! loop against the configured user API, and restores the terminal on exit.
//!
use crate::error::Result;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod error;
mod ui;

#[derive(Parser, Debug)]
#[command(name = "usrdir-manager", about = "TUI client for a remote user API")]
struct Args {
    /// Base URL of the user API server.
    #[arg(long, env = "USRDIR_API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Append diagnostics to this file. Logging to the terminal would
    /// corrupt the TUI, so without a file nothing is logged.
    #[arg(long, env = "USRDIR_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path).map_err(|e| format!("init logging: {}", e))?;
    }

    let api: Arc<dyn api::UserApi> = Arc::new(api::HttpUserApi::new(args.api_url.clone()));

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, api, &args.api_url);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
    }
    Ok(())
}
