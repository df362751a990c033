//! Examlyx TUI - Terminal dashboard for Examlyx administration
//!
//! A Ratatui-based TUI for managing clients, admins, teachers and students
//! through the Examlyx REST backend.

mod api;
mod app;
mod config;
mod events;
mod platform;
mod state;
mod ui;

use anyhow::{Context, Result};
use api::{ApiClient, Gateways};
use app::App;
use config::{AppContext, DashboardConfig, API_URL_ENV};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for a backend result before checking input again
const EVENT_WAIT: Duration = Duration::from_millis(50);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = DashboardConfig::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {e}");
        DashboardConfig::default()
    });
    let context = config.resolve(std::env::var(API_URL_ENV).ok());

    init_logging(&context);
    tracing::info!(api_url = %context.api_url, "starting");

    let client = ApiClient::new(&context).context("failed to build HTTP client")?;
    let mut app = App::new(context, Gateways::from_client(client));
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        tracing::error!(error = ?err, "exiting after error");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

/// Log to a file so output never lands on the alternate screen; fall back
/// to stderr when the data directory is unusable
fn init_logging(context: &AppContext) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| context.log_filter.as_str().into());

    let log_file = DashboardConfig::log_path().and_then(|path| {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match log_file {
        Some(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw the UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Give spawned backend calls a chance to run and apply their results
        if let Ok(Some(event)) = tokio::time::timeout(EVENT_WAIT, app.next_event()).await {
            app.handle_event(event);
        }
        app.drain_events();

        // Handle crossterm events
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Global quit: Ctrl+C
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    // Handle key event
                    app.handle_key(key)?;
                }
                Event::Resize(_width, _height) => {
                    // Layout is recalculated on next draw
                }
                _ => {}
            }
        }

        // Check if app wants to quit
        if app.should_quit() {
            return Ok(());
        }
    }
}
