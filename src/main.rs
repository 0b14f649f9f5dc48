mod app;
mod config;
mod fields;
mod flows;
mod focus;
mod logging;
mod modal_ui;
mod modals;
mod panel;
mod request;
mod todos;
mod ui;
mod validators;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::{DefaultTerminal, Terminal};
use tokio::task::LocalSet;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::ui::draw_ui;

/// How often the screen is redrawn when nothing happens.
const TICK: Duration = Duration::from_millis(250);

/// Terminal todo manager.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Start with an empty list instead of the example todos
    #[arg(long)]
    no_demo: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let start_time = Instant::now();

    // Initialize logging before anything else
    let (session_id, log_directory, logging_error, reload_handle, _guard) =
        match logging::init("info") {
            Ok(ctx) => (
                Some(ctx.session_id),
                Some(ctx.log_directory),
                None,
                Some(ctx.reload_handle),
                Some(ctx._guard),
            ),
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                (None, None, Some(e.message), None, None)
            }
        };

    let loaded_config = config::load_config(cli.config.as_deref());
    debug!(
        config_path = %loaded_config.config_path.display(),
        status = ?loaded_config.status,
        "config_loaded"
    );

    // RUST_LOG wins over the configured level
    if std::env::var_os("RUST_LOG").is_none()
        && let Some(handle) = &reload_handle
        && let Err(e) = logging::update_log_level(handle, &loaded_config.config.logging.level)
    {
        warn!(error = %e, "log_level_update_failed");
    }

    if let Some(dir) = &log_directory {
        logging::cleanup_old_logs(dir);
    }

    let seed_demo = loaded_config.config.todos.seed_demo && !cli.no_demo;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let app = App::new(
        loaded_config,
        session_id.clone(),
        log_directory,
        logging_error,
        seed_demo,
    );
    let local = LocalSet::new();
    let result = local.block_on(&runtime, run_app(terminal, app));

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;

    if let Some(sid) = session_id {
        info!(
            session_id = %sid,
            duration_secs = start_time.elapsed().as_secs_f64(),
            "session_end"
        );
    }

    result
}

async fn run_app(mut terminal: DefaultTerminal, mut app: App) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        terminal.draw(|f| draw_ui(f, &mut app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(&event),
                Some(Err(e)) => return Err(e).context("failed to read terminal event"),
                None => break,
            },
            _ = tick.tick() => {}
        }

        // Let flows woken by this event run before the next draw
        tokio::task::yield_now().await;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
