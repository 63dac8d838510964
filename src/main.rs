//! jayrah-tui - browse Jira boards and issues from the terminal.

mod api;
mod app;
mod cache;
mod cli;
mod config;
mod error;
mod events;
mod logging;
mod tasks;
mod telemetry;
mod ui;

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use api::{IssueBackend, JiraClient, MockBackend};
use app::{App, RunOutcome};
use cli::Cli;
use config::{BoardConfig, Config};
use error::{AppError, Result};
use events::{Event, EventHandler};
use tasks::{create_task_channel, Pipeline, WorkerMessage};

type Tui = Terminal<CrosstermBackend<Box<dyn Write + Send>>>;

/// Raw mode and the alternate screen for the lifetime of the value.
struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        // Keep stdout free for the chosen key when it is captured.
        let mut writer: Box<dyn Write + Send> = if io::stdout().is_terminal() {
            Box::new(io::stdout())
        } else {
            Box::new(io::stderr())
        };
        enable_raw_mode().map_err(|e| AppError::terminal(format!("cannot enable raw mode: {}", e)))?;
        execute!(writer, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(writer))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(telemetry::enabled()) {
        eprintln!("jayrah-tui: file logging disabled: {}", e);
    }

    let code = match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {}", e);
            eprintln!("jayrah-tui: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("  {}", action);
            }
            if let Some(dir) = logging::log_directory() {
                eprintln!("  Logs: {}", dir.display());
            }
            ExitCode::FAILURE
        }
    };
    logging::shutdown();
    code
}

fn load_config(cli: &Cli) -> Result<Config> {
    match Config::load(cli.config.as_deref()) {
        Ok(config) => Ok(config),
        Err(e) if cli.mock => {
            warn!("no usable config for mock run ({}), using defaults", e);
            Ok(Config {
                boards: vec![BoardConfig::default_board()],
                ..Config::default()
            })
        }
        Err(e) => Err(e.into()),
    }
}

async fn connect(cli: &Cli, config: &Config) -> Result<Arc<dyn IssueBackend>> {
    if cli.mock {
        info!("using mock backend");
        return Ok(Arc::new(MockBackend::new()));
    }
    let client = JiraClient::from_config(config)?;
    if cli.validate {
        let user = client.validate_connection().await?;
        info!(user = user.label(), "credentials validated");
    }
    Ok(Arc::new(client))
}

async fn run(cli: Cli) -> Result<()> {
    let config = Arc::new(load_config(&cli)?);
    let source = cli.source();
    // Unknown boards and empty queries fail before the screen is taken over.
    config.resolve_jql(&source)?;

    let backend = connect(&cli, &config).await?;
    let (rx, spawner) = create_task_channel(backend, config.clone());
    let pipeline = Pipeline::new(spawner, config.pipeline.debounce());
    let events = EventHandler::new(config.pipeline.tick_rate());

    let mut app = App::new(config, pipeline, source, cli.choose);
    app.start();

    let outcome = {
        let mut guard = TerminalGuard::enter()?;
        run_loop(&mut guard.terminal, &mut app, rx, &events)?
    };

    cli::finish(outcome, cli.choose_file.as_deref())?;
    Ok(())
}

fn run_loop(
    terminal: &mut Tui,
    app: &mut App,
    mut rx: UnboundedReceiver<WorkerMessage>,
    events: &EventHandler,
) -> Result<RunOutcome> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        let now = Instant::now();
        let until_deadline = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now));
        match events.next_timeout(events.timeout_until(until_deadline))? {
            Event::Key(key) => {
                if let Some(outcome) = app.handle_key(key, Instant::now()) {
                    return Ok(outcome);
                }
            }
            Event::Resize(width, height) => {
                tracing::debug!(width, height, "terminal resized");
            }
            Event::Tick => {}
        }

        while let Ok(message) = rx.try_recv() {
            app.handle_worker_message(message);
        }
        app.tick(Instant::now());
    }
}
