//! Text adventure console
//!
//! A terminal front end for the versioned narrative world engine, with a
//! `--headless` line protocol for scripted runs.

mod app;
mod commands;
mod events;
mod headless;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tta_core::{EngineConfig, GameSession, SessionConfig};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// Versioned narrative world console
#[derive(Parser, Debug)]
#[command(name = "tta", version, about)]
struct Args {
    /// Line protocol on stdin/stdout instead of the TUI
    #[arg(long)]
    headless: bool,

    /// Never call the API, use the deterministic offline engine
    #[arg(long)]
    offline: bool,

    /// Claude model to use
    #[arg(long)]
    model: Option<String>,

    /// Seed for the offline engine and node placement
    #[arg(long)]
    seed: Option<u64>,

    /// Branch the session starts on
    #[arg(long, default_value = tta_core::genesis::DEFAULT_BRANCH)]
    branch: String,

    /// API request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Where logs go in TUI mode
    #[arg(long, default_value = "tta.log")]
    log_file: PathBuf,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut engine = EngineConfig::new()
            .offline(self.offline)
            .with_timeout(Duration::from_secs(self.timeout));
        if let Some(model) = &self.model {
            engine = engine.with_model(model.clone());
        }
        if let Some(seed) = self.seed {
            engine = engine.with_seed(seed);
        }
        SessionConfig::new()
            .with_branch(self.branch.clone())
            .with_engine(engine)
    }
}

fn init_logging(args: &Args) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        // Logging to the terminal would tear the TUI
        let file = File::create(&args.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args)?;

    info!(headless = args.headless, offline = args.offline, "console starting");
    let session = GameSession::new(args.session_config());

    if args.headless {
        return headless::run_headless(session).await.map_err(|e| e.into());
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(session)).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    let mut pending_input: Option<String> = None;

    loop {
        terminal.draw(|f| render(f, &app))?;

        if let Some(input) = pending_input.take() {
            match app.session.begin_command(&input) {
                Ok(pending) => {
                    // Show the echo and the disabled input while the engine works
                    app.scroll_to_bottom();
                    app.set_status("Engine thinking...");
                    terminal.draw(|f| render(f, &app))?;

                    let response = app.session.resolve(&pending).await;
                    let response = app.session.finish_command(pending, response);
                    app.on_response(&response);
                }
                Err(e) => app.on_session_error(e),
            }
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            match handle_event(&mut app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::Submit(input) => pending_input = Some(input),
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
