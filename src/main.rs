//! L1 Chat - Ask about five blockchain protocols from the terminal
//!
//! Starts the chat TUI, or answers a single `--ask` question on stdout.

use std::io;
use std::panic;
use std::process;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use l1chat::app::App;
use l1chat::chat::ChatAgent;
use l1chat::cli::{Cli, StartupConfig};
use l1chat::data::MetricsService;
use l1chat::logging;
use l1chat::ui;
use l1chat::worker::{ChatWorker, WorkerMessage};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Renders the chat screen and, when open, the help overlay
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    ui::render_chat(frame, app);
    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

async fn run_tui(agent: ChatAgent) -> Result<(), Box<dyn std::error::Error>> {
    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut worker = ChatWorker::spawn(agent);

    loop {
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(question) = app.take_outgoing() {
            if worker.ask(question).is_none() {
                app.receive_error("The answer worker is busy or stopped. Please try again.");
            }
        }

        while let Some(message) = worker.try_recv() {
            match message {
                WorkerMessage::Answered { id, reply } => {
                    tracing::debug!(id, intent = ?reply.intent, "reply delivered");
                    app.receive_reply(reply);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let _log_guard = logging::init(
        startup.verbose,
        startup.ask.is_some(),
        startup.log_dir.clone(),
    );

    let metrics = MetricsService::new(&startup.config)?;
    let agent = ChatAgent::new(metrics);

    match startup.ask {
        Some(question) => {
            let reply = agent.respond(&question).await;
            println!("{}", reply.markdown);
            Ok(())
        }
        None => run_tui(agent).await,
    }
}
