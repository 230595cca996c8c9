mod app;
mod config;
mod error;
mod import;
mod listbox;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use config::Config;
use import::ImportPolicy;
use listbox::SelectionPolicy;

#[derive(Parser, Debug)]
#[command(name = "defbox")]
#[command(about = "Pick a definition from an imported JSON list")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long)]
    config: Option<String>,

    /// How the selection reacts when an earlier entry is removed
    #[arg(long, value_enum)]
    policy: Option<SelectionPolicy>,

    /// How overlapping imports are resolved
    #[arg(long, value_enum)]
    import_policy: Option<ImportPolicy>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Definitions files to import on start-up, in order
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = cli
        .log_file
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "defbox=info".into()),
        )
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // Load config, command line wins
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(policy) = cli.policy {
        config.list.selection_policy = policy;
    }
    if let Some(policy) = cli.import_policy {
        config.import.policy = policy;
    }
    tracing::debug!("Selection policy: {:?}", config.list.selection_policy);

    let mut app = App::new(config);
    if !cli.files.is_empty() {
        app.import_all(cli.files);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.poll_imports();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    app.click(mouse.column, mouse.row);
                }
                _ => {}
            }
        }
    }
}

/// Returns true when the app should quit
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(event::KeyModifiers::CONTROL) {
        return true;
    }

    if app.is_prompting() {
        match key.code {
            KeyCode::Esc => app.cancel_prompt(),
            KeyCode::Enter => app.submit_prompt(),
            KeyCode::Backspace => app.pop_prompt_char(),
            KeyCode::Char(c) => app.push_prompt_char(c),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('o') => app.open_prompt(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Esc => app.deselect(),
        KeyCode::Delete | KeyCode::Char('d') => app.remove_selected(),
        KeyCode::Char('c') => app.clear(),
        KeyCode::Char('x') => app.export(),
        KeyCode::Char('s') => app.cancel_imports(),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_accepts_several_files() {
        let cli = Cli::try_parse_from(["defbox", "a.json", "b.json"]).unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);

        let cli = Cli::try_parse_from(["defbox", "--policy", "preserve"]).unwrap();
        assert!(cli.files.is_empty());
        assert_eq!(cli.policy, Some(SelectionPolicy::Preserve));
    }
}
