use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

mod api;
mod app;
mod config;
mod controller;
mod editor;
mod handler;
mod message;
mod tui;
mod ui;

use api::MentorClient;
use app::App;
use config::Config;
use controller::Controller;
use editor::Language;

#[derive(Parser)]
#[command(name = "mentor")]
#[command(about = "TUI coding assistant pairing a code editor with an AI chat panel")]
struct Cli {
    /// Source file to load into the editor
    file: Option<PathBuf>,

    /// Source language (javascript, typescript, python, java, csharp, cpp,
    /// go, ruby, rust, php)
    #[arg(short, long)]
    language: Option<String>,

    /// Analysis backend base URL (overrides MENTOR_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());

    let base_url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| config.resolve_base_url());

    let code = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => app::DEFAULT_CODE.to_string(),
    };

    let language = resolve_language(&cli, &config)?;

    tracing::info!(%base_url, language = language.as_str(), "starting");

    let client = MentorClient::new(&base_url).context("failed to build HTTP client")?;
    let controller = Controller::new(Arc::new(client));
    let mut app = App::new(code, language, controller);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        }
    }

    tui::restore()?;
    Ok(())
}

/// Language precedence: --language flag, then the file extension, then the
/// configured default, then JavaScript.
fn resolve_language(cli: &Cli, config: &Config) -> Result<Language> {
    if let Some(flag) = &cli.language {
        return Language::from_str(flag)
            .ok_or_else(|| anyhow!("unknown language: {}", flag));
    }

    if let Some(ext) = cli
        .file
        .as_ref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
    {
        if let Some(language) = Language::from_extension(ext) {
            return Ok(language);
        }
    }

    Ok(config
        .default_language
        .as_deref()
        .and_then(Language::from_str)
        .unwrap_or(Language::JavaScript))
}

/// File-backed logging, gated on MENTOR_LOG; stdout belongs to the TUI.
fn init_logging() -> Result<()> {
    let Ok(filter) = std::env::var("MENTOR_LOG") else {
        return Ok(());
    };

    let log_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("code-mentor");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("mentor.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
