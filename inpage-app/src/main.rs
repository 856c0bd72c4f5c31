use anyhow::{Context, Result};
use clap::Parser;
use console::Command;
use inpage_actors::{spawn_memory_agent, spawn_search_session, ActorSystem, AgentHandle, SearchHandle};
use inpage_common::observability::{init_logging, LogConfig, LogFormat};
use inpage_config::{LogFormatSetting, SearchSettings, SettingsLoader};
use inpage_search::host::SearchTarget;
use inpage_search::memory::{MemoryContents, MemoryDocument, MemoryWebview};
use inpage_search::InPageSearchOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
mod console;

const DEFAULT_PAGE: &str = "foo bar baz foo bar piyo poyo";

/// Search a page of text through an in-page search session.
#[derive(Parser, Debug)]
#[command(name = "inpage-search", version)]
struct Cli {
    /// Page text to search.
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Read the page text from a file.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Search an embedded frame instead of window contents.
    #[arg(long)]
    embedded: bool,
    /// Settings file; `inpage.yaml` is used when present.
    #[arg(long, env = "INPAGE_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    json_logs: bool,
    #[arg(long)]
    stderr_logs: bool,
}

fn load_settings(cli: &Cli) -> Result<SearchSettings> {
    let loader = match &cli.config {
        Some(path) => SettingsLoader::new().with_file(path),
        None => SettingsLoader::new().with_optional_file("inpage.yaml"),
    };
    loader.load().context("failed to load settings")
}

fn log_config(cli: &Cli, settings: &SearchSettings) -> LogConfig {
    let json = cli.json_logs || settings.log.format == LogFormatSetting::Json;
    LogConfig {
        log_dir: settings.log.dir.clone(),
        emit_stderr: cli.stderr_logs || settings.log.emit_stderr,
        format: if json { LogFormat::Json } else { LogFormat::Text },
        ..LogConfig::default()
    }
}

async fn page_text(cli: &Cli) -> Result<String> {
    if let Some(path) = &cli.file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()));
    }
    Ok(cli.text.clone().unwrap_or_else(|| DEFAULT_PAGE.to_string()))
}

/// Wait until the agent and the session have processed everything queued.
async fn sync(search: &SearchHandle, agent: &AgentHandle) -> Result<()> {
    agent.display().await?;
    search.snapshot().await?;
    search.snapshot().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Settings (env wins), then logging
    let settings = load_settings(&cli)?;
    let log_path = init_logging(log_config(&cli, &settings))?;

    let text = page_text(&cli).await?;
    let target: Arc<dyn SearchTarget> = if cli.embedded {
        Arc::new(MemoryWebview::new(&text))
    } else {
        Arc::new(MemoryContents::new(&text))
    };

    // 2) Session + overlay agent
    let document = MemoryDocument::new();
    let mut system = ActorSystem::new();
    let search = spawn_search_session(
        target,
        InPageSearchOptions::new(settings),
        &document,
        &mut system,
    )?;
    let overlay = document
        .last_overlay()
        .context("session did not create an overlay")?;
    overlay.set_ready();
    let agent = spawn_memory_agent(&overlay, &mut system);

    let mut events = search.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event: {}", console::describe(&event));
        }
    });

    tracing::info!(log = %log_path.display(), embedded = cli.embedded, "inpage-search ready");
    println!("{}", console::HELP);

    // 3) Drive the overlay from stdin
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        let cmd = match console::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match cmd {
            Command::Quit => break,
            Command::Open => search.open().await?,
            Command::Ui(event) => agent.ui(event).await?,
        }
        sync(&search, &agent).await?;
        println!("{}", console::render(&agent.display().await?));
    }

    if let Err(e) = search.finalize().await {
        tracing::warn!(error = %e, "finalize failed");
    }
    system.graceful_shutdown().await
}
