use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use flare_chat_core::{
    BackendClient, BackendError, ChatBackend, ChatReply, ChatSession, Config, PendingRequest,
    SessionError,
};

mod render;

/// Environment variable controlling log verbosity (`EnvFilter` syntax)
const LOG_ENV: &str = "FLARE_CHAT_LOG";

#[derive(Parser)]
#[command(name = "flare-chat")]
#[command(about = "Chat with the Flare dApp builder assistant from the terminal")]
struct Cli {
    /// Backend base URL (overrides FLARE_CHAT_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Check whether the backend is up and RAG is available
    Health,
    /// Print a source file (or stdin) with syntax highlighting
    Highlight {
        /// File to highlight; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Save the backend base URL to the config file
    Config {
        /// Base URL to persist
        url: String,
    },
}

type ChatTask = JoinHandle<Result<ChatReply, BackendError>>;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config file, using defaults");
        Config::new()
    });
    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url());

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(&api_url).await?,
        Commands::Health => health(&api_url).await?,
        Commands::Highlight { file } => highlight_source(file).await?,
        Commands::Config { url } => save_api_url(config, &url)?,
    }

    Ok(())
}

async fn chat(api_url: &str) -> Result<()> {
    let client = BackendClient::new(api_url);
    let rag_available = client.rag_available().await;

    println!("\n{}", "🔥 Flarista - Flare dApp builder assistant".bold().magenta());
    println!("{}", "=".repeat(44).dimmed());
    println!("Backend: {}", api_url.cyan());
    if rag_available {
        println!("Knowledge base: {}", "available".green());
    } else {
        println!("Knowledge base: {}", "unavailable".yellow());
    }
    println!("{}\n", "Type a question. /reset clears the chat, /quit exits.".dimmed());

    let mut session = ChatSession::new(client);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: Option<(PendingRequest, ChatTask)> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };

                match line.trim() {
                    "/quit" | "/exit" => break,
                    "/reset" => match session.reset().await {
                        Ok(()) => println!("{}", "Conversation cleared.".dimmed()),
                        Err(SessionError::Busy) => println!("{}", "Still waiting for a reply.".yellow()),
                        Err(e) => println!("{}: {}", "Error".red(), e),
                    },
                    _ => match session.append_user_turn(&line) {
                        Ok(pending) => {
                            let backend = session.backend().clone();
                            let request = pending.request().clone();
                            let task = tokio::spawn(async move { backend.chat(&request).await });
                            in_flight = Some((pending, task));
                            println!("{}", "Thinking...".dimmed());
                        }
                        Err(SessionError::Busy) => {
                            println!("{}", "Still waiting for a reply.".yellow());
                        }
                        Err(SessionError::EmptyPrompt) => {}
                        Err(e) => println!("{}: {}", "Error".red(), e),
                    },
                }
            }
            joined = wait_for_reply(&mut in_flight) => {
                let Some((pending, _)) = in_flight.take() else {
                    continue;
                };
                let outcome = joined.unwrap_or_else(|e| Err(BackendError::other(e.to_string())));
                let turn = session.resolve(pending, outcome)?;
                println!("{}\n", render::render_turn(&turn));
            }
        }
    }

    Ok(())
}

/// Resolves when the in-flight chat task finishes; never resolves while idle.
async fn wait_for_reply(
    in_flight: &mut Option<(PendingRequest, ChatTask)>,
) -> Result<Result<ChatReply, BackendError>, tokio::task::JoinError> {
    match in_flight {
        Some((_, task)) => task.await,
        None => std::future::pending().await,
    }
}

async fn health(api_url: &str) -> Result<()> {
    let client = BackendClient::new(api_url);

    println!("🔍 Checking {}", api_url.cyan());
    match client.health().await {
        Ok(health) => {
            println!(
                "Status: {}",
                health.status.as_deref().unwrap_or("unknown").green()
            );
            if health.rag_available() {
                println!("RAG: {}", "available".green());
            } else {
                println!("RAG: {}", "unavailable".yellow());
            }
        }
        Err(e) => {
            println!("{}: {}", "Backend unreachable".red(), e);
            println!("RAG: {}", "unavailable".yellow());
        }
    }

    Ok(())
}

async fn highlight_source(file: Option<PathBuf>) -> Result<()> {
    let source = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut source = String::new();
            tokio::io::stdin()
                .read_to_string(&mut source)
                .await
                .context("failed to read from stdin")?;
            source
        }
    };

    print!("{}", render::highlight(&source));
    Ok(())
}

fn save_api_url(mut config: Config, url: &str) -> Result<()> {
    config.api_url = Some(url.trim_end_matches('/').to_string());
    config.save()?;

    println!(
        "✅ Saved backend URL to {}",
        Config::get_config_path()?.display().to_string().dimmed()
    );
    Ok(())
}
