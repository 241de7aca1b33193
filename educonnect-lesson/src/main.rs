//! educonnect-lesson - command-line front end for the lesson client
//!
//! Exercises the library against real collaborators: parse or fetch a
//! timeline, send presence reports, query the current lesson, chat with the
//! agent.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use educonnect_common::auth::{NoSession, StaticToken, TokenSource};
use educonnect_common::config::{ClientConfig, ENV_AGENT_URL, ENV_BACKEND_URL};
use educonnect_common::storage::JsonFileStore;
use educonnect_lesson::chat::ChatSession;
use educonnect_lesson::timeline::{parse_timeline_text, TimelineClient};
use educonnect_lesson::tracking::EnterLesson;
use educonnect_lesson::{TabIdProvider, TrackingClient};
use serde::Serialize;
use tracing::info;

/// Command-line arguments for educonnect-lesson
#[derive(Parser, Debug)]
#[command(name = "educonnect-lesson")]
#[command(about = "EduConnect lesson presence, timeline and chat client")]
#[command(version)]
struct Cli {
    /// Config file (TOML); must exist when given
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, env = ENV_BACKEND_URL)]
    backend_url: Option<String>,

    /// Chat agent base URL
    #[arg(long, env = ENV_AGENT_URL)]
    agent_url: Option<String>,

    /// Id token for authenticated requests
    #[arg(long, env = "EDUCONNECT_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Timeline documents
    #[command(subcommand)]
    Timeline(TimelineCommand),

    /// Presence reports and current-lesson lookup
    #[command(subcommand)]
    Presence(PresenceCommand),

    /// Print this tab's id
    TabId,

    /// Ask the chat agent a question
    Chat(ChatArgs),
}

#[derive(Subcommand, Debug)]
enum TimelineCommand {
    /// Parse a local timeline file ("-" for stdin)
    Parse { path: PathBuf },
    /// Download and parse a timeline document
    Fetch { url: String },
}

#[derive(Subcommand, Debug)]
enum PresenceCommand {
    /// Report that a lesson was opened
    Enter {
        #[arg(long)]
        user: String,
        #[arg(long)]
        lesson: String,
        #[arg(long)]
        series: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        tab: Option<String>,
    },
    /// Report that the lesson was closed
    Exit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        tab: Option<String>,
    },
    /// Report that the tab gained focus
    Focus {
        #[arg(long)]
        user: String,
        #[arg(long)]
        tab: Option<String>,
    },
    /// Show the backend's current lesson for a user
    Current {
        #[arg(long)]
        user: String,
    },
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, default_value = "guest_user")]
    user: String,

    /// Scope the question to a lesson
    #[arg(long)]
    lesson: Option<String>,

    #[arg(long, requires = "lesson")]
    series: Option<String>,

    /// Take the lesson context from the tracking backend
    #[arg(long, conflicts_with = "lesson")]
    sync: bool,

    /// Clear the stored history first
    #[arg(long)]
    clear: bool,

    /// Print the history after the exchange
    #[arg(long)]
    history: bool,

    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        ClientConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(url) = &cli.agent_url {
        config.agent_url = url.clone();
    }
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting EduConnect lesson client v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let tokens: Arc<dyn TokenSource> = match cli.token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(NoSession),
    };
    let tabs = TabIdProvider::new(Arc::new(JsonFileStore::new(config.tab_store_path())));

    match cli.command {
        Command::Timeline(TimelineCommand::Parse { path }) => {
            let text = read_input(&path)?;
            print_json(&parse_timeline_text(&text))?;
        }
        Command::Timeline(TimelineCommand::Fetch { url }) => {
            let client = TimelineClient::new(config.request_timeout())?;
            let markers = client
                .fetch_and_parse(&url)
                .await
                .with_context(|| format!("Failed to load timeline from {}", url))?;
            print_json(&markers)?;
        }
        Command::Presence(command) => {
            let client = TrackingClient::from_config(&config, tokens, tabs)?;
            run_presence(&client, command).await?;
        }
        Command::TabId => {
            println!("{}", tabs.get_tab_id());
        }
        Command::Chat(args) => {
            let history = Arc::new(JsonFileStore::new(config.history_store_path()));
            let mut chat = ChatSession::from_config(&config, history)?;

            if args.clear {
                chat.clear_history()?;
            }
            if args.sync {
                let client = TrackingClient::from_config(&config, tokens, tabs)?;
                let view = client.get_current_lesson(&args.user).await?;
                chat.sync_lesson_context(&view);
            } else if let Some(lesson) = &args.lesson {
                chat.set_current_lesson(lesson, args.series.as_deref());
            }

            if let Some(message) = &args.message {
                let reply = chat.send_message(&args.user, message).await?;
                println!("{}", reply.content);
            }
            if args.history {
                print_json(&chat.history())?;
            }
        }
    }

    Ok(())
}

async fn run_presence(client: &TrackingClient, command: PresenceCommand) -> Result<()> {
    let response = match command {
        PresenceCommand::Enter {
            user,
            lesson,
            series,
            title,
            tab,
        } => {
            client
                .enter_lesson(EnterLesson {
                    user_id: user,
                    lesson_id: lesson,
                    series_id: series,
                    lesson_title: title,
                    tab_id: tab,
                })
                .await
        }
        PresenceCommand::Exit { user, tab } => client.exit_lesson(&user, tab.as_deref()).await,
        PresenceCommand::Focus { user, tab } => client.update_focus(&user, tab.as_deref()).await,
        PresenceCommand::Current { user } => {
            let view = client.get_current_lesson(&user).await?;
            return print_json(&view);
        }
    };

    match response {
        Some(body) => print_json(&body),
        None => bail!("Presence report was not accepted (see log)"),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
