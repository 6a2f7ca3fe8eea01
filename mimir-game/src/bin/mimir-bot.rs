//! `mimir-bot`: connects to the game sidecar and obeys one player.
//!
//! Startup order: `.env`, then the TOML config file, then environment
//! overrides, then command-line flags.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mimir_core::BotConfig;
use mimir_llm::{LlmClient, LlmProvider, PromptTemplate};
use mimir_game::{DryRunAgent, EventLoop, GameEvent, Identity, Pipeline, RemoteAgent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "mimir-bot",
    about = "Language-model driven game bot that takes orders from one player",
    version
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "MIMIR_CONFIG")]
    config: Option<PathBuf>,

    /// Player whose chat messages are obeyed
    #[arg(short, long)]
    player: Option<String>,

    /// Address of the game sidecar
    #[arg(long)]
    control_addr: Option<String>,

    /// Log filter, e.g. `info` or `mimir_game=debug`
    #[arg(long)]
    log_level: Option<String>,

    /// Read player messages from stdin and log actions instead of playing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BotConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => BotConfig::default(),
    };
    config.apply_env();
    if let Some(player) = cli.player {
        config.bot.player_name = player;
    }
    if let Some(addr) = cli.control_addr {
        config.bot.control_addr = addr;
    }
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    config.validate().context("invalid configuration")?;

    init_tracing(&config);

    let provider = LlmProvider::from_name(
        &config.llm.provider,
        config.llm.resolved_base_url(),
        config.llm.api_key.clone(),
    )
    .context("language model provider")?;
    if matches!(
        provider,
        LlmProvider::OpenAiResponses { api_key: None, .. }
            | LlmProvider::OpenAiCompatible { api_key: None, .. }
    ) {
        warn!("OPENAI_API_KEY is not set, every message will fail until it is");
    }
    let model = LlmClient::new(provider, &config.llm.model);
    let template = PromptTemplate::load_or_builtin(&config.files.prompt_path);
    let pipeline = Pipeline::from_config(&config, template, model);

    let identity = Identity {
        own_name: config.bot.username.clone(),
        player_name: config.bot.player_name.clone(),
    };
    info!(
        player = %identity.player_name,
        model = %config.llm.model,
        memory = %config.files.memory_path.display(),
        "mimir-bot starting"
    );

    if cli.dry_run {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(read_console(identity.player_name.clone(), tx));
        EventLoop::new(pipeline, DryRunAgent::new(), identity, config.bot.max_chat_len)
            .run(rx)
            .await;
    } else {
        let (agent, rx) = RemoteAgent::connect(&config.bot.control_addr)
            .await
            .with_context(|| format!("connect game sidecar {}", config.bot.control_addr))?;
        EventLoop::new(pipeline, agent, identity, config.bot.max_chat_len)
            .run(rx)
            .await;
    }

    Ok(())
}

fn init_tracing(config: &BotConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level));
    if config.general.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

/// Feed stdin lines into the loop as if `player` had said them.
async fn read_console(player: String, tx: mpsc::Sender<GameEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        let event = GameEvent::Chat {
            username: player.clone(),
            message: message.to_string(),
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}
