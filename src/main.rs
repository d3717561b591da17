use agent_relay::a2a::{self, agent_card};
use agent_relay::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agent-relay", version, about = "Agent-to-Agent routing gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ~/.agent-relay/config.toml when present).
    #[arg(long, global = true, env = "AGENT_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, global = true, env = "PORT")]
    port: Option<u16>,

    /// Public host assigned by the hosting platform.
    #[arg(long, global = true, env = "RAILWAY_PUBLIC_DOMAIN")]
    public_host: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway (default).
    Serve,
    /// Print this agent's self-description and exit.
    Describe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    agent_relay::logging::init(&cli.log_level, cli.json_logs);

    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(bind) = &cli.bind {
        cfg.gateway.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        cfg.gateway.port = port;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = a2a::server::bootstrap(&cfg, cli.public_host.as_deref()).await?;
            a2a::start_server(state, &cfg.gateway.bind, cfg.gateway.port).await
        }
        Commands::Describe => {
            let base_url = agent_card::resolve_public_base_url(
                cfg.agent.public_url.as_deref(),
                cli.public_host.as_deref(),
                cfg.gateway.port,
            );
            let card = agent_card::describe(&cfg.agent, &base_url, &cfg.directory.inbound_path);
            let facts = agent_card::agent_facts(&cfg.agent, &card);
            let doc = serde_json::json!({ "agent_card": card, "agentfacts": facts });
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
    }
}
