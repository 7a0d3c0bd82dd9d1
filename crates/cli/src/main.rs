use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "sgwatch")]
#[command(about = "Security group change notifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: SGWATCH_CONFIG_PATH or ~/.sgwatch/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the gateway (HTTP). Change events are POSTed to /events.
    Serve {
        /// Config file path (default: SGWATCH_CONFIG_PATH or ~/.sgwatch/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Process one change event (SNS envelope JSON) and send the notification if it qualifies.
    Handle {
        /// Config file path (default: SGWATCH_CONFIG_PATH or ~/.sgwatch/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Event file; reads stdin when omitted.
        #[arg(value_name = "FILE")]
        event: Option<PathBuf>,
    },

    /// Evaluate one change event against the notification policy without sending anything.
    Check {
        /// Event file; reads stdin when omitted.
        #[arg(value_name = "FILE")]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("sgwatch {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Handle { config, event }) => {
            if let Err(e) = run_handle(config, event).await {
                log::error!("handle failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Check { event }) => {
            if let Err(e) = run_check(event).await {
                log::error!("check failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(sgwatch::config::default_config_path);
    let dir = sgwatch::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, _) = sgwatch::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    sgwatch::gateway::run_gateway(config).await
}

/// Read the event body from a file, or stdin when no file is given.
async fn read_event(path: Option<PathBuf>) -> anyhow::Result<String> {
    use anyhow::Context;

    match path {
        Some(p) => tokio::fs::read_to_string(&p)
            .await
            .with_context(|| format!("reading event from {}", p.display())),
        None => {
            let mut body = String::new();
            tokio::io::stdin()
                .read_to_string(&mut body)
                .await
                .context("reading event from stdin")?;
            Ok(body)
        }
    }
}

async fn run_handle(config_path: Option<PathBuf>, event: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _) = sgwatch::config::load_config(config_path)?;
    let relay = sgwatch::Relay::from_config(&config)?;
    let body = read_event(event).await?;
    let outcome = relay.handle_json(&body).await?;
    println!("{}", outcome.completion());
    Ok(())
}

async fn run_check(event: Option<PathBuf>) -> anyhow::Result<()> {
    let body = read_event(event).await?;
    let decision = match sgwatch::policy::evaluate_json(&body) {
        Ok(req) => serde_json::json!({
            "notify": true,
            "recipient": req.recipient,
            "subject": sgwatch::dispatch::subject_line(&req),
            "identifiers": req.identifiers,
        }),
        Err(skip) => serde_json::json!({
            "notify": false,
            "skipped": skip.reason(),
            "detail": skip.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
