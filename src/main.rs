//! Typesense Dispatch CLI
//!
//! Talks to a Typesense cluster through the quarantining dispatcher.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use typesense_dispatch::{
    logging::{init_tracing, LogFormat},
    Configuration, Dispatcher, RequestOptions,
};

/// Typesense Dispatch
///
/// Probe cluster nodes or issue requests with failover and retries.
#[derive(Parser, Debug)]
#[command(name = "typesense-dispatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Node URL, repeatable (overrides TYPESENSE_NODES env var)
    #[arg(long = "node", global = true)]
    nodes: Vec<String>,

    /// API key (overrides TYPESENSE_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe every configured node once and print the verdicts
    Health,

    /// GET an endpoint (e.g. /collections) and print the JSON response
    Get {
        endpoint: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(&args.log_level, format)?;

    let config = load_config(&args)?;
    tracing::info!(nodes = ?config.nodes, "Loaded configuration");

    let dispatcher = Dispatcher::new(config)?;

    match args.command {
        Command::Health => {
            let results = dispatcher.probe_all().await;
            let healthy = results.iter().filter(|(_, ok)| *ok).count();
            for (node, ok) in &results {
                println!("{:<40} {}", node, if *ok { "ok" } else { "unhealthy" });
            }
            if healthy == 0 {
                bail!("no healthy nodes");
            }
        }
        Command::Get { endpoint } => match dispatcher.get(&endpoint, RequestOptions::new()).await? {
            Some(payload) => {
                let body = payload.into_json()?;
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            None => bail!("{endpoint} not found"),
        },
    }

    dispatcher.shutdown();
    Ok(())
}

/// Flags win over environment variables; with both `--node` and
/// `--api-key` given, the environment is not required at all.
fn load_config(args: &Args) -> Result<Configuration> {
    let mut config = match (&args.api_key, args.nodes.is_empty()) {
        (Some(api_key), false) => {
            dotenvy::dotenv().ok();
            Configuration::new(args.nodes.clone(), api_key.clone())
        }
        _ => Configuration::from_env()?,
    };

    if !args.nodes.is_empty() {
        config.nodes = args.nodes.clone();
    }
    if let Some(api_key) = &args.api_key {
        config = config.with_api_key(api_key.clone());
    }

    config.validate()?;
    Ok(config)
}
