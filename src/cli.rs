use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_state::AppState;
use crate::config::DopamindConfig;
use crate::config_loader::{load_config, render_config};
use crate::dopamind_core::DopamindCore;
use crate::log_sink::init_logging;
use crate::validation::parse_reward_request;

/// Top-level CLI interface for Dopamind
#[derive(Parser)]
#[command(
    name = "dopamind",
    version,
    about = "Dopamind reward scoring service"
)]
pub struct Cli {
    /// TOML config file (defaults to $DOPAMIND_CONFIG, then ./dopamind.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Host/IP to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Predict the response to one reward without recording anything
    Score {
        #[arg(long)]
        reward_type: String,
        /// Context as a JSON object
        #[arg(long, default_value = "{}")]
        context: String,
        #[arg(long, default_value = "cli")]
        user_id: String,
    },

    /// Print trends and insights for a user
    Analytics {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        days: Option<i64>,
    },

    /// Print the effective configuration as TOML
    Config,
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("failed to load config")?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config)
        }
        Commands::Score {
            reward_type,
            context,
            user_id,
        } => {
            let context: Value =
                serde_json::from_str(&context).context("--context must be valid JSON")?;
            let event = parse_reward_request(&json!({
                "user_id": user_id,
                "reward_type": reward_type,
                "context": context,
            }))?;
            let core = DopamindCore::for_prediction(&config)?;
            print_json(&core.predict(&event)?)
        }
        Commands::Analytics { user_id, days } => {
            let core = DopamindCore::from_config(&config)?;
            print_json(&core.analytics(&user_id, days)?)
        }
        Commands::Config => {
            print!("{}", render_config(&config)?);
            Ok(())
        }
    }
}

fn serve(config: DopamindConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let state = Arc::new(AppState::from_config(config)?);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;
    rt.block_on(crate::web::serve(state, addr))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
