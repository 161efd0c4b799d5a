use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use extbridge_core::bridge::BridgeHostBuilder;
use extbridge_core::config::Config;
use extbridge_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use extbridge_core::metrics::init_metrics;
use extbridge_core::replication::MetadataStore;
use extbridge_core::store::{FileSettings, LocalStore, StorageSelector};
use serde_json::{json, Value};
use tracing::{info, warn};

mod script;

#[derive(Parser, Debug)]
#[command(name = "extbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file (defaults plus EXTBRIDGE_* variables otherwise)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Override the directory holding the primary store
    #[arg(long)]
    data_dir: Option<String>,

    /// Override the shared directory holding the replicas
    #[arg(long)]
    shared_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run a JSON-lines script of envelopes through the bridge ("-" reads stdin)
    Run {
        script: String,
    },
    /// Print the primary store, optionally only the given keys
    Dump {
        keys: Vec<String>,
    },
    /// Print the shared profile metadata replica
    SharedProfiles,
    /// Write the effective configuration to a TOML file
    InitConfig {
        path: String,
    },
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = Config::from_file(expand(path))
                .with_context(|| format!("failed to load config from {}", path))?;
            config.apply_env()?;
            config
        }
        None => Config::from_env()?,
    };

    if let Some(dir) = &args.data_dir {
        config.store.data_dir = expand(dir);
    }
    if let Some(dir) = &args.shared_dir {
        config.store.shared_dir = expand(dir);
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &Config) -> Result<()> {
    let log_config = LogConfig::from_settings(&config.logging).unwrap_or_else(|e| {
        eprintln!("{}, using 'info'", e);
        LogConfig::new(LogLevel::Info)
    });
    init_logging_with_config(log_config)?;
    Ok(())
}

fn read_script(source: &str) -> Result<String> {
    if source == "-" {
        let mut script = String::new();
        std::io::stdin().read_to_string(&mut script)?;
        return Ok(script);
    }
    std::fs::read_to_string(expand(source)).with_context(|| format!("failed to read script {}", source))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_tracing(&config)?;
    init_metrics();

    match &args.command {
        Command::Run { script } => {
            let script = read_script(script)?;
            let builder = BridgeHostBuilder::from_config(&config)?;

            info!(data_dir = %config.store.data_dir.display(), "Running bridge script");
            for event in script::run(builder, &script).await? {
                print_json(&event)?;
            }
        }
        Command::Dump { keys } => {
            let settings = FileSettings::open(&config.store.data_dir)?;
            let store = LocalStore::with_storage_key(Arc::new(settings), config.store.storage_key.clone());
            let selector = if keys.is_empty() {
                StorageSelector::All
            } else {
                StorageSelector::Keys(keys.clone())
            };
            print_json(&Value::Object(store.get(&selector)?))?;
        }
        Command::SharedProfiles => {
            if !config.replication.enabled {
                warn!("Replication is disabled, the replica may be stale");
            }
            let settings = FileSettings::open(&config.store.shared_dir)?;
            let metadata = MetadataStore::with_key(Arc::new(settings), config.store.shared_profiles_key.clone());
            print_json(&json!(metadata.load_profiles()?))?;
        }
        Command::InitConfig { path } => {
            config.save_to_file(expand(path))?;
            info!(path = %path, "Configuration written");
        }
    }

    Ok(())
}
