use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use tankless::Config;
use tankless::ConfigError;
use tankless::DeviceCommandClient;
use tankless::DryRunTransport;
use tankless::LogLevel;
use tankless::ReqwestTransport;
use tankless::Transport;
use tracing_subscriber::prelude::*;

const DEFAULT_CONFIG_PATH: &str = "tankless.toml";

/// Stands in for a missing token when nothing is sent
const DRY_RUN_TOKEN: &str = "dry-run";

/// Control cloud-connected tankless water heaters
#[derive(Debug, Parser)]
#[command(name = "tankless", version)]
struct Cli {
    /// Config file (default: ./tankless.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer token for the vendor API
    #[arg(long, env = "TANKLESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log requests instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Log at debug level or lower
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the full device document from the GraphQL endpoint
    Info { device_id: String },

    /// Start recirculation through the command endpoint
    StartRecirculation {
        user_uuid: String,
        device_id: String,
        duration: u32,
    },

    /// Stop recirculation through the command endpoint
    StopRecirculation { user_uuid: String, device_id: String },

    /// Set the domestic temperature through the command endpoint
    SetTemperature {
        user_uuid: String,
        device_id: String,
        temperature: u32,
    },

    /// Start recirculation with a single shadow update
    PatchRecirculation { thing_name: String, duration: u32 },

    /// Stop recirculation with a single shadow update
    PatchStopRecirculation { thing_name: String },

    /// Set the domestic temperature with a single shadow update
    PatchTemperature { thing_name: String, temperature: u32 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = config.logging.level.min(LogLevel::Debug);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(config.logging.targets())
        .init();

    let token = resolve_token(&config, cli.token.clone(), cli.dry_run)?;

    if cli.dry_run {
        let transport = Arc::new(DryRunTransport::new());
        let client = DeviceCommandClient::with_config(transport.clone(), &token, config.client);
        run(&client, cli.command).await?;

        for request in transport.take_requests() {
            println!("{} {}", request.method, request.url);
            println!("{}", request.body.encode()?);
        }
    } else {
        let transport = ReqwestTransport::with_timeout(config.transport.timeout()?)
            .context("Failed to create HTTP client")?;
        let client = DeviceCommandClient::with_config(transport, &token, config.client);
        run(&client, cli.command).await?;
    }

    Ok(())
}

fn resolve_token(
    config: &Config,
    explicit: Option<String>,
    dry_run: bool,
) -> Result<String, ConfigError> {
    match config.resolve_token(explicit) {
        Err(ConfigError::MissingToken) if dry_run => Ok(DRY_RUN_TOKEN.to_string()),
        result => result,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

async fn run<T: Transport>(client: &DeviceCommandClient<T>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info { device_id } => {
            let response = client
                .get_device_info(&device_id)
                .await
                .with_context(|| format!("Failed to fetch device info for {}", device_id))?;
            println!("{}", response.body);
        }
        Command::StartRecirculation {
            user_uuid,
            device_id,
            duration,
        } => {
            client
                .start_recirculation(&user_uuid, &device_id, duration)
                .await
                .with_context(|| format!("Failed to start recirculation on {}", device_id))?;
        }
        Command::StopRecirculation {
            user_uuid,
            device_id,
        } => {
            client
                .stop_recirculation(&user_uuid, &device_id)
                .await
                .with_context(|| format!("Failed to stop recirculation on {}", device_id))?;
        }
        Command::SetTemperature {
            user_uuid,
            device_id,
            temperature,
        } => {
            client
                .set_temperature(&user_uuid, &device_id, temperature)
                .await
                .with_context(|| format!("Failed to set temperature on {}", device_id))?;
        }
        Command::PatchRecirculation {
            thing_name,
            duration,
        } => {
            let response = client
                .patch_recirculation(&thing_name, duration)
                .await
                .with_context(|| format!("Failed to patch recirculation on {}", thing_name))?;
            println!("{}", response.body);
        }
        Command::PatchStopRecirculation { thing_name } => {
            let response = client
                .patch_stop_recirculation(&thing_name)
                .await
                .with_context(|| format!("Failed to patch recirculation on {}", thing_name))?;
            println!("{}", response.body);
        }
        Command::PatchTemperature {
            thing_name,
            temperature,
        } => {
            let response = client
                .patch_set_temperature(&thing_name, temperature)
                .await
                .with_context(|| format!("Failed to patch temperature on {}", thing_name))?;
            println!("{}", response.body);
        }
    }

    Ok(())
}
