use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use interop_monitor::{
    abi::EventDecoder,
    config::AppConfig,
    notification::NotificationService,
    providers::{EvmRpcSource, create_provider},
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, default_value = "configs/app.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the monitor until interrupted.
    Run,
    /// Loads and validates the configuration, then exits.
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_supervisor(&cli.config).await?,
        Commands::ValidateConfig => validate_config(&cli.config)?,
    }

    Ok(())
}

fn validate_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(path)?;
    tracing::info!(
        path = %path.display(),
        window = config.aggregate_block_amount,
        telegram = config.notifiers.telegram.is_some(),
        discord = config.notifiers.discord.is_some(),
        webhook = config.notifiers.webhook.is_some(),
        "Configuration is valid."
    );
    Ok(())
}

async fn run_supervisor(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(path = %path.display(), "Loading application configuration...");
    let config = AppConfig::load(path)?;
    tracing::debug!(
        sender_rpc_urls = ?config.sender_rpc_urls,
        receiver_rpc_urls = ?config.receiver_rpc_urls,
        window = config.aggregate_block_amount,
        "Configuration loaded."
    );

    let sender_provider =
        create_provider(config.sender_rpc_urls.clone(), config.rpc_retry_config.clone())?;
    let receiver_provider =
        create_provider(config.receiver_rpc_urls.clone(), config.rpc_retry_config.clone())?;
    tracing::info!(
        retry_policy = ?config.rpc_retry_config,
        "Chain readers initialized with fallback and retry policy."
    );

    let decoder = EventDecoder::with_default_abis()?;

    let notifier = NotificationService::from_config(&config.notifiers, &config.http_retry_config)?;
    tracing::info!(channels = ?notifier.channel_names(), "Notification service initialized.");

    let supervisor = Supervisor::builder()
        .config(config)
        .sender_reader(Arc::new(EvmRpcSource::new(sender_provider)))
        .receiver_reader(Arc::new(EvmRpcSource::new(receiver_provider)))
        .decoder(Arc::new(decoder))
        .notifier(Arc::new(notifier))
        .build()
        .await?;

    tracing::info!("Supervisor initialized, starting monitoring...");

    supervisor.run().await?;

    Ok(())
}
