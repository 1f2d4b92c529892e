// ABOUTME: Main entry point for the goal-alert gateway
// ABOUTME: Initializes logging, config, the Telegram outbound client, and the orchestrator

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use goalgate::{config::Config, orchestrator::Orchestrator, telegram::TelegramOutbound};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "goalgate", about = "Telegram gateway relaying goal derail alerts")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to log panics before they crash the process
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC! Gateway crashed with the following error:\n");
        eprintln!("{}", panic_info);
        eprintln!("\nBacktrace:");
        eprintln!("{:?}", std::backtrace::Backtrace::force_capture());
    }));

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting goal-alert gateway");

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    tracing::info!(
        base_url = %config.gateway.base_url,
        bind_addr = %config.bind_addr(),
        "Configuration loaded"
    );

    let token = config.bot_token()?;
    let outbound = TelegramOutbound::connect(&token).await?;

    let orchestrator = Orchestrator::new(Arc::new(config), Arc::new(outbound));
    orchestrator.run(shutdown_signal()).await
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
