//! chatops-bridge: Telegram Automation Bridge Main Binary
//!
//! Bridges a Telegram bot to an automation hub: chat users register an
//! API key once, then launch hub commands from a button menu; hub
//! automation pushes notifications back out through the HTTP ingress.
//!
//! Usage:
//!   chatops-bridge              - Run with ./bridge.yml
//!   chatops-bridge -c <path>    - Run with an explicit config file
//!   chatops-bridge --help       - Show help

mod push;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use chatops_core::{
    BridgeConfig, Broadcaster, CommandBackend, CommandMenu, Dispatcher, EventHandler, HubClient,
    SessionRegistry, Transport,
};
use chatops_telegram::{PollerConfig, TelegramApi};

/// Run mode
enum RunMode {
    /// Run the bridge with the given config file
    Run { config_path: String },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            Ok(())
        }
        RunMode::Version => {
            println!("chatops-bridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        RunMode::Run { config_path } => run(&config_path).await,
    }
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-V" => return RunMode::Version,
            "--config" | "-c" => config_path = args.next(),
            _ => {}
        }
    }

    let config_path = config_path
        .or_else(|| std::env::var("BRIDGE_CONFIG").ok())
        .unwrap_or_else(|| "bridge.yml".to_string());

    RunMode::Run { config_path }
}

/// Print help message
fn print_help() {
    println!("chatops-bridge - Telegram Automation Bridge");
    println!();
    println!("Usage:");
    println!("  chatops-bridge              Run with ./bridge.yml");
    println!("  chatops-bridge -c <path>    Run with an explicit config file");
    println!("  chatops-bridge --help       Show this help message");
    println!("  chatops-bridge --version    Show version");
    println!();
    println!("Environment Variables:");
    println!("  BRIDGE_CONFIG               Config file path (overridden by -c)");
    println!("  RUST_LOG                    Log filter (default: info)");
}

async fn run(config_path: &str) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = BridgeConfig::from_yaml_file(config_path)
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting chatops-bridge (config: {})", config_path);

    // Startup is all-or-nothing: a bad menu, client setup or listen
    // address aborts before the bridge touches Telegram or the hub.
    let menu = Arc::new(
        CommandMenu::build(&config.menu).map_err(|e| anyhow::anyhow!("Menu error: {}", e))?,
    );
    tracing::info!("Menu ready: {} commands", menu.commands().len());

    let hub = Arc::new(
        HubClient::new(
            &config.hub.url,
            &config.hub.service_key,
            Duration::from_secs(config.hub.timeout),
            config.wait,
        )
        .map_err(|e| anyhow::anyhow!("Hub client error: {}", e))?,
    );

    let api = Arc::new(TelegramApi::new(&config.token));
    let registry = Arc::new(SessionRegistry::new());

    // Restore persisted registrations before the first poll.
    let store = config.state_file.clone().map(state::StateFile::new);
    if let Some(store) = &store {
        match store.load() {
            Ok(Some(map)) => {
                tracing::info!("Restored {} registered chats", map.len());
                registry.restore(map);
            }
            Ok(None) => tracing::info!("No saved state, starting empty"),
            Err(e) => tracing::warn!("State file unreadable, starting empty: {}", e),
        }
    }

    let dispatcher: Arc<dyn EventHandler> = Arc::new(Dispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&menu),
        Arc::clone(&hub) as Arc<dyn CommandBackend>,
        Arc::clone(&api) as Arc<dyn Transport>,
    ));
    let broadcaster = Arc::new(Broadcaster::new(
        Arc::clone(&registry),
        Arc::clone(&api) as Arc<dyn Transport>,
    ));

    // Bind the push ingress here: an occupied or invalid listen address
    // must abort startup, not surface later from inside the service task.
    let push_ingress = match &config.push {
        Some(push_config) => {
            let listener = tokio::net::TcpListener::bind(push_config.listen.as_str())
                .await
                .map_err(|e| {
                    anyhow::anyhow!("Push ingress bind error ({}): {}", push_config.listen, e)
                })?;
            Some((listener, push_config.token.clone()))
        }
        None => None,
    };

    // Track running services for graceful shutdown
    let (shutdown_tx, _) = broadcast::channel(1);
    let mut service_handles = Vec::new();

    // Telegram poller
    {
        let poller_config = PollerConfig {
            interval: config.interval,
            retry_cap: config.retry_interval,
        };
        let api = Arc::clone(&api);
        let handler = Arc::clone(&dispatcher);
        let shutdown = shutdown_tx.subscribe();
        service_handles.push(tokio::spawn(async move {
            chatops_telegram::poller::run(api, handler, poller_config, shutdown).await;
        }));
    }

    // Push ingress
    if let Some((listener, token)) = push_ingress {
        let broadcaster = Arc::clone(&broadcaster);
        let shutdown = shutdown_tx.subscribe();
        service_handles.push(tokio::spawn(async move {
            if let Err(e) = push::serve(listener, token, broadcaster, shutdown).await {
                tracing::error!("Push ingress error: {}", e);
            }
        }));
    } else {
        tracing::info!("Push ingress disabled (not configured)");
    }

    // State flusher
    if let Some(store) = store {
        let registry = Arc::clone(&registry);
        let shutdown = shutdown_tx.subscribe();
        service_handles.push(tokio::spawn(async move {
            state::flush_loop(store, registry, state::FLUSH_INTERVAL, shutdown).await;
        }));
    } else {
        tracing::info!("State persistence disabled (no state-file configured)");
    }

    tracing::info!("chatops-bridge initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    // Every service reacts to the channel, so joining is bounded.
    let _ = shutdown_tx.send(());
    for handle in service_handles {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
