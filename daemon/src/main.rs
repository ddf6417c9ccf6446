//! Slipway - Entry Point
//!
//! A continuous-deployment daemon: push webhooks in, rebuilt containers and
//! refreshed nginx routing out.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use slipway::app::options::{AppOptions, ServerOptions};
use slipway::app::run::run;
use slipway::app::state::AppState;
use slipway::deploy::reconciler::ReconcilerOptions;
use slipway::deploy::routing::RoutingOptions;
use slipway::installer::install::install;
use slipway::logs::{init_logging, LogOptions};
use slipway::storage::layout::StorageLayout;
use slipway::storage::settings::Settings;
use slipway::utils::version_info;

use secrecy::SecretString;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Run the installer
    if cli_args.contains_key("install") {
        return install(&cli_args).await;
    }

    // Run the daemon starting here

    // Retrieve the settings file
    let layout = match cli_args.get("base") {
        Some(base) => StorageLayout::new(PathBuf::from(base)),
        None => StorageLayout::default(),
    };
    let settings_file = layout.settings_file();
    let settings = match settings_file.read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {:?}: {}", settings_file.path(), e);
            eprintln!("Run: slipway --install");
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.json_logs,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Assemble run options from the settings
    let options = AppOptions {
        server: ServerOptions {
            host: settings.server.host.clone(),
            port: settings.server.port,
        },
        registry_file: settings.registry_file.clone(),
        reconciler: ReconcilerOptions {
            apps_dir: settings.apps_dir.clone(),
            clone_base: settings.clone_base.clone(),
        },
        routing: RoutingOptions {
            config_file: settings.nginx.config_file.clone(),
            enabled_dir: settings.nginx.enabled_dir.clone(),
            management_path: settings.nginx.management_path.clone(),
            management_port: settings.server.port,
        },
        webhook_secret: settings.webhook_secret.clone().map(SecretString::from),
        ..Default::default()
    };

    // One-shot routing regeneration, then exit
    if cli_args.contains_key("sync-routing") {
        return sync_routing(options).await;
    }

    info!("Running Slipway with options: {:?}", options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the daemon: {e}");
        std::process::exit(1);
    }
}

/// Regenerate routing from the current registry state and exit
async fn sync_routing(options: AppOptions) {
    let state =
        match AppState::init(options.registry_file, options.reconciler, options.routing).await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to initialize: {}", e);
                std::process::exit(1);
            }
        };

    match state.reconciler.sync_routing().await {
        Ok(()) => println!("Routing synchronized"),
        Err(e) => {
            error!("Routing sync failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
