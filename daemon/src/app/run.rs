//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions, ServerOptions};
use crate::app::state::AppState;
use crate::errors::Error;
use crate::server::serve::serve;
use crate::server::state::ServerState;

/// Run the Slipway daemon
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Error> {
    info!("Initializing Slipway...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    // Initialize the app state and the HTTP server
    if let Err(e) = init(options, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start daemon: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    // The daemon is event-driven; it runs until told to stop
    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), Error> {
    let AppOptions {
        lifecycle: _,
        server,
        registry_file,
        reconciler,
        routing,
        webhook_secret,
    } = options;

    let app_state = Arc::new(AppState::init(registry_file, reconciler, routing).await?);

    init_http_server(
        &server,
        app_state,
        webhook_secret,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await
}

async fn init_http_server(
    options: &ServerOptions,
    app_state: Arc<AppState>,
    webhook_secret: Option<SecretString>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), Error> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(
        app_state.registry.clone(),
        app_state.reconciler.clone(),
        webhook_secret,
    );

    let server_handle = serve(options, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    server_handle: Option<JoinHandle<Result<(), Error>>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            server_handle: None,
        }
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), Error>>,
    ) -> Result<(), Error> {
        if self.server_handle.is_some() {
            return Err(Error::Shutdown("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), Error> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), Error> {
        info!("Shutting down Slipway...");

        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| Error::Shutdown(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
