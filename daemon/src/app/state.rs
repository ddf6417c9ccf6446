//! Application state management

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::deploy::docker::{ContainerRuntime, DockerCli};
use crate::deploy::git::{GitClient, SystemGit};
use crate::deploy::nginx::{NginxCtl, ProxyController};
use crate::deploy::reconciler::{Reconciler, ReconcilerOptions};
use crate::deploy::routing::{RoutingConfigurator, RoutingOptions};
use crate::errors::Result;
use crate::registry::store::RegistryStore;

/// Main application state
pub struct AppState {
    /// Deployment registry store
    pub registry: Arc<RegistryStore>,

    /// Deployment pipeline driver
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    /// Initialize application state with the system-backed tools.
    ///
    /// Probes the registry once so a missing or malformed backing store
    /// fails at startup instead of on the first event.
    pub async fn init(
        registry_file: Option<PathBuf>,
        reconciler_options: ReconcilerOptions,
        routing_options: RoutingOptions,
    ) -> Result<Self> {
        info!("Initializing application state...");

        let registry = Arc::new(RegistryStore::new(registry_file));
        let doc = registry.load().await?;
        info!("Registry loaded: {} deployment(s)", doc.deployments.len());

        let git: Arc<dyn GitClient> = Arc::new(SystemGit);
        let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerCli);
        let proxy: Arc<dyn ProxyController> = Arc::new(NginxCtl);

        let routing = Arc::new(RoutingConfigurator::new(routing_options, proxy));
        let reconciler = Arc::new(Reconciler::new(
            registry.clone(),
            git,
            runtime,
            routing,
            reconciler_options,
        ));

        Ok(Self {
            registry,
            reconciler,
        })
    }
}
