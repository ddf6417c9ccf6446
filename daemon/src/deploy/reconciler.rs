//! Reconciliation orchestrator
//!
//! One reconciliation runs the pipeline for a single deployment:
//! synchronize the working copy, build the image, replace the container,
//! regenerate routing. Steps run in strict sequence and the first failure
//! ends the run; there is no rollback — every step is idempotent, so
//! replaying the event after the cause is fixed converges to the desired
//! state. Runs for the same deployment name are serialized, runs for
//! different names may overlap.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::deploy::container;
use crate::deploy::docker::ContainerRuntime;
use crate::deploy::git::GitClient;
use crate::deploy::image;
use crate::deploy::repo;
use crate::deploy::routing::RoutingConfigurator;
use crate::errors::{Error, Result};
use crate::registry::model::Deployment;
use crate::registry::store::RegistryStore;

/// Terminal outcome of handling one inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No deployment matches the event's (repository, branch)
    Ignored,
    /// The full pipeline ran to completion
    Deployed,
}

/// Last reconciliation result for one deployment, kept for the admin surface
#[derive(Debug, Clone, Serialize)]
pub struct DeployStatus {
    pub state: DeployState,
    pub message: String,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Deployed,
    Failed,
}

/// Filesystem and clone-URL conventions the pipeline derives paths from
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Root directory holding one working copy per deployment name
    pub apps_dir: PathBuf,

    /// URL prefix prepended to `<repository>.git` when cloning
    pub clone_base: String,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            apps_dir: PathBuf::from("/opt/apps"),
            clone_base: "https://github.com".to_string(),
        }
    }
}

/// Drives the deployment pipeline for inbound events and manual triggers
pub struct Reconciler {
    registry: Arc<RegistryStore>,
    git: Arc<dyn GitClient>,
    runtime: Arc<dyn ContainerRuntime>,
    routing: Arc<RoutingConfigurator>,
    options: ReconcilerOptions,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    statuses: Mutex<HashMap<String, DeployStatus>>,
}

impl Reconciler {
    pub fn new(
        registry: Arc<RegistryStore>,
        git: Arc<dyn GitClient>,
        runtime: Arc<dyn ContainerRuntime>,
        routing: Arc<RoutingConfigurator>,
        options: ReconcilerOptions,
    ) -> Self {
        Self {
            registry,
            git,
            runtime,
            routing,
            options,
            locks: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
        }
    }

    /// Handle a push event: look up the matching deployment and run the
    /// pipeline for it. A miss is an explicit Ignored outcome, not an error.
    pub async fn reconcile(&self, repository: &str, branch: &str) -> Result<Outcome> {
        let Some(deployment) = self.registry.lookup(repository, branch).await? else {
            info!("No deployment matches {} @ {}", repository, branch);
            return Ok(Outcome::Ignored);
        };

        self.deploy(&deployment).await?;
        Ok(Outcome::Deployed)
    }

    /// Replay the pipeline for a deployment by name (operator trigger)
    pub async fn deploy_by_name(&self, name: &str) -> Result<()> {
        let deployment = self
            .registry
            .find_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no deployment named {}", name)))?;
        self.deploy(&deployment).await
    }

    /// Regenerate routing from the current registry state without deploying
    pub async fn sync_routing(&self) -> Result<()> {
        let doc = self.registry.load().await?;
        self.routing.sync(&doc.deployments).await
    }

    /// Last recorded outcome per deployment name
    pub async fn statuses(&self) -> HashMap<String, DeployStatus> {
        self.statuses.lock().await.clone()
    }

    async fn deploy(&self, deployment: &Deployment) -> Result<()> {
        let lock = self.name_lock(&deployment.name).await;
        let _guard = lock.lock().await;

        let result = self.run_pipeline(deployment).await;
        self.record(&deployment.name, &result).await;
        result
    }

    async fn run_pipeline(&self, deployment: &Deployment) -> Result<()> {
        let event = Uuid::new_v4();
        let workdir = self.options.apps_dir.join(&deployment.name);
        let clone_url = format!(
            "{}/{}.git",
            self.options.clone_base.trim_end_matches('/'),
            deployment.repository
        );
        let image_tag = image::image_tag(&deployment.repository, &deployment.branch);

        info!(
            event = %event,
            "Deploying {}: {} @ {}",
            deployment.name, deployment.repository, deployment.branch
        );

        repo::synchronize(self.git.as_ref(), &workdir, &clone_url, &deployment.branch).await?;

        info!(event = %event, "Building {}", image_tag);
        image::build(
            self.runtime.as_ref(),
            &image_tag,
            &workdir,
            &deployment.dockerfile_path,
        )
        .await?;

        info!(event = %event, "Replacing container {}", deployment.name);
        container::replace(
            self.runtime.as_ref(),
            &image_tag,
            &deployment.name,
            deployment.port,
            &deployment.variables,
        )
        .await?;

        info!(event = %event, "Refreshing routing");
        let doc = self.registry.load().await?;
        self.routing.sync(&doc.deployments).await?;

        info!(event = %event, "Deployed {}", deployment.name);
        Ok(())
    }

    async fn record(&self, name: &str, result: &Result<()>) {
        let status = match result {
            Ok(()) => DeployStatus {
                state: DeployState::Deployed,
                message: "Deployment successful".to_string(),
                finished_at: Utc::now(),
            },
            Err(e) => {
                error!("Deployment of {} failed: {}", name, e);
                DeployStatus {
                    state: DeployState::Failed,
                    message: e.to_string(),
                    finished_at: Utc::now(),
                }
            }
        };
        self.statuses.lock().await.insert(name.to_string(), status);
    }

    async fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
