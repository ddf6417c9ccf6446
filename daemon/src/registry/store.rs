//! Deployment registry persistence
//!
//! The store owns the mutual-exclusion boundary around the backing document:
//! every read goes back to disk (webhook events and admin edits may
//! interleave) and every mutation is an atomic whole-document replace.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{Error, Result};
use crate::filesys::file::File;
use crate::registry::model::{Deployment, RegistryDocument};

/// Mutex-guarded registry store
pub struct RegistryStore {
    file: Option<File>,
    lock: Mutex<()>,
}

impl RegistryStore {
    /// Create a store over the configured registry path. `None` means no
    /// backing store was configured; every operation will report that as a
    /// configuration error rather than treating the registry as empty.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            file: path.map(File::new),
            lock: Mutex::new(()),
        }
    }

    /// Load the whole registry document
    pub async fn load(&self) -> Result<RegistryDocument> {
        let _guard = self.lock.lock().await;
        self.load_locked().await
    }

    /// Find the first deployment matching (repository, branch)
    pub async fn lookup(&self, repository: &str, branch: &str) -> Result<Option<Deployment>> {
        let doc = self.load().await?;
        Ok(doc
            .deployments
            .into_iter()
            .find(|d| d.repository == repository && d.branch == branch))
    }

    /// Find a deployment by name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Deployment>> {
        let doc = self.load().await?;
        Ok(doc.deployments.into_iter().find(|d| d.name == name))
    }

    /// Add a deployment and persist
    pub async fn add(&self, deployment: Deployment) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load_locked().await?;
        doc.deployments.push(deployment);
        self.save_locked(&doc).await
    }

    /// Replace the deployment with the given name and persist
    pub async fn update(&self, name: &str, deployment: Deployment) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load_locked().await?;
        let slot = doc
            .deployments
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::NotFound(format!("no deployment named {}", name)))?;
        *slot = deployment;
        self.save_locked(&doc).await
    }

    /// Remove the deployment with the given name and persist
    pub async fn remove(&self, name: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load_locked().await?;
        let before = doc.deployments.len();
        doc.deployments.retain(|d| d.name != name);
        if doc.deployments.len() == before {
            return Err(Error::NotFound(format!("no deployment named {}", name)));
        }
        self.save_locked(&doc).await
    }

    fn backing_file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| {
            Error::Config("no registry file configured (set registry_file in settings)".to_string())
        })
    }

    async fn load_locked(&self) -> Result<RegistryDocument> {
        let file = self.backing_file()?;
        if !file.exists().await {
            return Err(Error::Registry(format!(
                "registry file missing: {} (run slipway --install to create it)",
                file.path().display()
            )));
        }

        let contents = file.read_string().await.map_err(|e| {
            Error::Registry(format!(
                "registry file unreadable: {}: {}",
                file.path().display(),
                e
            ))
        })?;
        let doc: RegistryDocument = serde_json::from_str(&contents)?;
        Ok(doc)
    }

    async fn save_locked(&self, doc: &RegistryDocument) -> Result<()> {
        validate(doc)?;

        let file = self.backing_file()?;
        let contents = serde_json::to_string_pretty(doc)?;
        file.write_atomic(contents.as_bytes()).await?;
        // The document may carry environment values
        file.set_permissions_600().await?;

        debug!(
            "Saved registry with {} deployment(s) to {}",
            doc.deployments.len(),
            file.path().display()
        );
        Ok(())
    }
}

/// Reject documents that would make lookup ambiguous or container naming
/// collide.
fn validate(doc: &RegistryDocument) -> Result<()> {
    let mut names = HashSet::new();
    let mut targets = HashSet::new();

    for d in &doc.deployments {
        if d.name.is_empty() {
            return Err(Error::Validation("deployment name must not be empty".to_string()));
        }
        if !names.insert(d.name.as_str()) {
            return Err(Error::Validation(format!(
                "duplicate deployment name: {}",
                d.name
            )));
        }
        if !targets.insert((d.repository.as_str(), d.branch.as_str())) {
            return Err(Error::Validation(format!(
                "duplicate deployment target: {} @ {}",
                d.repository, d.branch
            )));
        }
    }

    Ok(())
}
