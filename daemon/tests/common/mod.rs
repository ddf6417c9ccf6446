//! Shared test fixtures: recording fakes for the tool boundaries and a
//! harness that wires a reconciler over a temporary filesystem layout.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use slipway::deploy::docker::ContainerRuntime;
use slipway::deploy::git::GitClient;
use slipway::deploy::nginx::ProxyController;
use slipway::deploy::reconciler::{Reconciler, ReconcilerOptions};
use slipway::deploy::routing::{RoutingConfigurator, RoutingOptions};
use slipway::errors::{Error, Result};
use slipway::registry::model::RegistryDocument;
use slipway::registry::store::RegistryStore;

/// GitClient fake. Clones materialize a directory with a Dockerfile so the
/// build step's existence checks pass; `remote` is what any existing
/// directory claims to track. An optional per-call delay widens the window
/// in which overlapping invocations would be observed; `max_in_flight`
/// records the largest number of calls ever running at once.
pub struct RecordingGit {
    pub calls: Mutex<Vec<String>>,
    pub remote: Mutex<Option<String>>,
    pub delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingGit {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            remote: Mutex::new(None),
            delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_remote(&self, url: &str) {
        *self.remote.lock().unwrap() = Some(url.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GitClient for RecordingGit {
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        self.enter().await;
        self.record(format!("clone {} {}", url, branch));
        tokio::fs::create_dir_all(dest).await?;
        tokio::fs::write(dest.join("Dockerfile"), "FROM scratch\n").await?;
        self.set_remote(url);
        self.exit();
        Ok(())
    }

    async fn fetch(&self, _workdir: &Path) -> Result<()> {
        self.enter().await;
        self.record("fetch".to_string());
        self.exit();
        Ok(())
    }

    async fn reset_to_remote(&self, _workdir: &Path, branch: &str) -> Result<()> {
        self.enter().await;
        self.record(format!("reset origin/{}", branch));
        self.exit();
        Ok(())
    }

    async fn remote_url(&self, _workdir: &Path) -> Result<Option<String>> {
        self.enter().await;
        self.record("remote_url".to_string());
        let remote = self.remote.lock().unwrap().clone();
        self.exit();
        Ok(remote)
    }
}

/// ContainerRuntime fake tracking the set of running containers by name
pub struct RecordingRuntime {
    pub calls: Mutex<Vec<String>>,
    pub running: Mutex<Vec<String>>,
    pub fail_build: AtomicBool,
    pub fail_run: AtomicBool,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            running: Mutex::new(Vec::new()),
            fail_build: AtomicBool::new(false),
            fail_run: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn running(&self) -> Vec<String> {
        self.running.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerRuntime for RecordingRuntime {
    async fn build(&self, image: &str, _context: &Path, _dockerfile: &Path) -> Result<()> {
        self.record(format!("build {}", image));
        if self.fail_build.load(Ordering::SeqCst) {
            return Err(Error::Build("scripted build failure".to_string()));
        }
        Ok(())
    }

    async fn stop_and_remove(&self, name: &str) {
        self.record(format!("stop_and_remove {}", name));
        self.running.lock().unwrap().retain(|n| n != name);
    }

    async fn run(
        &self,
        image: &str,
        name: &str,
        port: u16,
        _variables: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.record(format!("run {} {} {}", image, name, port));
        if self.fail_run.load(Ordering::SeqCst) {
            return Err(Error::Container("scripted run failure".to_string()));
        }
        self.running.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// ProxyController fake recording the validate/reload order
pub struct RecordingProxy {
    pub calls: Mutex<Vec<String>>,
    pub fail_validate: AtomicBool,
}

impl RecordingProxy {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_validate: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProxyController for RecordingProxy {
    async fn validate(&self) -> Result<()> {
        self.calls.lock().unwrap().push("validate".to_string());
        if self.fail_validate.load(Ordering::SeqCst) {
            return Err(Error::Proxy("scripted validation failure".to_string()));
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.calls.lock().unwrap().push("reload".to_string());
        Ok(())
    }
}

/// A reconciler over fakes and a temporary on-disk layout
pub struct Harness {
    pub base: tempfile::TempDir,
    pub git: Arc<RecordingGit>,
    pub runtime: Arc<RecordingRuntime>,
    pub proxy: Arc<RecordingProxy>,
    pub registry: Arc<RegistryStore>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub fn new(doc: &RegistryDocument) -> Self {
        let base = tempfile::tempdir().unwrap();
        let registry_path = base.path().join("deployments.json");
        std::fs::write(&registry_path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
        std::fs::create_dir_all(base.path().join("sites-enabled")).unwrap();

        let git = Arc::new(RecordingGit::new());
        let runtime = Arc::new(RecordingRuntime::new());
        let proxy = Arc::new(RecordingProxy::new());
        let registry = Arc::new(RegistryStore::new(Some(registry_path)));

        let routing = Arc::new(RoutingConfigurator::new(
            RoutingOptions {
                config_file: base.path().join("sites-available/slipway.conf"),
                enabled_dir: base.path().join("sites-enabled"),
                management_path: "/deploy".to_string(),
                management_port: 9000,
            },
            proxy.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(
            registry.clone(),
            git.clone(),
            runtime.clone(),
            routing,
            ReconcilerOptions {
                apps_dir: base.path().join("apps"),
                clone_base: "https://github.com".to_string(),
            },
        ));

        Self {
            base,
            git,
            runtime,
            proxy,
            registry,
            reconciler,
        }
    }

    pub fn workdir(&self, name: &str) -> PathBuf {
        self.base.path().join("apps").join(name)
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.path().join("sites-available/slipway.conf")
    }

    pub fn enabled_link(&self) -> PathBuf {
        self.base.path().join("sites-enabled/slipway.conf")
    }
}
