//! Container runtime boundary

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::deploy::process::run_command;
use crate::errors::{Error, Result};

/// Capability interface over the container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Build `image` from the `context` directory using `dockerfile`
    async fn build(&self, image: &str, context: &Path, dockerfile: &Path) -> Result<()>;

    /// Best-effort stop and removal of the container named `name`. Absence
    /// of such a container is not an error; failures are logged, never
    /// propagated.
    async fn stop_and_remove(&self, name: &str);

    /// Start a detached container from `image`, named `name`, publishing
    /// host `port` to container port 80 with `variables` in its environment
    async fn run(
        &self,
        image: &str,
        name: &str,
        port: u16,
        variables: &BTreeMap<String, String>,
    ) -> Result<()>;
}

/// ContainerRuntime backed by the `docker` CLI
pub struct DockerCli;

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn build(&self, image: &str, context: &Path, dockerfile: &Path) -> Result<()> {
        let dockerfile = dockerfile.to_string_lossy();
        let context = context.to_string_lossy();
        let output = run_command(
            "docker",
            &["build", "-f", &dockerfile, "-t", image, &context],
            None,
        )
        .await
        .map_err(|e| Error::Build(format!("failed to run docker build: {}", e)))?;
        if !output.success {
            return Err(Error::Build(format!(
                "docker build failed for {}: {}",
                image,
                output.detail()
            )));
        }
        Ok(())
    }

    async fn stop_and_remove(&self, name: &str) {
        match run_command("docker", &["stop", name], None).await {
            Ok(output) if !output.success => {
                debug!("docker stop {}: {}", name, output.detail());
            }
            Ok(_) => {}
            Err(e) => debug!("failed to run docker stop {}: {}", name, e),
        }
        match run_command("docker", &["rm", name], None).await {
            Ok(output) if !output.success => {
                debug!("docker rm {}: {}", name, output.detail());
            }
            Ok(_) => {}
            Err(e) => debug!("failed to run docker rm {}: {}", name, e),
        }
    }

    async fn run(
        &self,
        image: &str,
        name: &str,
        port: u16,
        variables: &BTreeMap<String, String>,
    ) -> Result<()> {
        let publish = format!("{}:80", port);
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            name.to_string(),
            "-p".to_string(),
            publish,
        ];
        for (key, value) in variables {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(image.to_string());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = run_command("docker", &args, None)
            .await
            .map_err(|e| Error::Container(format!("failed to run docker run: {}", e)))?;
        if !output.success {
            return Err(Error::Container(format!(
                "docker run failed for {}: {}",
                name,
                output.detail()
            )));
        }
        Ok(())
    }
}
