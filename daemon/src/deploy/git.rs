//! Version-control boundary

use std::path::Path;

use async_trait::async_trait;

use crate::deploy::process::run_command;
use crate::errors::{Error, Result};

/// Capability interface over the version-control tool
#[async_trait]
pub trait GitClient: Send + Sync {
    /// Clone `branch` of `url` into `dest`
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()>;

    /// Fetch all refs from origin
    async fn fetch(&self, workdir: &Path) -> Result<()>;

    /// Force the local tree to match `origin/<branch>` exactly
    async fn reset_to_remote(&self, workdir: &Path, branch: &str) -> Result<()>;

    /// Configured origin URL of the checkout at `workdir`, or `None` when the
    /// directory is not a working copy (or has no origin remote).
    async fn remote_url(&self, workdir: &Path) -> Result<Option<String>>;
}

/// GitClient backed by the system `git` binary
pub struct SystemGit;

#[async_trait]
impl GitClient for SystemGit {
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        let output = run_command("git", &["clone", "-b", branch, url, &dest], None)
            .await
            .map_err(|e| Error::Git(format!("failed to run git clone: {}", e)))?;
        if !output.success {
            return Err(Error::Git(format!("git clone failed: {}", output.detail())));
        }
        Ok(())
    }

    async fn fetch(&self, workdir: &Path) -> Result<()> {
        let output = run_command("git", &["fetch", "origin"], Some(workdir))
            .await
            .map_err(|e| Error::Git(format!("failed to run git fetch: {}", e)))?;
        if !output.success {
            return Err(Error::Git(format!("git fetch failed: {}", output.detail())));
        }
        Ok(())
    }

    async fn reset_to_remote(&self, workdir: &Path, branch: &str) -> Result<()> {
        let target = format!("origin/{}", branch);
        let output = run_command("git", &["reset", "--hard", &target], Some(workdir))
            .await
            .map_err(|e| Error::Git(format!("failed to run git reset: {}", e)))?;
        if !output.success {
            return Err(Error::Git(format!("git reset failed: {}", output.detail())));
        }
        Ok(())
    }

    async fn remote_url(&self, workdir: &Path) -> Result<Option<String>> {
        let inside = run_command("git", &["rev-parse", "--is-inside-work-tree"], Some(workdir))
            .await
            .map_err(|e| Error::Git(format!("failed to run git rev-parse: {}", e)))?;
        if !inside.success {
            return Ok(None);
        }

        let output = run_command("git", &["config", "--get", "remote.origin.url"], Some(workdir))
            .await
            .map_err(|e| Error::Git(format!("failed to run git config: {}", e)))?;
        if !output.success {
            // A work tree without an origin remote; treated like a foreign checkout
            return Ok(None);
        }
        Ok(Some(output.stdout.trim().to_string()))
    }
}
