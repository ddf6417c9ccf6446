//! Working-copy synchronizer
//!
//! A working copy is a disposable mirror of one (repository, branch): it is
//! cloned on first use, force-reset to the remote tip thereafter, and never
//! merged. A pre-existing checkout that points anywhere else is a conflict
//! the operator has to resolve; the synchronizer will not overwrite it.

use std::path::Path;

use tracing::{debug, info};

use crate::deploy::git::GitClient;
use crate::errors::{Error, Result};

/// Bring the working copy at `workdir` to the tip of `branch` on `url`
pub async fn synchronize(
    git: &dyn GitClient,
    workdir: &Path,
    url: &str,
    branch: &str,
) -> Result<()> {
    match tokio::fs::metadata(workdir).await {
        Ok(meta) if meta.is_dir() => {
            verify_remote(git, workdir, url).await?;
            debug!("Fetching updates for {}", workdir.display());
            git.fetch(workdir).await?;
            git.reset_to_remote(workdir, branch).await?;
            info!("Reset {} to origin/{}", workdir.display(), branch);
        }
        Ok(_) => {
            return Err(Error::Conflict(format!(
                "{} exists but is not a directory",
                workdir.display()
            )));
        }
        Err(_) => {
            if let Some(parent) = workdir.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            git.clone_repo(url, branch, workdir).await?;
            info!("Cloned {} ({}) into {}", url, branch, workdir.display());
        }
    }
    Ok(())
}

async fn verify_remote(git: &dyn GitClient, workdir: &Path, url: &str) -> Result<()> {
    match git.remote_url(workdir).await? {
        Some(remote) if remote == url => Ok(()),
        Some(remote) => Err(Error::Conflict(format!(
            "working copy {} tracks {} but {} was expected",
            workdir.display(),
            remote,
            url
        ))),
        None => Err(Error::Conflict(format!(
            "{} exists but is not a git working copy",
            workdir.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Records calls; reports a fixed remote for any existing directory
    struct ScriptedGit {
        remote: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGit {
        fn new(remote: Option<&str>) -> Self {
            Self {
                remote: remote.map(str::to_string),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl GitClient for ScriptedGit {
        async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
            self.record(format!("clone {} {} {}", url, branch, dest.display()));
            tokio::fs::create_dir_all(dest).await?;
            Ok(())
        }

        async fn fetch(&self, _workdir: &Path) -> Result<()> {
            self.record("fetch".to_string());
            Ok(())
        }

        async fn reset_to_remote(&self, _workdir: &Path, branch: &str) -> Result<()> {
            self.record(format!("reset origin/{}", branch));
            Ok(())
        }

        async fn remote_url(&self, _workdir: &Path) -> Result<Option<String>> {
            self.record("remote_url".to_string());
            Ok(self.remote.clone())
        }
    }

    fn workdir(base: &tempfile::TempDir, name: &str) -> PathBuf {
        base.path().join(name)
    }

    #[tokio::test]
    async fn test_missing_path_is_cloned() {
        let base = tempfile::tempdir().unwrap();
        let dir = workdir(&base, "nested/demo");
        let git = ScriptedGit::new(None);

        synchronize(&git, &dir, "https://github.com/acme/widget.git", "main")
            .await
            .unwrap();

        assert_eq!(
            git.calls(),
            vec![format!(
                "clone https://github.com/acme/widget.git main {}",
                dir.display()
            )]
        );
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_existing_copy_is_fetched_and_reset() {
        let base = tempfile::tempdir().unwrap();
        let dir = workdir(&base, "demo");
        std::fs::create_dir_all(&dir).unwrap();
        let git = ScriptedGit::new(Some("https://github.com/acme/widget.git"));

        synchronize(&git, &dir, "https://github.com/acme/widget.git", "main")
            .await
            .unwrap();

        assert_eq!(git.calls(), vec!["remote_url", "fetch", "reset origin/main"]);
    }

    #[tokio::test]
    async fn test_mismatched_remote_is_a_conflict() {
        let base = tempfile::tempdir().unwrap();
        let dir = workdir(&base, "demo");
        std::fs::create_dir_all(&dir).unwrap();
        let git = ScriptedGit::new(Some("https://github.com/other/repo.git"));

        let err = synchronize(&git, &dir, "https://github.com/acme/widget.git", "main")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        // Verification only; the working copy was not touched
        assert_eq!(git.calls(), vec!["remote_url"]);
    }

    #[tokio::test]
    async fn test_regular_file_at_workdir_path_is_a_conflict() {
        let base = tempfile::tempdir().unwrap();
        let path = workdir(&base, "demo");
        std::fs::write(&path, "in the way").unwrap();
        let git = ScriptedGit::new(None);

        let err = synchronize(&git, &path, "https://github.com/acme/widget.git", "main")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        // Detected before any git invocation
        assert!(git.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_checkout_directory_is_a_conflict() {
        let base = tempfile::tempdir().unwrap();
        let dir = workdir(&base, "demo");
        std::fs::create_dir_all(&dir).unwrap();
        let git = ScriptedGit::new(None);

        let err = synchronize(&git, &dir, "https://github.com/acme/widget.git", "main")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(git.calls(), vec!["remote_url"]);
    }
}
