//! Image builder

use std::path::Path;

use tracing::info;

use crate::deploy::docker::ContainerRuntime;
use crate::errors::{Error, Result};

/// Deterministic image tag for a (repository, branch) pair, e.g.
/// `acme/widget` @ `main` becomes `acme_widget:main`. Rebuilding the same
/// pair overwrites the same tag.
pub fn image_tag(repository: &str, branch: &str) -> String {
    format!("{}:{}", repository.replace('/', "_"), branch)
}

/// Build `image` from the working copy at `workdir`. The Dockerfile path is
/// relative to the working copy; both must exist before the runtime is
/// invoked so a missing checkout fails here rather than inside the tool.
pub async fn build(
    runtime: &dyn ContainerRuntime,
    image: &str,
    workdir: &Path,
    dockerfile_path: &str,
) -> Result<()> {
    let dockerfile = workdir.join(dockerfile_path);

    match tokio::fs::metadata(&dockerfile).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            return Err(Error::Build(format!(
                "dockerfile not found: {}",
                dockerfile.display()
            )))
        }
    }
    match tokio::fs::metadata(workdir).await {
        Ok(meta) if meta.is_dir() => {}
        _ => {
            return Err(Error::Build(format!(
                "build context is not a directory: {}",
                workdir.display()
            )))
        }
    }

    runtime.build(image, workdir, &dockerfile).await?;
    info!("Built image {}", image);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tag_replaces_slashes() {
        assert_eq!(image_tag("acme/widget", "main"), "acme_widget:main");
        assert_eq!(image_tag("a/b/c", "dev"), "a_b_c:dev");
    }

    #[test]
    fn test_image_tag_is_deterministic() {
        assert_eq!(
            image_tag("acme/widget", "main"),
            image_tag("acme/widget", "main")
        );
    }
}
