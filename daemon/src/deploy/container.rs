//! Container replacement

use std::collections::BTreeMap;

use tracing::info;

use crate::deploy::docker::ContainerRuntime;
use crate::errors::Result;

/// Replace the container named `name` with a fresh instance of `image`.
///
/// Stop/remove of the previous instance is best-effort so the call is
/// idempotent when no container exists yet. If the new container fails to
/// start after the old one is gone the deployment is offline until the event
/// is replayed; there is no rollback to the previous image.
pub async fn replace(
    runtime: &dyn ContainerRuntime,
    image: &str,
    name: &str,
    port: u16,
    variables: &BTreeMap<String, String>,
) -> Result<()> {
    runtime.stop_and_remove(name).await;
    runtime.run(image, name, port, variables).await?;
    info!("Started container {} from {} on port {}", name, image, port);
    Ok(())
}
