//! Proxy control boundary

use async_trait::async_trait;

use crate::deploy::process::run_command;
use crate::errors::{Error, Result};

/// Capability interface over the reverse proxy's control commands
#[async_trait]
pub trait ProxyController: Send + Sync {
    /// Check the on-disk configuration without activating it
    async fn validate(&self) -> Result<()>;

    /// Activate the on-disk configuration
    async fn reload(&self) -> Result<()>;
}

/// ProxyController backed by `nginx -t` and systemd
pub struct NginxCtl;

#[async_trait]
impl ProxyController for NginxCtl {
    async fn validate(&self) -> Result<()> {
        let output = run_command("nginx", &["-t"], None)
            .await
            .map_err(|e| Error::Proxy(format!("failed to run nginx -t: {}", e)))?;
        if !output.success {
            return Err(Error::Proxy(format!(
                "nginx config validation failed: {}",
                output.detail()
            )));
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let output = run_command("systemctl", &["reload", "nginx"], None)
            .await
            .map_err(|e| Error::Proxy(format!("failed to run systemctl reload: {}", e)))?;
        if !output.success {
            return Err(Error::Proxy(format!(
                "nginx reload failed: {}",
                output.detail()
            )));
        }
        Ok(())
    }
}
