//! Routing configurator
//!
//! The proxy configuration is derived state: every refresh regenerates the
//! single combined file from the full registry, links it into the enabled
//! set, validates, and reloads. Validation failure aborts before reload so
//! the previously loaded configuration stays active.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::deploy::nginx::ProxyController;
use crate::errors::{Error, Result};
use crate::filesys::file::File;
use crate::registry::model::Deployment;

/// Where the generated configuration lives and what its management block
/// points at
#[derive(Debug, Clone)]
pub struct RoutingOptions {
    /// Combined config file, e.g. /etc/nginx/sites-available/slipway.conf
    pub config_file: PathBuf,

    /// Active-configuration directory, e.g. /etc/nginx/sites-enabled
    pub enabled_dir: PathBuf,

    /// Public path prefix of the daemon's own admin and hook endpoints
    pub management_path: String,

    /// Local port the daemon listens on
    pub management_port: u16,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/etc/nginx/sites-available/slipway.conf"),
            enabled_dir: PathBuf::from("/etc/nginx/sites-enabled"),
            management_path: "/deploy".to_string(),
            management_port: 9000,
        }
    }
}

/// Render the combined configuration for the given registry state.
///
/// Deployments are grouped by virtual host in order of first appearance;
/// each host gets the management locations followed by one location per
/// deployment route. Output is deterministic for a given input.
pub fn render_config(deployments: &[Deployment], options: &RoutingOptions) -> String {
    let management = options.management_path.trim_end_matches('/');
    let daemon = format!("http://127.0.0.1:{}", options.management_port);

    let mut servers: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Deployment>> = HashMap::new();
    for d in deployments {
        if !groups.contains_key(d.server.as_str()) {
            servers.push(&d.server);
        }
        groups.entry(&d.server).or_default().push(d);
    }

    let mut blocks = Vec::new();
    for server in servers {
        let mut locations = String::new();
        locations.push_str(&proxied_location(
            &format!("{}/", management),
            &format!("{}/", daemon),
        ));
        locations.push('\n');
        locations.push_str(&hook_location(
            &format!("{}/hook", management),
            &format!("{}/hook", daemon),
        ));

        for d in &groups[server] {
            let route = format!("{}/", d.route.trim_end_matches('/'));
            locations.push('\n');
            locations.push_str(&proxied_location(
                &route,
                &format!("http://127.0.0.1:{}/", d.port),
            ));
        }

        blocks.push(format!(
            "server {{\n    listen 80;\n    server_name {};\n\n{}}}\n",
            server, locations
        ));
    }

    blocks.join("\n")
}

fn proxied_location(path: &str, upstream: &str) -> String {
    format!(
        r#"    location {} {{
        proxy_pass {};
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection "upgrade";
        proxy_set_header Host $host;
    }}
"#,
        path, upstream
    )
}

fn hook_location(path: &str, upstream: &str) -> String {
    format!(
        r#"    location {} {{
        proxy_pass {};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
    }}
"#,
        path, upstream
    )
}

/// Owns the combined config file and the validate-then-reload sequence
pub struct RoutingConfigurator {
    options: RoutingOptions,
    proxy: Arc<dyn ProxyController>,
    lock: Mutex<()>,
}

impl RoutingConfigurator {
    pub fn new(options: RoutingOptions, proxy: Arc<dyn ProxyController>) -> Self {
        Self {
            options,
            proxy,
            lock: Mutex::new(()),
        }
    }

    /// Regenerate the combined file from the given registry state, link it
    /// into the enabled set, validate, and reload
    pub async fn sync(&self, deployments: &[Deployment]) -> Result<()> {
        let _guard = self.lock.lock().await;

        let rendered = render_config(deployments, &self.options);
        File::new(self.options.config_file.clone())
            .write_string(&rendered)
            .await?;
        self.link_into_enabled().await?;

        self.proxy.validate().await?;
        self.proxy.reload().await?;

        info!(
            "Routing refreshed: {} deployment(s), {}",
            deployments.len(),
            self.options.config_file.display()
        );
        Ok(())
    }

    async fn link_into_enabled(&self) -> Result<()> {
        let name = self.options.config_file.file_name().ok_or_else(|| {
            Error::Config(format!(
                "nginx config path has no file name: {}",
                self.options.config_file.display()
            ))
        })?;
        let link = self.options.enabled_dir.join(name);

        // Replace whatever currently occupies the slot (stale symlink or file)
        if tokio::fs::symlink_metadata(&link).await.is_ok() {
            tokio::fs::remove_file(&link).await?;
        }

        #[cfg(unix)]
        {
            tokio::fs::symlink(&self.options.config_file, &link).await?;
        }
        #[cfg(not(unix))]
        {
            tokio::fs::copy(&self.options.config_file, &link).await?;
        }
        Ok(())
    }
}
