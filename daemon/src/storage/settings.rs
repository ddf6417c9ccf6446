//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for daily-rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// HTTP server configuration (webhook + admin API)
    #[serde(default)]
    pub server: ServerSettings,

    /// Path to the deployment registry document. Deployments cannot be
    /// looked up without it; leaving it unset is a configuration error
    /// surfaced at startup.
    #[serde(default)]
    pub registry_file: Option<PathBuf>,

    /// Directory holding one working copy per deployment
    #[serde(default = "default_apps_dir")]
    pub apps_dir: PathBuf,

    /// Base URL for building clone URLs from "org/repo" names
    #[serde(default = "default_clone_base")]
    pub clone_base: String,

    /// Reverse proxy configuration
    #[serde(default)]
    pub nginx: NginxSettings,

    /// Shared secret for webhook signature verification; unsigned payloads
    /// are accepted when unset
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

fn default_apps_dir() -> PathBuf {
    PathBuf::from("/opt/apps")
}

fn default_clone_base() -> String {
    "https://github.com".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: None,
            json_logs: false,
            server: ServerSettings::default(),
            registry_file: None,
            apps_dir: default_apps_dir(),
            clone_base: default_clone_base(),
            nginx: NginxSettings::default(),
            webhook_secret: None,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Reverse proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxSettings {
    /// Combined configuration file written on every regeneration
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,

    /// Directory of enabled sites; the combined file is symlinked here
    #[serde(default = "default_enabled_dir")]
    pub enabled_dir: PathBuf,

    /// Public path prefix routed to the daemon itself (admin API + webhook)
    #[serde(default = "default_management_path")]
    pub management_path: String,
}

fn default_config_file() -> PathBuf {
    PathBuf::from("/etc/nginx/sites-available/slipway.conf")
}

fn default_enabled_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/sites-enabled")
}

fn default_management_path() -> String {
    "/deploy".to_string()
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            enabled_dir: default_enabled_dir(),
            management_path: default_management_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_document() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.log_level, LogLevel::Info);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9000);
        assert!(settings.registry_file.is_none());
        assert_eq!(settings.apps_dir, PathBuf::from("/opt/apps"));
        assert_eq!(settings.clone_base, "https://github.com");
        assert_eq!(settings.nginx.management_path, "/deploy");
        assert!(settings.webhook_secret.is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let mut settings = Settings::default();
        settings.registry_file = Some(PathBuf::from("/etc/slipway/deployments.json"));
        settings.webhook_secret = Some("s3cret".to_string());

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.registry_file, settings.registry_file);
        assert_eq!(back.webhook_secret, settings.webhook_secret);
    }
}
