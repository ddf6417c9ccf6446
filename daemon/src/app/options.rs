//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::deploy::reconciler::ReconcilerOptions;
use crate::deploy::routing::RoutingOptions;

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Registry backing store; `None` means no store was configured, which
    /// is a startup error rather than an empty registry
    pub registry_file: Option<PathBuf>,

    /// Pipeline path and clone-URL conventions
    pub reconciler: ReconcilerOptions,

    /// Routing configurator options
    pub routing: RoutingOptions,

    /// Shared secret for webhook signature verification; `None` disables it
    pub webhook_secret: Option<SecretString>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            registry_file: None,
            reconciler: ReconcilerOptions::default(),
            routing: RoutingOptions::default(),
            webhook_secret: None,
        }
    }
}

/// Lifecycle options for the daemon
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
        }
    }
}
