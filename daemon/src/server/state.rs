//! Server state

use std::sync::Arc;

use secrecy::SecretString;

use crate::deploy::reconciler::Reconciler;
use crate::registry::store::RegistryStore;

/// Server state shared across handlers
pub struct ServerState {
    pub registry: Arc<RegistryStore>,
    pub reconciler: Arc<Reconciler>,
    pub webhook_secret: Option<SecretString>,
}

impl ServerState {
    pub fn new(
        registry: Arc<RegistryStore>,
        reconciler: Arc<Reconciler>,
        webhook_secret: Option<SecretString>,
    ) -> Self {
        Self {
            registry,
            reconciler,
            webhook_secret,
        }
    }
}
