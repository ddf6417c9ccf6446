//! Push event models

use serde::{Deserialize, Serialize};

/// Repository block of a push event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRepository {
    /// Owner-qualified name, e.g. "acme/widget"
    pub full_name: String,
}

/// A push event delivered to the hook endpoint
///
/// Only the fields the daemon acts on are modeled; forges attach dozens of
/// others and we let serde drop them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Repository the push happened in
    pub repository: PushRepository,

    /// Full git ref that was pushed, e.g. "refs/heads/main"
    #[serde(rename = "ref")]
    pub git_ref: String,
}

impl PushEvent {
    /// Branch name: the segment after the last '/' of the ref
    pub fn branch(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or(&self.git_ref)
    }
}
