//! Deployment descriptor model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One managed deployment: a (repository, branch) pair bound to a container
/// and a public route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique identifier; also the container name and the working-copy
    /// directory name
    pub name: String,

    /// Source repository full name, e.g. "org/repo"
    pub repository: String,

    /// Branch that triggers this deployment
    pub branch: String,

    /// Host port bound to the container's internal port 80
    pub port: u16,

    /// Externally visible URL path prefix
    pub route: String,

    /// Proxy virtual-host name
    pub server: String,

    /// Build file path, relative to the working copy
    #[serde(default = "default_dockerfile_path")]
    pub dockerfile_path: String,

    /// Environment variables injected at container start. Ordered map so
    /// serialization and argument order stay deterministic.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

fn default_dockerfile_path() -> String {
    "Dockerfile".to_string()
}

/// The registry document, persisted as a whole
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dockerfile_path_defaults() {
        let json = r#"{
            "name": "demo",
            "repository": "acme/widget",
            "branch": "main",
            "port": 8080,
            "route": "/demo",
            "server": "example.com"
        }"#;
        let deployment: Deployment = serde_json::from_str(json).unwrap();
        assert_eq!(deployment.dockerfile_path, "Dockerfile");
        assert!(deployment.variables.is_empty());
    }

    #[test]
    fn test_empty_document_parses() {
        let doc: RegistryDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.deployments.is_empty());
    }

    #[test]
    fn test_variables_serialize_in_key_order() {
        let json = r#"{
            "name": "demo",
            "repository": "acme/widget",
            "branch": "main",
            "port": 8080,
            "route": "/demo",
            "server": "example.com",
            "variables": {"ZED": "1", "ALPHA": "2"}
        }"#;
        let deployment: Deployment = serde_json::from_str(json).unwrap();
        let out = serde_json::to_string(&deployment).unwrap();
        assert!(out.find("ALPHA").unwrap() < out.find("ZED").unwrap());
    }
}
