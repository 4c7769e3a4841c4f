//! Cluster connection
//!
//! Resolves kubeconfig settings into a ready-to-use [`ConnectionHandle`].
//! Connecting only reads local files; the API server is first contacted by
//! the resource operations.

use kube::api::{Api, ApiResource, DynamicObject};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Kubeconfig location relative to the home directory
const DEFAULT_KUBECONFIG: &str = ".kube/config";

/// Connection configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Kubeconfig not found at {}: {reason}", path.display())]
    NotFound { path: PathBuf, reason: String },

    #[error("Invalid kubeconfig {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
    fn not_found(path: &Path, reason: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    fn invalid(path: &Path, reason: impl ToString) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Where to find connection settings
#[derive(Clone, Debug, Default)]
pub struct ConnectionSource {
    /// Explicit kubeconfig path; `~/.kube/config` when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context; the current context when unset
    pub context: Option<String>,
    /// Namespace override; the context's namespace when unset
    pub namespace: Option<String>,
}

impl ConnectionSource {
    /// Resolve the kubeconfig file to read
    pub fn kubeconfig_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.kubeconfig {
            return Ok(path.clone());
        }

        dirs::home_dir()
            .map(|home| home.join(DEFAULT_KUBECONFIG))
            .ok_or_else(|| {
                ConfigError::not_found(
                    &Path::new("~").join(DEFAULT_KUBECONFIG),
                    "home directory could not be determined",
                )
            })
    }
}

/// Authenticated, addressable cluster endpoint.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Clone)]
pub struct ConnectionHandle {
    client: Client,
    namespace: String,
}

impl ConnectionHandle {
    /// Wrap an existing client
    pub fn from_client(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Default namespace for operations
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespaced API for an arbitrary kind
    pub fn dynamic_api(&self, namespace: &str, resource: &ApiResource) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, resource)
    }
}

/// Build a connection handle from local kubeconfig settings
pub async fn connect(source: &ConnectionSource) -> Result<ConnectionHandle, ConfigError> {
    let path = source.kubeconfig_path()?;
    debug!("Loading kubeconfig from {}", path.display());

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::not_found(&path, e))?;
    let kubeconfig = Kubeconfig::from_yaml(&content).map_err(|e| ConfigError::invalid(&path, e))?;

    let options = KubeConfigOptions {
        context: source.context.clone(),
        ..Default::default()
    };
    let config = Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| ConfigError::invalid(&path, e))?;

    let namespace = source
        .namespace
        .clone()
        .unwrap_or_else(|| config.default_namespace.clone());

    debug!(
        "Using cluster {} (namespace {})",
        config.cluster_url, namespace
    );

    let client = Client::try_from(config).map_err(|e| ConfigError::invalid(&path, e))?;

    Ok(ConnectionHandle::from_client(client, namespace))
}
