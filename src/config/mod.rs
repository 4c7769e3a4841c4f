//! Configuration module
//!
//! Layers settings from defaults, a settings file, the environment and the
//! command line.

mod env;

pub use env::EnvConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::k8s::ConnectionSource;
use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Kubeconfig path; `~/.kube/config` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context; the current context when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Namespace; the context's namespace when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Per-request deadline in seconds
    pub timeout_secs: u64,

    /// Output format for resource states
    pub output: OutputFormat,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            namespace: None,
            timeout_secs: 30,
            output: OutputFormat::Summary,
            log_level: LogLevel::Info,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        anyhow::ensure!(config.timeout_secs > 0, "timeout_secs must be at least 1");

        Ok(config)
    }

    /// Override settings with values present in the environment
    pub fn merge_env(&mut self, env: &EnvConfig) {
        if let Some(kubeconfig) = &env.kubeconfig {
            self.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(context) = &env.context {
            self.context = Some(context.clone());
        }
        if let Some(namespace) = &env.namespace {
            self.namespace = Some(namespace.clone());
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(output) = env.output {
            self.output = output;
        }
        if let Some(level) = env.log_level {
            self.log_level = level;
        }
        if env.verbose == Some(true) {
            self.log_level = LogLevel::Debug;
        }
    }

    /// Per-request deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connection settings for the cluster
    pub fn connection_source(&self) -> ConnectionSource {
        ConnectionSource {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.output, OutputFormat::Summary);
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_load_yaml() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "namespace: staging\ntimeout_secs: 5\noutput: json-pretty").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.namespace.as_deref(), Some("staging"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.output, OutputFormat::JsonPretty);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_load_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"context": "kind-dev", "log_level": "debug"}}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.context.as_deref(), Some("kind-dev"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_zero_timeout() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "timeout_secs: 0").unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_merge_env() {
        let mut config = AppConfig {
            namespace: Some("from-file".to_string()),
            ..Default::default()
        };
        let env = EnvConfig {
            namespace: Some("from-env".to_string()),
            timeout: Some(10),
            verbose: Some(true),
            kubeconfig: Some(PathBuf::from("/etc/kube/config")),
            ..Default::default()
        };

        config.merge_env(&env);
        assert_eq!(config.namespace.as_deref(), Some("from-env"));
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.log_level, LogLevel::Debug);

        let source = config.connection_source();
        assert_eq!(source.kubeconfig, Some(PathBuf::from("/etc/kube/config")));
        assert_eq!(source.namespace.as_deref(), Some("from-env"));
    }
}
