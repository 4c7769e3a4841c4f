//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Environment variable prefix
const ENV_PREFIX: &str = "POD_CLIENT";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Namespace from POD_CLIENT_NAMESPACE
    pub namespace: Option<String>,
    /// Kubeconfig context from POD_CLIENT_CONTEXT
    pub context: Option<String>,
    /// Timeout from POD_CLIENT_TIMEOUT
    pub timeout: Option<u64>,
    /// Output format from POD_CLIENT_OUTPUT
    pub output: Option<OutputFormat>,
    /// Log level from POD_CLIENT_LOG_LEVEL
    pub log_level: Option<LogLevel>,
    /// Verbose from POD_CLIENT_VERBOSE
    pub verbose: Option<bool>,
    /// Settings file from POD_CLIENT_CONFIG
    pub config_file: Option<PathBuf>,
    /// First entry of KUBECONFIG
    pub kubeconfig: Option<PathBuf>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(format!("{ENV_PREFIX}_{name}").as_str());

        Self {
            namespace: get("NAMESPACE"),
            context: get("CONTEXT"),
            timeout: get("TIMEOUT")
                .and_then(|v| v.parse().ok())
                .filter(|t| *t > 0),
            output: get("OUTPUT").and_then(|v| v.parse().ok()),
            log_level: get("LOG_LEVEL").and_then(|v| v.parse().ok()),
            verbose: get("VERBOSE").map(|v| parse_bool(&v)),
            config_file: get("CONFIG").map(PathBuf::from),
            kubeconfig: lookup("KUBECONFIG")
                .and_then(|v| env::split_paths(&v).find(|p| !p.as_os_str().is_empty())),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
