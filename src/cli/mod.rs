//! CLI argument parsing
//!
//! Defines command-line interface using clap.

mod exit;

pub use exit::report;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::models::ResourceDescriptor;
use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Pod name used when none is given
pub const DEFAULT_NAME: &str = "pod-created-by-client";

/// Container image used when none is given
pub const DEFAULT_IMAGE: &str = "nginx";

/// Create a Kubernetes resource and read it back
#[derive(Parser, Debug)]
#[command(name = "pod-client")]
#[command(author = "hephaex@gmail.com")]
#[command(version)]
#[command(about = "Create a Kubernetes resource and read it back")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a resource, then read it back (default)
    Run(RunArgs),

    /// Create a resource
    Create(ResourceArgs),

    /// Read a resource
    Get(GetArgs),

    /// Print the effective configuration
    Config,
}

impl Command {
    /// Command used when none is given on the command line
    pub fn default_run() -> Self {
        Command::Run(RunArgs::parse_from(["run"]))
    }
}

/// Options shared by every command
#[derive(ClapArgs, Debug, Default)]
pub struct GlobalArgs {
    /// Settings file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Kubeconfig path (defaults to ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Namespace
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format (summary, json, json-pretty, yaml)
    #[arg(short, long, global = true)]
    pub output: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Override settings with flags given on the command line
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = Some(namespace.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.verbose {
            config.log_level = LogLevel::Debug;
        }
    }
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub resource: ResourceArgs,

    /// Read back an existing object instead of failing
    #[arg(long)]
    pub ensure: bool,
}

/// Description of the resource to create
#[derive(ClapArgs, Debug)]
pub struct ResourceArgs {
    /// Pod name
    #[arg(long, default_value = DEFAULT_NAME)]
    pub name: String,

    /// Container image
    #[arg(long, default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Container name (derived from the image when omitted)
    #[arg(long)]
    pub container_name: Option<String>,

    /// Label to set, as key=value (repeatable)
    #[arg(short, long = "label", value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// Manifest to create instead of a Pod (YAML or JSON)
    #[arg(short, long, conflicts_with_all = ["image", "container_name"])]
    pub file: Option<PathBuf>,
}

impl ResourceArgs {
    /// Build the descriptor; `namespace` applies when the manifest has none
    pub fn descriptor(&self, namespace: &str) -> Result<ResourceDescriptor> {
        let descriptor = match &self.file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read manifest {}", path.display()))?;
                ResourceDescriptor::from_manifest(&text, namespace)?
            }
            None => match &self.container_name {
                Some(container) => ResourceDescriptor::pod_with_container(
                    namespace,
                    &self.name,
                    container,
                    &self.image,
                ),
                None => ResourceDescriptor::pod(namespace, &self.name, &self.image),
            },
        };

        Ok(descriptor.with_labels(self.labels.iter().cloned().collect()))
    }
}

/// Arguments for get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Resource name
    #[arg(default_value = DEFAULT_NAME)]
    pub name: String,

    /// Resource kind
    #[arg(long, default_value = "Pod")]
    pub kind: String,

    /// API version of the kind (e.g. v1, apps/v1)
    #[arg(long, default_value = "v1")]
    pub api_version: String,
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{s}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let args = Args::parse_from(["pod-client"]);
        assert!(args.command.is_none());

        match Command::default_run() {
            Command::Run(run) => {
                assert_eq!(run.resource.name, DEFAULT_NAME);
                assert_eq!(run.resource.image, DEFAULT_IMAGE);
                assert!(!run.ensure);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "pod-client",
            "run",
            "--name",
            "web",
            "--image",
            "nginx:1.25",
            "--label",
            "app=web",
            "--ensure",
            "-n",
            "staging",
        ]);

        assert_eq!(args.global.namespace.as_deref(), Some("staging"));
        match args.command {
            Some(Command::Run(run)) => {
                assert!(run.ensure);
                assert_eq!(run.resource.name, "web");
                assert_eq!(
                    run.resource.labels,
                    vec![("app".to_string(), "web".to_string())]
                );

                let descriptor = run.resource.descriptor("staging").unwrap();
                assert_eq!(descriptor.identity().namespace(), "staging");
                assert_eq!(descriptor.payload()["spec"]["containers"][0]["image"], "nginx:1.25");
                assert_eq!(descriptor.labels().get("app").map(String::as_str), Some("web"));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_get_args() {
        let args = Args::parse_from([
            "pod-client",
            "get",
            "web",
            "--kind",
            "Deployment",
            "--api-version",
            "apps/v1",
            "-o",
            "json",
        ]);

        assert_eq!(args.global.output, Some(OutputFormat::Json));
        match args.command {
            Some(Command::Get(get)) => {
                assert_eq!(get.name, "web");
                assert_eq!(get.kind, "Deployment");
                assert_eq!(get.api_version, "apps/v1");
            }
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_invalid_label_rejected() {
        assert!(Args::try_parse_from(["pod-client", "create", "--label", "novalue"]).is_err());
        assert!(Args::try_parse_from(["pod-client", "create", "--label", "=x"]).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Args::try_parse_from(["pod-client", "--timeout", "0"]).is_err());
        assert!(Args::try_parse_from(["pod-client", "--timeout", "1"]).is_ok());
    }

    #[test]
    fn test_global_args_apply() {
        let args = Args::parse_from(["pod-client", "--timeout", "5", "--verbose", "config"]);
        let mut config = AppConfig::default();
        args.global.apply(&mut config);

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(matches!(args.command, Some(Command::Config)));
    }
}
