//! pod-client - create a Kubernetes resource and read it back
//!
//! Loads a kubeconfig, creates one object (a Pod by default) and fetches it
//! again to confirm the API server stored it.
//!
//! ## Usage
//!
//! ```bash
//! # Create pod-created-by-client (nginx) in the default namespace, then read it
//! pod-client
//!
//! # Same, but accept an object that already exists
//! pod-client run --name web --image nginx:1.25 --ensure
//!
//! # Create an arbitrary namespaced object from a manifest
//! pod-client create -f deployment.yaml -n staging
//!
//! # Read an object
//! pod-client get web --kind Deployment --api-version apps/v1 -o yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{info, warn};

mod cli;
mod config;
mod k8s;
mod models;
mod output;
mod utils;

use cli::{Args, Command, GetArgs, GlobalArgs, ResourceArgs, RunArgs};
use config::{AppConfig, EnvConfig};
use k8s::ResourceOperations;
use models::parse_api_version;
use output::StateFormatter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args.global) {
        Ok(config) => config,
        Err(err) => return ExitCode::from(cli::report(&err, &mut std::io::stderr())),
    };

    utils::init_logger(config.log_level);

    let command = args.command.unwrap_or_else(Command::default_run);

    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(cli::report(&err, &mut std::io::stderr())),
    }
}

/// Layer defaults, settings file, environment and flags
fn load_config(global: &GlobalArgs) -> Result<AppConfig> {
    let env = EnvConfig::load();

    let mut config = match global.config.as_ref().or(env.config_file.as_ref()) {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => AppConfig::default(),
    };

    config.merge_env(&env);
    global.apply(&mut config);

    Ok(config)
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    let formatter = StateFormatter::new(config.output);

    match command {
        Command::Run(run_args) => create_and_get(run_args, &config, &formatter).await,
        Command::Create(resource_args) => create(resource_args, &config, &formatter).await,
        Command::Get(get_args) => get(get_args, &config, &formatter).await,
        Command::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

async fn connect(config: &AppConfig) -> Result<ResourceOperations> {
    let handle = k8s::connect(&config.connection_source())
        .await
        .context("Failed to connect to cluster")?;
    Ok(ResourceOperations::new(handle))
}

async fn create_and_get(
    args: RunArgs,
    config: &AppConfig,
    formatter: &StateFormatter,
) -> Result<()> {
    let ops = connect(config).await?;
    let descriptor = args.resource.descriptor(ops.handle().namespace())?;
    let identity = descriptor.identity();

    if args.ensure {
        let (_, outcome) = ops
            .ensure(&descriptor, config.timeout())
            .await
            .context("Failed to ensure resource")?;
        info!("Ensured {} ({})", identity, outcome);
    } else {
        ops.create(&descriptor, config.timeout())
            .await
            .context("Failed to create resource")?;
    }

    let state = ops
        .get(
            identity.gvk(),
            identity.namespace(),
            identity.name(),
            config.timeout(),
        )
        .await
        .context("Failed to get resource")?;

    if !state.matches(identity) {
        warn!(
            "Read back {} {}/{}, expected {}",
            state.kind(),
            state.namespace(),
            state.name(),
            identity
        );
    }

    println!("{}", formatter.format_state(&state));
    Ok(())
}

async fn create(
    args: ResourceArgs,
    config: &AppConfig,
    formatter: &StateFormatter,
) -> Result<()> {
    let ops = connect(config).await?;
    let descriptor = args.descriptor(ops.handle().namespace())?;

    let state = ops
        .create(&descriptor, config.timeout())
        .await
        .context("Failed to create resource")?;

    println!("{}", formatter.format_state(&state));
    Ok(())
}

async fn get(args: GetArgs, config: &AppConfig, formatter: &StateFormatter) -> Result<()> {
    let ops = connect(config).await?;
    let (group, version) = parse_api_version(&args.api_version);
    let gvk = kube::core::GroupVersionKind::gvk(group, version, &args.kind);

    let state = ops
        .get(&gvk, ops.handle().namespace(), &args.name, config.timeout())
        .await
        .context("Failed to get resource")?;

    println!("{}", formatter.format_state(&state));
    Ok(())
}
