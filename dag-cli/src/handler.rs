//! Command Handlers
//!
//! Handler functions for CLI commands.

use std::sync::Arc;
use tracing::info;

use dag_core::normalize_store_address;
use dag_verifier::{
    deliver, NotificationDispatcher, ProjectConfig, RetryPolicy, VerificationMonitor,
    VerificationRunner, VerifierConfig,
};

use crate::commands::{Cli, Commands, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> CliResult<()> {
    match &cli.command {
        Commands::NormalizeAddress { address } => handle_normalize_address(address, cli.format),
        Commands::Config => {
            let config = load_config(&cli)?;
            output::print_config(&config, cli.format);
            if let Err(e) = config.validate() {
                output::print_info(&format!("Warning: {}", e));
            }
            Ok(())
        }
        Commands::Run { no_notify } => handle_run(load_config(&cli)?, *no_notify, cli.format).await,
        Commands::Watch {
            interval,
            no_notify,
        } => {
            let mut config = load_config(&cli)?;
            if let Some(interval) = interval {
                config.interval_secs = *interval;
            }
            handle_watch(config, *no_notify, cli.format).await
        }
    }
}

/// Configuration file or environment, then flag overrides
pub fn load_config(cli: &Cli) -> CliResult<VerifierConfig> {
    let config = match &cli.config {
        Some(path) => VerifierConfig::from_file(path)?,
        None => VerifierConfig::from_env(),
    };
    Ok(apply_overrides(config, cli))
}

/// Apply command line flags on top of loaded configuration
pub fn apply_overrides(mut config: VerifierConfig, cli: &Cli) -> VerifierConfig {
    if let Some(url) = &cli.store_url {
        config.store.url = url.clone();
    }
    if let Some(url) = &cli.webhook_url {
        config.webhook.url = Some(url.clone());
    }
    if let Some(projects) = &cli.projects {
        config.projects = ProjectConfig::parse_list(projects);
    }
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    config
}

fn require_projects(config: &VerifierConfig) -> CliResult<Vec<String>> {
    let projects = config.project_ids();
    if projects.is_empty() {
        return Err(CliError::config(
            "no projects configured (set DAG_VERIFIER_PROJECTS or --projects)",
        ));
    }
    Ok(projects)
}

/// Handle a single verification pass
async fn handle_run(config: VerifierConfig, no_notify: bool, format: OutputFormat) -> CliResult<()> {
    let projects = require_projects(&config)?;
    let runner = VerificationRunner::from_config(&config)?;

    let report = runner.run(&projects).await;
    output::print_run_report(&report, format);

    if no_notify {
        return Ok(());
    }

    match NotificationDispatcher::from_config(&config.webhook)? {
        Some(dispatcher) => {
            let policy = RetryPolicy::from_config(&config.webhook);
            let delivery = deliver(&dispatcher, &report.summary, &policy).await?;
            output::print_delivery(&delivery, format);
        }
        None => output::print_info("No webhook configured, summary not posted"),
    }
    Ok(())
}

/// Handle periodic verification until Ctrl-C
async fn handle_watch(config: VerifierConfig, no_notify: bool, format: OutputFormat) -> CliResult<()> {
    let projects = require_projects(&config)?;
    let runner = VerificationRunner::from_config(&config)?;

    let mut monitor = VerificationMonitor::new(runner, projects, config.interval());
    if !no_notify {
        if let Some(dispatcher) = NotificationDispatcher::from_config(&config.webhook)? {
            monitor = monitor.with_notifier(
                Arc::new(dispatcher),
                RetryPolicy::from_config(&config.webhook),
            );
        }
    }

    let handle = monitor.start();
    info!(interval_secs = config.interval_secs, "Watching, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    let last_pass = handle.last_pass().await;
    handle.stop().await;

    if let Some(pass) = last_pass {
        output::print_run_report(&pass.report, format);
    }
    Ok(())
}

/// Handle address normalization
fn handle_normalize_address(address: &str, format: OutputFormat) -> CliResult<()> {
    let url = normalize_store_address(address)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "address": address,
                "url": url,
            }))?
        ),
        OutputFormat::Table | OutputFormat::Plain => println!("{}", url),
    }
    Ok(())
}
