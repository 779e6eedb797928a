mod logging;

use std::process::ExitCode;

use async_std::{channel, task};
use clap::{Parser, Subcommand};
use core_types::{BootcampId, events::DeletionEvent};
use service::{
    app_services::create_app_services,
    error::Error,
    settings::{
        CAPABILITY_SERVICE_TOKEN, CAPABILITY_SERVICE_URL, MAX_CONCURRENT_CAPABILITIES, Settings,
    },
};

#[derive(Parser, Debug)]
#[command(name = "bootcamp-admin", about = "Bootcamp administration")]
struct Cli {
    /// Capability service base URL
    #[arg(long, env = "CAPABILITY_SERVICE_URL", global = true)]
    capability_service_url: Option<String>,

    /// Bearer token for the capability service
    #[arg(long, env = "CAPABILITY_SERVICE_TOKEN", hide_env_values = true, global = true)]
    capability_service_token: Option<String>,

    /// Number of capabilities cleaned up concurrently
    #[arg(long, env = "MAX_CONCURRENT_CAPABILITIES", global = true)]
    max_concurrent_capabilities: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete a bootcamp and the capabilities and technologies only it uses
    Delete {
        bootcamp_id: BootcampId,

        /// Correlation id for logs and capability service requests
        #[arg(long)]
        trace_id: Option<String>,

        /// Exit with an error when any capability could not be cleaned up
        #[arg(long)]
        strict: bool,
    },
    /// Print bootcamp metrics as JSON
    Metrics {
        bootcamp_id: BootcampId,

        #[arg(long)]
        trace_id: Option<String>,
    },
}

fn main() -> ExitCode {
    // clap reads the `env` fallbacks of its arguments while parsing
    dotenvy::dotenv().ok();
    let _guard = logging::init_logging();
    let args = Cli::parse();

    match task::block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), Error> {
    let settings = Settings::from_env(|key| flag_value(&args, key))?;
    tracing::debug!(?settings, "Settings loaded");

    let app_services = create_app_services(settings).await?;

    match args.command {
        Command::Delete {
            bootcamp_id,
            trace_id,
            strict,
        } => {
            let trace_id = trace_id.unwrap_or_else(new_trace_id);
            let (progress_tx, progress_rx) = channel::unbounded::<DeletionEvent>();
            let printer = task::spawn(async move {
                while let Ok(event) = progress_rx.recv().await {
                    println!("{}", describe(&event));
                }
            });

            let result = app_services
                .bootcamp_deletion()
                .delete_bootcamp_with_progress(bootcamp_id, &trace_id, Some(progress_tx), None)
                .await;
            // the sender is dropped with the deletion future, which ends the printer
            printer.await;
            let report = result?;

            println!(
                "Bootcamp {} deleted (trace id {}): {} capabilities deleted, {} shared, {} failed",
                report.bootcamp_id,
                report.trace_id,
                report.deleted_capabilities().len(),
                report.shared_capabilities().len(),
                report.failed_capabilities().len()
            );
            if strict {
                report.ensure_fully_cleaned()?;
            }
            Ok(())
        }
        Command::Metrics {
            bootcamp_id,
            trace_id,
        } => {
            let trace_id = trace_id.unwrap_or_else(new_trace_id);
            let metrics = app_services
                .bootcamp_metrics()
                .collect(bootcamp_id, &trace_id)
                .await?;
            let json = serde_json::to_string_pretty(&metrics)
                .map_err(|e| Error::DbError(format!("Failed to serialize metrics: {}", e)))?;
            println!("{}", json);
            Ok(())
        }
    }
}

/// Setting given on the command line (or through clap's env fallback) for `key`
fn flag_value(args: &Cli, key: &str) -> Option<String> {
    match key {
        CAPABILITY_SERVICE_URL => args.capability_service_url.clone(),
        CAPABILITY_SERVICE_TOKEN => args.capability_service_token.clone(),
        MAX_CONCURRENT_CAPABILITIES => args.max_concurrent_capabilities.map(|max| max.to_string()),
        _ => None,
    }
}

fn new_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn describe(event: &DeletionEvent) -> String {
    match event {
        DeletionEvent::DeletionStarted { bootcamp_id } => {
            format!("Deleting bootcamp {}", bootcamp_id)
        }
        DeletionEvent::CapabilitiesEnumerated {
            capability_count, ..
        } => format!("Found {} capabilities", capability_count),
        DeletionEvent::CapabilitySkippedShared { capability_id } => {
            format!("Capability {} is shared, kept", capability_id)
        }
        DeletionEvent::TechnologyDeleted {
            capability_id,
            technology_id,
        } => format!(
            "Technology {} of capability {} deleted",
            technology_id, capability_id
        ),
        DeletionEvent::TechnologyKept {
            technology_id,
            usage_count,
            ..
        } => format!(
            "Technology {} is used by {} capabilities, kept",
            technology_id, usage_count
        ),
        DeletionEvent::CapabilityDeleted { capability_id } => {
            format!("Capability {} deleted", capability_id)
        }
        DeletionEvent::CapabilityCleanupFailed {
            capability_id,
            error,
        } => format!("Capability {} cleanup failed: {}", capability_id, error),
        DeletionEvent::BootcampDeleted {
            bootcamp_id,
            already_deleted: true,
        } => format!("Bootcamp {} was already deleted", bootcamp_id),
        DeletionEvent::BootcampDeleted { bootcamp_id, .. } => {
            format!("Bootcamp {} deleted", bootcamp_id)
        }
        DeletionEvent::DeletionFailed { bootcamp_id, error } => {
            format!("Deletion of bootcamp {} failed: {}", bootcamp_id, error)
        }
    }
}
