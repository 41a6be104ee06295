//! Export command implementation
//!
//! This module implements the `export` command for extracting Toast orders
//! and restaurant configuration into CSV tables.

use crate::config::{load_config, LoadType, RestaurantSelection, SyncMode};
use crate::core::export::{ExportCoordinator, ExportSummary};
use crate::domain::ExtractorError;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override restaurant GUID(s) to extract (comma-separated)
    #[arg(long)]
    pub restaurant_id: Option<String>,

    /// Override sync mode (explicit or resume)
    #[arg(long)]
    pub mode: Option<String>,

    /// Override load type (full_load or incremental_load)
    #[arg(long)]
    pub load_type: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        // Apply CLI overrides
        if let Some(mode) = &self.mode {
            tracing::info!(mode = %mode, "Overriding sync mode from CLI");
            match mode.parse::<SyncMode>() {
                Ok(m) => config.sync.mode = m,
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(2);
                }
            }
        }

        if let Some(load_type) = &self.load_type {
            tracing::info!(load_type = %load_type, "Overriding load type from CLI");
            match load_type.parse::<LoadType>() {
                Ok(l) => config.destination.load_type = l,
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(2);
                }
            }
        }

        if let Some(restaurant_ids) = &self.restaurant_id {
            let ids: Vec<String> = restaurant_ids
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::info!(restaurant_ids = ?ids, "Overriding restaurant IDs from CLI");
            config.restaurants.select_type = RestaurantSelection::Explicit;
            config.restaurants.restaurant_ids = ids;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        // Confirmation prompt (unless --yes)
        if !self.yes {
            println!("Export Configuration:");
            println!("  Endpoints: {:?}", config.endpoints);
            println!("  Sync mode: {}", config.sync.mode);
            match config.restaurants.select_type {
                RestaurantSelection::Explicit => {
                    println!("  Restaurants: {:?}", config.restaurants.restaurant_ids)
                }
                RestaurantSelection::ManagementGroups => println!(
                    "  Management groups: {:?}",
                    config.restaurants.management_group_ids
                ),
            }
            println!("  Load type: {}", config.destination.load_type);
            println!("  Output: {}", config.destination.output_dir);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        tracing::info!("Creating export coordinator");
        let coordinator = match ExportCoordinator::new(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(exit_code(&e));
            }
        };

        tracing::info!("Executing export");
        println!("🚀 Starting export...");
        println!();

        match coordinator.execute_export().await {
            Ok(summary) => {
                print_summary(&summary);
                println!("✅ Export completed successfully!");
                Ok(0)
            }
            Err(ExtractorError::Interrupted(reason)) => {
                tracing::info!(reason = %reason, "Export interrupted by user signal");
                println!();
                println!("⚠️  Export interrupted. Partial output discarded, watermark unchanged.");
                println!("   Run the same command again to retry the window.");
                println!();
                Ok(130)
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                println!("   Partial output discarded, watermark unchanged.");
                Ok(exit_code(&e))
            }
        }
    }
}

/// Process exit code for an error that ended the export
pub fn exit_code(error: &ExtractorError) -> i32 {
    if error.is_authentication() {
        3
    } else if error.is_remote_request() {
        4
    } else {
        match error {
            ExtractorError::Interrupted(_) => 130,
            ExtractorError::Api(_) => 4,
            ExtractorError::Configuration(_)
            | ExtractorError::MappingResolution(_)
            | ExtractorError::Validation(_) => 2,
            _ => 5,
        }
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Window: {}", summary.window);
    println!("  Restaurants: {}", summary.restaurants_processed);
    println!("  Batches: {}", summary.batches);
    println!("  Records Fetched: {}", summary.records_fetched);
    println!("  Rows Written: {}", summary.total_rows());
    for (table, rows) in &summary.rows_written {
        println!("    - {table}: {rows}");
    }
    println!("  Tables Published: {}", summary.tables.len());
    if summary.calls_throttled > 0 {
        println!(
            "  Rate Limited: {} call(s), {:.2}s waiting",
            summary.calls_throttled,
            summary.rate_limit_wait.as_secs_f64()
        );
    }
    if let Some(watermark) = summary.watermark {
        println!("  Watermark: {}", watermark.to_rfc3339());
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();
}
