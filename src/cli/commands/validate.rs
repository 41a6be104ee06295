//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the extractor configuration file.

use crate::config::{load_config, RestaurantSelection};
use crate::core::mapping::MappingCatalog;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let mapping_source = config.mapping.path.as_deref().map(Path::new);
        let mappings = match MappingCatalog::load(mapping_source)
            .and_then(|catalog| catalog.build_all(&config.endpoints))
        {
            Ok(m) => m,
            Err(e) => {
                println!("❌ Table mapping is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Toast API: {}", config.credentials.base_url);
        println!("  Client ID: {}", config.credentials.client_id);
        println!("  Endpoints: {:?}", config.endpoints);
        match config.restaurants.select_type {
            RestaurantSelection::Explicit => println!(
                "  Restaurants: {:?}",
                config.restaurants.restaurant_ids
            ),
            RestaurantSelection::ManagementGroups => println!(
                "  Management Groups: {:?}",
                config.restaurants.management_group_ids
            ),
        }
        println!("  Sync Mode: {}", config.sync.mode);
        if config.sync.mode == crate::config::SyncMode::Explicit {
            println!(
                "  Window: {} .. {}",
                config.sync.start_date, config.sync.end_date
            );
        }
        println!("  Page Size: {}", config.sync.page_size);
        println!("  Batch Size: {}", config.sync.batch_size);
        println!(
            "  Rate Limit: {} calls/{}s, {} calls/{}s",
            config.rate_limit.short_window_calls,
            config.rate_limit.short_window_seconds,
            config.rate_limit.long_window_calls,
            config.rate_limit.long_window_seconds
        );
        println!("  Load Type: {}", config.destination.load_type);
        println!("  Output Directory: {}", config.destination.output_dir);
        println!("  State File: {}", config.state.path);
        println!(
            "  Mapping: {}",
            config.mapping.path.as_deref().unwrap_or("built-in")
        );
        for (category, mapping) in &mappings {
            println!("    - {category}: root table '{}'", mapping.table_name());
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_reports_configuration_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("toast.toml");
        std::fs::write(
            &path,
            r#"
[credentials]
base_url = "ftp://example.com"
client_id = "id"
client_secret = "secret"

[restaurants]
restaurant_ids = ["r-1"]
"#,
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_validate_accepts_valid_configuration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("toast.toml");
        std::fs::write(
            &path,
            r#"
[credentials]
base_url = "https://ws-api.toasttab.com"
client_id = "id"
client_secret = "secret"

[restaurants]
restaurant_ids = ["r-1"]
"#,
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }
}
