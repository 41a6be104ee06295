//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "toast.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Toast Extractor configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set TOAST_CLIENT_ID and TOAST_CLIENT_SECRET");
                println!("  3. List your restaurant GUIDs or management groups");
                println!("  4. Validate configuration: toast-extractor validate-config");
                println!("  5. Run export: toast-extractor export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Toast Extractor Configuration File
# Toast POS to CSV extraction tool

endpoints = ["configuration", "orders"]

[application]
log_level = "info"

[credentials]
base_url = "https://ws-api.toasttab.com"
client_id = "${TOAST_CLIENT_ID}"
client_secret = "${TOAST_CLIENT_SECRET}"
timeout_seconds = 60

[restaurants]
select_type = "explicit"
restaurant_ids = ["00000000-0000-0000-0000-000000000000"]

[sync]
mode = "resume"
start_date = "yesterday"
end_date = "now"
page_size = 100
batch_size = 1000

[destination]
load_type = "incremental_load"
output_dir = "out/tables"
include_restaurant_column = true

[state]
path = "state.json"

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Toast Extractor Configuration File
# Toast POS to CSV extraction tool
#
# This file contains all configuration options with examples and explanations.
# Values of the form ${VAR} are replaced with environment variables, and any
# key can be overridden with TOAST_<SECTION>_<KEY> (e.g. TOAST_SYNC_MODE).

# ============================================================================
# Endpoints
# ============================================================================
# Categories to extract, in order: configuration | orders
endpoints = ["configuration", "orders"]

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Toast API Credentials
# ============================================================================
[credentials]
# Base URL of the Toast API
base_url = "https://ws-api.toasttab.com"

# Machine client credentials (use environment variables)
client_id = "${TOAST_CLIENT_ID}"
client_secret = "${TOAST_CLIENT_SECRET}"

# HTTP request timeout
timeout_seconds = 60

# Retry policy for connection failures and timeouts.
# Non-success responses are never retried.
[credentials.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Restaurant Selection
# ============================================================================
[restaurants]
# explicit: extract restaurant_ids
# management_groups: every restaurant of management_group_ids
select_type = "explicit"
restaurant_ids = ["00000000-0000-0000-0000-000000000000"]
management_group_ids = []

# ============================================================================
# Extraction Window
# ============================================================================
[sync]
# explicit: use start_date and end_date
# resume: from the last successful run up to now
mode = "resume"

# Accepted forms: RFC 3339, YYYY-MM-DD, now, today, yesterday, "3 days ago"
start_date = "yesterday"
end_date = "now"

# Records per request (1-100) and records per flattened batch (>= page_size)
page_size = 100
batch_size = 1000

# ============================================================================
# Rate Limits
# ============================================================================
[rate_limit]
short_window_calls = 20
short_window_seconds = 1
long_window_calls = 10000
long_window_seconds = 900

# ============================================================================
# Output Tables
# ============================================================================
[destination]
# full_load | incremental_load (recorded in each table manifest)
load_type = "incremental_load"
output_dir = "out/tables"

# Prepend the restaurant GUID to every row
include_restaurant_column = true
restaurant_column = "restaurant_guid"

# ============================================================================
# Run State
# ============================================================================
[state]
# JSON file holding the watermark
path = "state.json"

# ============================================================================
# Table Mapping
# ============================================================================
[mapping]
# Optional JSON mapping document; the built-in mapping is used when unset
# path = "mappings/toast_mapping.json"

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = true
local_path = "logs"

# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
