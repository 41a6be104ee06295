//! Status command implementation
//!
//! This module implements the `status` command for displaying the
//! persisted watermark and the window the next run would extract.

use crate::config::{load_config, SyncMode};
use crate::core::export::resolve_window;
use crate::core::state::StateManager;
use chrono::{DateTime, Utc};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        println!("📊 Export Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2);
            }
        };

        let state_manager = StateManager::from_config(&config.state);
        let watermark = match state_manager.load().await {
            Ok(w) => w,
            Err(e) => {
                println!("❌ Failed to load watermark");
                println!("   Error: {}", e);
                return Ok(5);
            }
        };

        println!("State file: {}", state_manager.location());
        if watermark == DateTime::<Utc>::UNIX_EPOCH {
            println!("Last successful run: Never");
        } else {
            println!(
                "Last successful run: {}",
                watermark.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        println!();

        match resolve_window(&config.sync, watermark, Utc::now()) {
            Ok(window) => {
                let label = match config.sync.mode {
                    SyncMode::Resume => "Next resume window",
                    SyncMode::Explicit => "Configured window",
                };
                println!("{label}: {window}");
                if config.sync.mode == SyncMode::Resume && watermark == DateTime::<Utc>::UNIX_EPOCH
                {
                    println!("   No export history found; the next run extracts everything.");
                    println!("   Run 'toast-extractor export' to start extracting data.");
                }
            }
            Err(e) => {
                println!("❌ Cannot determine the next window");
                println!("   Error: {}", e);
                return Ok(5);
            }
        }

        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) -> String {
        let path = dir.path().join("toast.toml");
        let state = dir.path().join("state.json");
        std::fs::write(
            &path,
            format!(
                r#"
[credentials]
base_url = "https://ws-api.toasttab.com"
client_id = "id"
client_secret = "secret"

[restaurants]
restaurant_ids = ["r-1"]

[sync]
mode = "resume"

[state]
path = "{}"
"#,
                state.display().to_string().replace('\\', "/")
            ),
        )
        .unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_status_without_history() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);

        assert_eq!(StatusArgs {}.execute(&path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_status_with_watermark() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let config = load_config(&path).unwrap();
        StateManager::from_config(&config.state)
            .advance(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(StatusArgs {}.execute(&path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_status_missing_config() {
        assert_eq!(
            StatusArgs {}
                .execute("/nonexistent/toast.toml")
                .await
                .unwrap(),
            2
        );
    }
}
