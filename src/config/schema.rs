//! Configuration schema types
//!
//! This module defines the configuration structure of the extractor. Every
//! section validates itself; [`ExtractorConfig::validate`] runs them all.

use super::dates::parse_date_expression;
use crate::config::SecretString;
use crate::domain::Category;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the output tables should be loaded by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadType {
    /// Replace the destination tables
    FullLoad,
    /// Upsert into the destination tables by primary key
    #[default]
    IncrementalLoad,
}

impl LoadType {
    pub fn is_incremental(&self) -> bool {
        matches!(self, LoadType::IncrementalLoad)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::FullLoad => "full_load",
            LoadType::IncrementalLoad => "incremental_load",
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full_load" => Ok(LoadType::FullLoad),
            "incremental_load" => Ok(LoadType::IncrementalLoad),
            other => Err(format!(
                "Invalid load_type '{other}'. Must be one of: full_load, incremental_load"
            )),
        }
    }
}

/// How the extraction window is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Use `start_date` and `end_date` as configured
    #[default]
    Explicit,
    /// From the last successful run up to the start of this run
    Resume,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncMode::Explicit => "explicit",
            SyncMode::Resume => "resume",
        })
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "explicit" => Ok(SyncMode::Explicit),
            "resume" => Ok(SyncMode::Resume),
            other => Err(format!(
                "Invalid sync mode '{other}'. Must be one of: explicit, resume"
            )),
        }
    }
}

/// How restaurants are selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantSelection {
    /// The GUIDs listed in `restaurant_ids`
    #[default]
    Explicit,
    /// Every restaurant the directory reports under `management_group_ids`
    ManagementGroups,
}

impl FromStr for RestaurantSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "explicit" => Ok(RestaurantSelection::Explicit),
            "management_groups" => Ok(RestaurantSelection::ManagementGroups),
            other => Err(format!(
                "Invalid restaurants.select_type '{other}'. Must be one of: explicit, management_groups"
            )),
        }
    }
}

/// Main extractor configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Categories to extract per restaurant
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<Category>,

    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Toast API credentials and HTTP settings
    pub credentials: CredentialsConfig,

    /// Restaurant selection
    #[serde(default)]
    pub restaurants: RestaurantsConfig,

    /// Extraction window and paging
    #[serde(default)]
    pub sync: SyncConfig,

    /// Outbound call budgets
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Output tables
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Persisted run state
    #[serde(default)]
    pub state: StateConfig,

    /// Table mapping override
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExtractorConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoints.is_empty() {
            return Err("endpoints cannot be empty".to_string());
        }
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if self.endpoints[..i].contains(endpoint) {
                return Err(format!("endpoint '{endpoint}' is listed more than once"));
            }
        }

        self.application.validate()?;
        self.credentials.validate()?;
        self.restaurants.validate()?;
        self.sync.validate()?;
        self.rate_limit.validate()?;
        self.destination.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration for transport failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "credentials.retry.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err("credentials.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Toast API credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Base URL of the Toast API (e.g. `https://ws-api.toasttab.com`)
    pub base_url: String,

    /// Machine client ID
    pub client_id: String,

    /// Machine client secret
    /// Stored securely in memory and automatically zeroized on drop
    pub client_secret: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl CredentialsConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("credentials.base_url cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("credentials.base_url must start with http:// or https://".to_string());
        }
        if self.client_id.trim().is_empty() {
            return Err("credentials.client_id cannot be empty".to_string());
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err("credentials.client_secret cannot be empty".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("credentials.timeout_seconds must be > 0".to_string());
        }
        self.retry.validate()
    }
}

/// Restaurant selection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RestaurantsConfig {
    /// Selection strategy
    #[serde(default)]
    pub select_type: RestaurantSelection,

    /// Restaurant GUIDs (explicit selection)
    #[serde(default)]
    pub restaurant_ids: Vec<String>,

    /// Management group GUIDs (management_groups selection)
    #[serde(default)]
    pub management_group_ids: Vec<String>,
}

impl RestaurantsConfig {
    fn validate(&self) -> Result<(), String> {
        let has_any = |ids: &[String]| ids.iter().any(|id| !id.trim().is_empty());
        match self.select_type {
            RestaurantSelection::Explicit if !has_any(&self.restaurant_ids) => Err(
                "restaurants.restaurant_ids cannot be empty when select_type is 'explicit'"
                    .to_string(),
            ),
            RestaurantSelection::ManagementGroups if !has_any(&self.management_group_ids) => Err(
                "restaurants.management_group_ids cannot be empty when select_type is 'management_groups'"
                    .to_string(),
            ),
            _ => Ok(()),
        }
    }
}

/// Extraction window and paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Window policy
    #[serde(default)]
    pub mode: SyncMode,

    /// Window start (explicit mode): RFC 3339, YYYY-MM-DD or a relative expression
    #[serde(default = "default_start_date")]
    pub start_date: String,

    /// Window end (explicit mode)
    #[serde(default = "default_end_date")]
    pub end_date: String,

    /// Records requested per page (1-100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Records handed to the flattener at once (>= page_size)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl SyncConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.page_size) {
            return Err(format!(
                "sync.page_size must be between 1 and 100, got {}",
                self.page_size
            ));
        }
        if self.batch_size < self.page_size as usize {
            return Err(format!(
                "sync.batch_size ({}) must be >= sync.page_size ({})",
                self.batch_size, self.page_size
            ));
        }

        if self.mode == SyncMode::Explicit {
            let now = chrono::Utc::now();
            parse_date_expression(&self.start_date, now)
                .map_err(|e| format!("sync.start_date: {e}"))?;
            parse_date_expression(&self.end_date, now)
                .map_err(|e| format!("sync.end_date: {e}"))?;
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            page_size: default_page_size(),
            batch_size: default_batch_size(),
        }
    }
}

/// Outbound call budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Calls allowed per short window
    #[serde(default = "default_short_window_calls")]
    pub short_window_calls: usize,

    /// Short window length in seconds
    #[serde(default = "default_short_window_seconds")]
    pub short_window_seconds: u64,

    /// Calls allowed per long window
    #[serde(default = "default_long_window_calls")]
    pub long_window_calls: usize,

    /// Long window length in seconds
    #[serde(default = "default_long_window_seconds")]
    pub long_window_seconds: u64,
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.short_window_calls == 0 || self.long_window_calls == 0 {
            return Err("rate_limit window call counts must be > 0".to_string());
        }
        if self.short_window_seconds == 0 || self.long_window_seconds == 0 {
            return Err("rate_limit window lengths must be > 0".to_string());
        }
        if self.long_window_seconds < self.short_window_seconds {
            return Err(
                "rate_limit.long_window_seconds must be >= rate_limit.short_window_seconds"
                    .to_string(),
            );
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            short_window_calls: default_short_window_calls(),
            short_window_seconds: default_short_window_seconds(),
            long_window_calls: default_long_window_calls(),
            long_window_seconds: default_long_window_seconds(),
        }
    }
}

/// Output table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Load type recorded in every manifest
    #[serde(default)]
    pub load_type: LoadType,

    /// Directory the CSV tables and manifests are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Prepend the restaurant GUID to every row
    #[serde(default = "default_true")]
    pub include_restaurant_column: bool,

    /// Name of the restaurant GUID column
    #[serde(default = "default_restaurant_column")]
    pub restaurant_column: String,
}

impl DestinationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("destination.output_dir cannot be empty".to_string());
        }
        if self.include_restaurant_column && self.restaurant_column.trim().is_empty() {
            return Err(
                "destination.restaurant_column cannot be empty when include_restaurant_column is true"
                    .to_string(),
            );
        }
        Ok(())
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            load_type: LoadType::default(),
            output_dir: default_output_dir(),
            include_restaurant_column: true,
            restaurant_column: default_restaurant_column(),
        }
    }
}

/// State management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path of the JSON state file holding the watermark
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("state.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Table mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MappingConfig {
    /// JSON mapping document replacing the built-in one
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    /// Console output only, used before a configuration is available
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled is true".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_endpoints() -> Vec<Category> {
    vec![Category::Configuration, Category::Orders]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_start_date() -> String {
    "yesterday".to_string()
}

fn default_end_date() -> String {
    "now".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_batch_size() -> usize {
    1000
}

fn default_short_window_calls() -> usize {
    20
}

fn default_short_window_seconds() -> u64 {
    1
}

fn default_long_window_calls() -> usize {
    10_000
}

fn default_long_window_seconds() -> u64 {
    900
}

fn default_output_dir() -> String {
    "out/tables".to_string()
}

fn default_restaurant_column() -> String {
    "restaurant_guid".to_string()
}

fn default_state_path() -> String {
    "state.json".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn credentials() -> CredentialsConfig {
        CredentialsConfig {
            base_url: "https://ws-api.toasttab.com".to_string(),
            client_id: "client".to_string(),
            client_secret: secret_string("secret".to_string()),
            timeout_seconds: 30,
            retry: RetryConfig::default(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_validation() {
        let mut config = credentials();
        assert!(config.validate().is_ok());

        config.base_url = "ws-api.toasttab.com".to_string();
        assert!(config.validate().is_err());

        config = credentials();
        config.client_secret = secret_string(String::new());
        assert!(config.validate().is_err());

        config = credentials();
        config.client_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_page_and_batch_size() {
        let mut config = SyncConfig::default();
        assert!(config.validate().is_ok());

        config.page_size = 0;
        assert!(config.validate().is_err());

        config.page_size = 101;
        assert!(config.validate().is_err());

        config.page_size = 100;
        config.batch_size = 99;
        assert!(config.validate().is_err());

        config.batch_size = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sync_explicit_dates_must_parse() {
        let mut config = SyncConfig {
            start_date: "next tuesday".to_string(),
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());

        config.mode = SyncMode::Resume;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_restaurant_selection_validation() {
        let mut config = RestaurantsConfig::default();
        assert!(config.validate().is_err());

        config.restaurant_ids = vec!["r1".to_string()];
        assert!(config.validate().is_ok());

        config.select_type = RestaurantSelection::ManagementGroups;
        assert!(config.validate().is_err());

        config.management_group_ids = vec!["g1".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_limit_validation() {
        let mut config = RateLimitConfig::default();
        assert!(config.validate().is_ok());

        config.long_window_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_type_parsing() {
        assert_eq!(LoadType::from_str("full_load").unwrap(), LoadType::FullLoad);
        assert!(LoadType::from_str("append").is_err());
        assert!(LoadType::default().is_incremental());
    }

    #[test]
    fn test_duplicate_endpoints_rejected() {
        let config: ExtractorConfig = toml::from_str(
            r#"
endpoints = ["orders", "orders"]

[credentials]
base_url = "https://ws-api.toasttab.com"
client_id = "id"
client_secret = "secret"

[restaurants]
restaurant_ids = ["r1"]
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn test_default_values() {
        let destination = DestinationConfig::default();
        assert_eq!(destination.load_type, LoadType::IncrementalLoad);
        assert!(destination.include_restaurant_column);
        assert_eq!(destination.restaurant_column, "restaurant_guid");

        let logging = LoggingConfig::console_only();
        assert!(!logging.local_enabled);
        assert_eq!(logging.local_rotation, "daily");
    }
}
