//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Loading runs in a fixed order: `${VAR}` substitution, TOML parsing,
//! `TOAST_<SECTION>_<KEY>` overrides, then validation.

use super::schema::ExtractorConfig;
use super::secret::secret_string;
use crate::domain::errors::ExtractorError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExtractorConfig
/// 4. Applies environment variable overrides (TOAST_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`ExtractorError::Configuration`] if:
/// - File cannot be read
/// - A referenced environment variable is not set
/// - TOML parsing fails
/// - An override holds an invalid value
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use toast_extractor::config::loader::load_config;
///
/// let config = load_config("toast.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExtractorConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExtractorError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExtractorError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ExtractorConfig = toml::from_str(&contents)
        .map_err(|e| ExtractorError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ExtractorError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExtractorError::Configuration(e.to_string()))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExtractorError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        ExtractorError::Configuration(format!("Invalid value for {}: {}", name, e))
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Applies environment variable overrides using TOAST_* prefix
///
/// Environment variables follow the pattern: TOAST_<SECTION>_<KEY>
/// For example: TOAST_CREDENTIALS_CLIENT_ID, TOAST_SYNC_MODE.
/// List values are comma-separated.
fn apply_env_overrides(config: &mut ExtractorConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    if let Some(val) = var("TOAST_ENDPOINTS") {
        config.endpoints = split_list(&val)
            .iter()
            .map(|e| parse_override("TOAST_ENDPOINTS", e))
            .collect::<Result<_>>()?;
    }

    // Application overrides
    if let Some(val) = var("TOAST_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Credential overrides
    if let Some(val) = var("TOAST_CREDENTIALS_BASE_URL") {
        config.credentials.base_url = val;
    }
    if let Some(val) = var("TOAST_CREDENTIALS_CLIENT_ID") {
        config.credentials.client_id = val;
    }
    if let Some(val) = var("TOAST_CREDENTIALS_CLIENT_SECRET") {
        config.credentials.client_secret = secret_string(val);
    }
    if let Some(val) = var("TOAST_CREDENTIALS_TIMEOUT_SECONDS") {
        config.credentials.timeout_seconds = parse_override("TOAST_CREDENTIALS_TIMEOUT_SECONDS", &val)?;
    }

    // Restaurant overrides
    if let Some(val) = var("TOAST_RESTAURANTS_SELECT_TYPE") {
        config.restaurants.select_type = parse_override("TOAST_RESTAURANTS_SELECT_TYPE", &val)?;
    }
    if let Some(val) = var("TOAST_RESTAURANTS_RESTAURANT_IDS") {
        config.restaurants.restaurant_ids = split_list(&val);
    }
    if let Some(val) = var("TOAST_RESTAURANTS_MANAGEMENT_GROUP_IDS") {
        config.restaurants.management_group_ids = split_list(&val);
    }

    // Sync overrides
    if let Some(val) = var("TOAST_SYNC_MODE") {
        config.sync.mode = parse_override("TOAST_SYNC_MODE", &val)?;
    }
    if let Some(val) = var("TOAST_SYNC_START_DATE") {
        config.sync.start_date = val;
    }
    if let Some(val) = var("TOAST_SYNC_END_DATE") {
        config.sync.end_date = val;
    }
    if let Some(val) = var("TOAST_SYNC_PAGE_SIZE") {
        config.sync.page_size = parse_override("TOAST_SYNC_PAGE_SIZE", &val)?;
    }
    if let Some(val) = var("TOAST_SYNC_BATCH_SIZE") {
        config.sync.batch_size = parse_override("TOAST_SYNC_BATCH_SIZE", &val)?;
    }

    // Destination overrides
    if let Some(val) = var("TOAST_DESTINATION_LOAD_TYPE") {
        config.destination.load_type = parse_override("TOAST_DESTINATION_LOAD_TYPE", &val)?;
    }
    if let Some(val) = var("TOAST_DESTINATION_OUTPUT_DIR") {
        config.destination.output_dir = val;
    }

    // State and mapping overrides
    if let Some(val) = var("TOAST_STATE_PATH") {
        config.state.path = val;
    }
    if let Some(val) = var("TOAST_MAPPING_PATH") {
        config.mapping.path = Some(val);
    }

    // Logging overrides
    if let Some(val) = var("TOAST_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Some(val) = var("TOAST_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("TOAST_LOADER_TEST_SECRET", "test_value");
        let input = "client_secret = \"${TOAST_LOADER_TEST_SECRET}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "client_secret = \"test_value\"\n");
        std::env::remove_var("TOAST_LOADER_TEST_SECRET");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("TOAST_LOADER_MISSING_VAR");
        let input = "client_secret = \"${TOAST_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("TOAST_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# client_secret = \"${TOAST_LOADER_NEVER_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(ExtractorError::Configuration(_))));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
endpoints = ["orders"]

[credentials]
base_url = "https://ws-api.toasttab.com"
client_id = "client"
client_secret = "secret"

[restaurants]
restaurant_ids = ["r-1", "r-2"]

[destination]
output_dir = "out"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.credentials.client_id, "client");
        assert_eq!(config.restaurants.restaurant_ids, vec!["r-1", "r-2"]);
        assert_eq!(config.destination.output_dir, "out");
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[credentials\nbase_url = 1").unwrap();
        temp_file.flush().unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
