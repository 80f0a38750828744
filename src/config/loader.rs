//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the service
//! configuration from a YAML file and the process environment.

use std::env;
use std::fs;
use std::path::Path;

use crate::error::{StewardError, StewardResult};

use super::types::{AppConfig, LogFormat};

/// Environment variables accepted for the Azure endpoint, in priority order.
const AZURE_ENDPOINT_VARS: [&str; 3] = [
    "AZURE_DI_ENDPOINT",
    "AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT",
    "AZURE_DOCUMENT_INTELLIGENCE_URL",
];

/// Environment variables accepted for the Azure key, in priority order.
const AZURE_KEY_VARS: [&str; 3] = [
    "AZURE_DI_KEY",
    "AZURE_DOCUMENT_INTELLIGENCE_KEY",
    "AZURE_DOCUMENT_INTELLIGENCE_API_KEY",
];

/// Loads and provides access to the service configuration.
///
/// Values are resolved in three layers: built-in defaults, the optional
/// YAML file, then environment variables.
///
/// # Example
///
/// ```no_run
/// use tip_steward::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/tip-steward.yaml")?;
/// println!("Binding to {}", loader.config().server.bind);
/// # Ok::<(), tip_steward::error::StewardError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from a YAML file, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file cannot be read, `ConfigParseError`
    /// if it is not valid YAML for [`AppConfig`], and `InvalidConfig` if a
    /// value fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> StewardResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| StewardError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config: AppConfig =
            serde_yaml::from_str(&content).map_err(|e| StewardError::ConfigParseError {
                path: path_str,
                message: e.to_string(),
            })?;

        Self::from_config(config, |key| env::var(key).ok())
    }

    /// Builds configuration from defaults and environment variables only.
    pub fn from_env() -> StewardResult<Self> {
        Self::from_config(AppConfig::default(), |key| env::var(key).ok())
    }

    /// Applies overrides from `lookup` to `config` and validates the result.
    ///
    /// `lookup` maps an environment variable name to its value; the public
    /// constructors pass the process environment.
    pub fn from_config<F>(mut config: AppConfig, lookup: F) -> StewardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        apply_overrides(&mut config, &lookup)?;
        validate(&config)?;
        Ok(Self { config })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> AppConfig {
        self.config
    }
}

fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(*key))
        .find(|value| !value.trim().is_empty())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> StewardResult<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|_| StewardError::InvalidConfig {
                    field: key.to_string(),
                    message: format!("cannot parse '{}'", raw),
                })
        }
        _ => Ok(None),
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> StewardResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = first_set(lookup, &["TIP_STEWARD_BIND"]) {
        config.server.bind = bind;
    }
    if let Some(engine) = first_set(lookup, &["OCR_ENGINE"]) {
        config.ocr.engine = engine;
    }

    let azure = &mut config.ocr.azure;
    if let Some(endpoint) = first_set(lookup, &AZURE_ENDPOINT_VARS) {
        azure.endpoint = Some(endpoint);
    }
    if let Some(key) = first_set(lookup, &AZURE_KEY_VARS) {
        azure.api_key = Some(key);
    }
    if let Some(model_id) = first_set(lookup, &["AZURE_DI_MODEL_ID"]) {
        azure.model_id = model_id;
    }
    if let Some(api_version) = first_set(lookup, &["AZURE_DI_API_VERSION"]) {
        azure.api_version = api_version;
    }
    if let Some(interval) = parse_var(lookup, "AZURE_DI_POLL_INTERVAL_MS")? {
        azure.poll_interval_ms = interval;
    }
    if let Some(max_polls) = parse_var(lookup, "AZURE_DI_MAX_POLLS")? {
        azure.max_polls = max_polls;
    }

    let tesseract = &mut config.ocr.tesseract;
    if let Some(binary) = first_set(lookup, &["TESSERACT_BIN"]) {
        tesseract.binary = binary;
    }
    if let Some(language) = first_set(lookup, &["TESSERACT_LANG"]) {
        tesseract.language = language;
    }

    if let Some(format) = first_set(lookup, &["LOG_FORMAT"]) {
        config.log_format = match format.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" | "text" => LogFormat::Compact,
            other => {
                return Err(StewardError::InvalidConfig {
                    field: "LOG_FORMAT".to_string(),
                    message: format!("expected 'json' or 'compact', got '{}'", other),
                });
            }
        };
    }

    Ok(())
}

fn validate(config: &AppConfig) -> StewardResult<()> {
    let invalid = |field: &str, message: &str| StewardError::InvalidConfig {
        field: field.to_string(),
        message: message.to_string(),
    };

    let denominations = &config.denominations;
    if denominations.is_empty() {
        return Err(invalid("denominations", "at least one denomination is required"));
    }
    if denominations.contains(&0) {
        return Err(invalid("denominations", "denominations must be positive"));
    }
    if !denominations.contains(&1) {
        return Err(invalid(
            "denominations",
            "a denomination of 1 is required so every payout can be paid exactly",
        ));
    }
    let mut unique = denominations.clone();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() != denominations.len() {
        return Err(invalid("denominations", "denominations must be unique"));
    }

    if config.ocr.azure.max_polls == 0 {
        return Err(invalid("ocr.azure.max_polls", "must be greater than zero"));
    }
    if config.server.max_upload_bytes == 0 {
        return Err(invalid("server.max_upload_bytes", "must be greater than zero"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_load_bundled_config() {
        let loader = ConfigLoader::load("./config/tip-steward.yaml").expect("Failed to load config");
        let config = loader.config();
        assert_eq!(config.denominations, vec![20, 10, 5, 1]);
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.ocr.tesseract.page_segmentation_mode, 6);
    }

    #[test]
    fn test_defaults_without_overrides() {
        let loader = ConfigLoader::from_config(AppConfig::default(), lookup_from(&[])).unwrap();
        let config = loader.config();
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert!(!config.ocr.azure.has_credentials());
    }

    #[test]
    fn test_primary_azure_variables_win() {
        let loader = ConfigLoader::from_config(
            AppConfig::default(),
            lookup_from(&[
                ("AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT", "https://secondary.example"),
                ("AZURE_DI_ENDPOINT", "https://primary.example"),
                ("AZURE_DOCUMENT_INTELLIGENCE_API_KEY", "fallback-key"),
            ]),
        )
        .unwrap();

        let azure = &loader.config().ocr.azure;
        assert_eq!(azure.endpoint.as_deref(), Some("https://primary.example"));
        assert_eq!(azure.api_key.as_deref(), Some("fallback-key"));
        assert!(azure.has_credentials());
    }

    #[test]
    fn test_empty_variable_falls_through_to_next_alias() {
        let loader = ConfigLoader::from_config(
            AppConfig::default(),
            lookup_from(&[
                ("AZURE_DI_KEY", ""),
                ("AZURE_DOCUMENT_INTELLIGENCE_KEY", "real-key"),
            ]),
        )
        .unwrap();
        assert_eq!(loader.config().ocr.azure.api_key.as_deref(), Some("real-key"));
    }

    #[test]
    fn test_numeric_overrides() {
        let loader = ConfigLoader::from_config(
            AppConfig::default(),
            lookup_from(&[("AZURE_DI_POLL_INTERVAL_MS", "250"), ("AZURE_DI_MAX_POLLS", "4")]),
        )
        .unwrap();
        assert_eq!(loader.config().ocr.azure.poll_interval_ms, 250);
        assert_eq!(loader.config().ocr.azure.max_polls, 4);
    }

    #[test]
    fn test_unparseable_numeric_override_is_rejected() {
        let err = ConfigLoader::from_config(
            AppConfig::default(),
            lookup_from(&[("AZURE_DI_MAX_POLLS", "lots")]),
        )
        .unwrap_err();
        assert!(matches!(err, StewardError::InvalidConfig { ref field, .. } if field == "AZURE_DI_MAX_POLLS"));
    }

    #[test]
    fn test_zero_max_polls_is_rejected() {
        let err = ConfigLoader::from_config(
            AppConfig::default(),
            lookup_from(&[("AZURE_DI_MAX_POLLS", "0")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ocr.azure.max_polls"));
    }

    #[test]
    fn test_denominations_without_one_are_rejected() {
        let mut config = AppConfig::default();
        config.denominations = vec![20, 10, 5];
        let err = ConfigLoader::from_config(config, lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("denomination of 1"));
    }

    #[test]
    fn test_duplicate_denominations_are_rejected() {
        let mut config = AppConfig::default();
        config.denominations = vec![20, 20, 1];
        assert!(ConfigLoader::from_config(config, lookup_from(&[])).is_err());
    }

    #[test]
    fn test_log_format_override() {
        let loader =
            ConfigLoader::from_config(AppConfig::default(), lookup_from(&[("LOG_FORMAT", "JSON")]))
                .unwrap();
        assert_eq!(loader.config().log_format, LogFormat::Json);

        let err = ConfigLoader::from_config(AppConfig::default(), lookup_from(&[("LOG_FORMAT", "xml")]))
            .unwrap_err();
        assert!(err.to_string().contains("LOG_FORMAT"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigLoader::load("/nonexistent/tip-steward.yaml").unwrap_err();
        assert!(matches!(err, StewardError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_yaml_file() {
        let path = env::temp_dir().join(format!("tip-steward-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "server:\n  bind: \"0.0.0.0:8080\"\ndenominations: [50, 20, 10, 5, 1]").unwrap();
        drop(file);

        let loader = ConfigLoader::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loader.config().denominations, vec![50, 20, 10, 5, 1]);
        // The bind address may be overridden by TIP_STEWARD_BIND in the test environment.
        if env::var("TIP_STEWARD_BIND").is_err() {
            assert_eq!(loader.config().server.bind, "0.0.0.0:8080");
        }
    }

    #[test]
    fn test_load_invalid_yaml() {
        let path = env::temp_dir().join(format!("tip-steward-{}.yaml", uuid::Uuid::new_v4()));
        fs::write(&path, "denominations: [twenty").unwrap();

        let err = ConfigLoader::load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, StewardError::ConfigParseError { .. }));
    }
}
