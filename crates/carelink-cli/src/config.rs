use std::time::Duration;

use carelink_gateway::GatewayConfig;
use carelink_gateway::config::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "carelink.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        let store = &self.store;
        for (key, value) in [
            ("store.base_url", &store.base_url),
            ("store.project", &store.project),
            ("store.location", &store.location),
            ("store.dataset", &store.dataset),
            ("store.fhir_store", &store.fhir_store),
            ("store.token_env", &store.token_env),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{key} must be set"));
            }
        }
        if !store.base_url.starts_with("http://") && !store.base_url.starts_with("https://") {
            return Err("store.base_url must be an http(s) URL".into());
        }
        if store.request_timeout_ms == 0 {
            return Err("store.request_timeout_ms must be > 0".into());
        }
        let version = store.fhir_version.to_ascii_uppercase();
        let allowed = ["R4", "R4B", "R5"];
        if !allowed.contains(&version.as_str()) {
            return Err(format!("store.fhir_version must be one of {allowed:?}"));
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

/// Location of the FHIR store and how to authenticate against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub fhir_store: String,
    #[serde(default = "default_fhir_version")]
    pub fhir_version: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_fhir_version() -> String {
    "R4".into()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_token_env() -> String {
    "CARELINK_ACCESS_TOKEN".into()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project: String::new(),
            location: String::new(),
            dataset: String::new(),
            fhir_store: String::new(),
            fhir_version: default_fhir_version(),
            request_timeout_ms: default_request_timeout_ms(),
            token_env: default_token_env(),
        }
    }
}

impl StoreSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(
            &self.project,
            &self.location,
            &self.dataset,
            &self.fhir_store,
        )
        .with_base_url(&self.base_url)
        .with_fhir_version(&self.fhir_version)
        .with_request_timeout(self.request_timeout())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, DEFAULT_CONFIG_FILE};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Loads `path` (or `carelink.toml` in the working directory) and applies
    /// `CARELINK__SECTION__KEY` environment overrides. A missing file is not
    /// an error; the result must still validate.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if file.exists() {
            builder = builder.add_source(File::from(file));
        } else if let Some(p) = path {
            return Err(format!("config file not found: {p}"));
        }
        // e.g. CARELINK__STORE__PROJECT=my-project
        builder = builder.add_source(
            Environment::with_prefix("CARELINK")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            store: StoreSettings {
                project: "proj".into(),
                location: "europe-west2".into(),
                dataset: "clinical".into(),
                fhir_store: "records".into(),
                ..Default::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_defaults() {
        let store = StoreSettings::default();
        assert_eq!(store.base_url, DEFAULT_BASE_URL);
        assert_eq!(store.request_timeout(), Duration::from_secs(10));
        assert_eq!(store.token_env, "CARELINK_ACCESS_TOKEN");
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_store_location_is_required() {
        let mut cfg = valid();
        cfg.store.dataset = " ".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("store.dataset"));
    }

    #[test]
    fn test_rejects_zero_timeout_and_bad_level() {
        let mut cfg = valid();
        cfg.store.request_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_gateway_config_mapping() {
        let mut cfg = valid();
        cfg.store.request_timeout_ms = 2500;
        let gateway = cfg.store.gateway_config();
        assert_eq!(gateway.request_timeout, Duration::from_millis(2500));
        assert_eq!(
            gateway.store_url(),
            "https://healthcare.googleapis.com/v1/projects/proj/locations/europe-west2/datasets/clinical/fhirStores/records"
        );
    }
}
