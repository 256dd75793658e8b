use crate::adapters::nominatim::{DEFAULT_NOMINATIM_ENDPOINT, DEFAULT_USER_AGENT};
use crate::core::controller::FormSettings;
use crate::core::guard::{DEFAULT_RATE_LIMIT_WINDOW_MS, RATE_LIMIT_STORAGE_KEY};
use crate::core::location::default_cities;
use crate::domain::model::City;
use crate::domain::ports::PositionOptions;
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// One day; longer windows would effectively disable the form.
pub const MAX_RATE_LIMIT_WINDOW_MS: u64 = 86_400_000;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env pattern is a valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub form: FormSection,
    pub location: LocationSection,
    pub geocoder: GeocoderSection,
    pub store: StoreSection,
    pub memory: MemorySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSection {
    pub require_email: bool,
    pub check_business_id: bool,
    pub rate_limit_window_ms: u64,
    pub rate_limit_key: String,
}

impl Default for FormSection {
    fn default() -> Self {
        Self {
            require_email: true,
            check_business_id: true,
            rate_limit_window_ms: DEFAULT_RATE_LIMIT_WINDOW_MS as u64,
            rate_limit_key: RATE_LIMIT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSection {
    pub gps_timeout_ms: u64,
    pub gps_max_age_ms: u64,
    pub cities: Vec<City>,
}

impl Default for LocationSection {
    fn default() -> Self {
        Self {
            gps_timeout_ms: 10_000,
            gps_max_age_ms: 60_000,
            cities: default_cities(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderSection {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for GeocoderSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NOMINATIM_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Leaving `url` unset selects the demo store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub table: String,
    pub timeout_seconds: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            table: "leads".to_string(),
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub path: String,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            path: ".lead-intake/memory.json".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LeadError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LeadError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn form_settings(&self) -> FormSettings {
        FormSettings {
            require_email: self.form.require_email,
            check_business_id: self.form.check_business_id,
            rate_limit_window_ms: i64::try_from(self.form.rate_limit_window_ms)
                .unwrap_or(i64::MAX),
            rate_limit_key: self.form.rate_limit_key.clone(),
            position: PositionOptions {
                timeout: Duration::from_millis(self.location.gps_timeout_ms),
                maximum_age: Duration::from_millis(self.location.gps_max_age_ms),
            },
            cities: self.location.cities.clone(),
        }
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_seconds)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_seconds)
    }

    /// Supabase url and key when a real store is configured.
    pub fn store_credentials(&self) -> Option<(&str, &str)> {
        let url = self.store.url.as_deref()?;
        let key = self.store.anon_key.as_deref()?;
        Some((url, key))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_range(
            "form.rate_limit_window_ms",
            self.form.rate_limit_window_ms,
            1,
            MAX_RATE_LIMIT_WINDOW_MS,
        )?;
        validate_non_empty_string("form.rate_limit_key", &self.form.rate_limit_key)?;

        validate_positive_number("location.gps_timeout_ms", self.location.gps_timeout_ms, 1)?;
        for city in &self.location.cities {
            validate_non_empty_string("location.cities.name", &city.name)?;
            validate_range("location.cities.lat", city.lat, -90.0, 90.0)?;
            validate_range("location.cities.lng", city.lng, -180.0, 180.0)?;
        }

        validate_url("geocoder.endpoint", &self.geocoder.endpoint)?;
        validate_non_empty_string("geocoder.user_agent", &self.geocoder.user_agent)?;
        validate_positive_number("geocoder.timeout_seconds", self.geocoder.timeout_seconds, 1)?;

        if let Some(url) = &self.store.url {
            validate_url("store.url", url)?;
            let key = self
                .store
                .anon_key
                .as_deref()
                .ok_or_else(|| LeadError::MissingConfigError {
                    field: "store.anon_key".to_string(),
                })?;
            // 未替換的 ${VAR} 代表環境變數沒有設定
            if key.trim().is_empty() || ENV_VAR_PATTERN.is_match(key) {
                return Err(LeadError::MissingConfigError {
                    field: "store.anon_key".to_string(),
                });
            }
            validate_non_empty_string("store.table", &self.store.table)?;
        }

        validate_non_empty_string("memory.path", &self.memory.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_ok());

        let settings = config.form_settings();
        assert!(settings.require_email);
        assert!(settings.check_business_id);
        assert_eq!(settings.rate_limit_window_ms, 10_000);
        assert_eq!(settings.rate_limit_key, "quoteFlow:lastSubmitAt");
        assert_eq!(settings.position.timeout, Duration::from_secs(10));
        assert_eq!(settings.position.maximum_age, Duration::from_secs(60));
        assert_eq!(settings.cities.len(), 10);
        assert!(config.store_credentials().is_none());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[form]
require_email = false
rate_limit_window_ms = 30000

[location]
gps_timeout_ms = 5000

[[location.cities]]
name = "Rovaniemi"
lat = 66.5039
lng = 25.7294

[store]
url = "https://demo.supabase.co"
anon_key = "public-anon"
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        let settings = config.form_settings();
        assert!(!settings.require_email);
        assert_eq!(settings.rate_limit_window_ms, 30_000);
        assert_eq!(settings.cities.len(), 1);
        assert_eq!(settings.cities[0].name, "Rovaniemi");
        assert_eq!(
            config.store_credentials(),
            Some(("https://demo.supabase.co", "public-anon"))
        );
        assert_eq!(config.store.table, "leads");
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("LEAD_INTAKE_TEST_ANON_KEY", "from-env");
        let config = TomlConfig::from_toml_str(
            r#"
[store]
url = "https://demo.supabase.co"
anon_key = "${LEAD_INTAKE_TEST_ANON_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.store.anon_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_unresolved_anon_key_is_missing() {
        let config = TomlConfig::from_toml_str(
            r#"
[store]
url = "https://demo.supabase.co"
anon_key = "${LEAD_INTAKE_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(LeadError::MissingConfigError { ref field }) if field == "store.anon_key"
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = TomlConfig::from_toml_str("[form]\nrate_limit_window_ms = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config =
            TomlConfig::from_toml_str("[geocoder]\nendpoint = \"ftp://osm.example\"\n").unwrap();
        assert!(config.validate().is_err());

        assert!(TomlConfig::from_toml_str("[form\n").is_err());

        let config =
            TomlConfig::from_toml_str("[form]\nrate_limit_window_ms = 9223372036854775807\n")
                .unwrap();
        assert!(matches!(
            config.validate(),
            Err(LeadError::InvalidConfigValueError { ref field, .. }) if field == "form.rate_limit_window_ms"
        ));
    }
}
