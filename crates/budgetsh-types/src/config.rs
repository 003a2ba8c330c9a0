//! Local shell configuration, stored as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "BUDGETSH_CONFIG";

/// Config file looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "budgetsh.toml";

/// Keys `config edit` accepts.
pub const EDITABLE_KEYS: &[&str] = &["base_url", "stay_logged_in", "currency_iso_code"];

/// Settings local to this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// URL of the budgeting server.
    pub base_url: String,
    /// Keep the login session alive across restarts.
    pub stay_logged_in: bool,
    /// ISO code of the currency used when showing amounts.
    pub currency_iso_code: String,
    /// Session token kept between runs while `stay_logged_in` is set.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            stay_logged_in: true,
            currency_iso_code: "USD".to_string(),
            refresh_token: String::new(),
        }
    }
}

impl ShellConfig {
    /// Parse a config from TOML. Missing keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the config as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Path of the config file: `$BUDGETSH_CONFIG`, else `./budgetsh.toml`.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_ENV_VAR)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load the config at `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "No config file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config to `path` as TOML.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Change one editable setting from its text form.
    ///
    /// The config is left untouched if the key is unknown or the result
    /// does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "base_url" => next.base_url = value.trim().to_string(),
            "stay_logged_in" => {
                next.stay_logged_in = value.trim().parse().map_err(|_| {
                    ShellError::Config(format!(
                        "stay_logged_in must be true or false, got '{value}'"
                    ))
                })?;
            },
            "currency_iso_code" => next.currency_iso_code = value.trim().to_ascii_uppercase(),
            _ => {
                return Err(ShellError::Config(format!(
                    "unknown setting '{key}'; editable settings are {}",
                    EDITABLE_KEYS.join(", ")
                )));
            },
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ShellError::Config("base_url must not be empty".to_string()));
        }
        let iso = &self.currency_iso_code;
        if iso.len() != 3 || !iso.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ShellError::Config(format!(
                "currency_iso_code must be a three-letter code, got '{iso}'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ShellConfig::default();
        assert_eq!(c.currency_iso_code, "USD");
        assert!(c.stay_logged_in);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = ShellConfig::from_toml_str("base_url = \"https://budget.example\"").unwrap();
        assert_eq!(c.base_url, "https://budget.example");
        assert_eq!(c.currency_iso_code, "USD");
    }

    #[test]
    fn rejects_bad_currency_code() {
        let err = ShellConfig::from_toml_str("currency_iso_code = \"dollars\"").unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ShellConfig::from_toml_str("base_url = ").unwrap_err();
        assert!(matches!(err, ShellError::TomlParse(_)));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = ShellConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c, ShellConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgetsh.toml");
        let config = ShellConfig {
            base_url: "http://10.0.0.2:9000".to_string(),
            stay_logged_in: false,
            currency_iso_code: "EUR".to_string(),
            refresh_token: String::new(),
        };
        config.save_to(&path).unwrap();
        assert_eq!(ShellConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn empty_token_is_not_written() {
        let text = ShellConfig::default().to_toml_string().unwrap();
        assert!(!text.contains("refresh_token"));
        let with_token = ShellConfig {
            refresh_token: "session-1-2".to_string(),
            ..ShellConfig::default()
        };
        assert!(with_token.to_toml_string().unwrap().contains("refresh_token"));
    }

    #[test]
    fn set_parses_each_key() {
        let mut c = ShellConfig::default();
        c.set("stay_logged_in", "false").unwrap();
        c.set("currency_iso_code", "eur").unwrap();
        c.set("base_url", "https://budget.example").unwrap();
        assert!(!c.stay_logged_in);
        assert_eq!(c.currency_iso_code, "EUR");
        assert_eq!(c.base_url, "https://budget.example");
    }

    #[test]
    fn set_rejects_bad_values_without_changing_anything() {
        let mut c = ShellConfig::default();
        assert!(matches!(c.set("stay_logged_in", "maybe"), Err(ShellError::Config(_))));
        assert!(matches!(c.set("currency_iso_code", "EURO"), Err(ShellError::Config(_))));
        assert!(matches!(c.set("refresh_token", "x"), Err(ShellError::Config(_))));
        assert_eq!(c, ShellConfig::default());
    }
}
