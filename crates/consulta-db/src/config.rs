//! # Application Configuration
//!
//! Settings for the local store and the discount calculator.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CONSULTA_DB_PATH=/var/lib/consulta/consulta.db                     │
//! │     CONSULTA_DB_MAX_CONNECTIONS=8                                      │
//! │     CONSULTA_DISCOUNT_EXEMPT_PANELS=38,41                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/consulta/consulta.toml (Linux)                           │
//! │     ~/Library/Application Support/br.com.consulta.consulta/... (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "consulta.db"
//! max_connections = 5
//!
//! [discount]
//! exempt_panels = [38]
//!
//! [discount.tiers]
//! rainha = 1500   # basis points
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;
use consulta_core::{DiscountPolicy, PanelId, Plan};

/// Environment variable names.
pub const ENV_DB_PATH: &str = "CONSULTA_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "CONSULTA_DB_MAX_CONNECTIONS";
pub const ENV_DISCOUNT_EXEMPT_PANELS: &str = "CONSULTA_DISCOUNT_EXEMPT_PANELS";

// =============================================================================
// Errors
// =============================================================================

/// Configuration load errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Local store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Relative paths resolve against the working directory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("consulta.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Fixed tiers and exempt panels. Tiers from stored plans are merged
    /// on top at runtime by [`AppConfig::discount_policy`].
    #[serde(default)]
    pub discount: DiscountPolicy,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, else the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses one TOML file, without env overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(?path, "Config saved");
        Ok(())
    }

    /// Checks values that would only fail later at connect time.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Malformed values are errors. An empty exempt-panel list clears the
    /// exemptions.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_DB_MAX_CONNECTIONS) {
            self.database.max_connections = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a number, got {:?}",
                    ENV_DB_MAX_CONNECTIONS, raw
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_DISCOUNT_EXEMPT_PANELS) {
            let panels = parse_panel_list(&raw)?;
            debug!(?panels, "Overriding exempt panels from environment");
            self.discount = std::mem::take(&mut self.discount).with_exempt_panels(panels);
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("br.com", "consulta", "consulta")
            .map(|dirs| dirs.config_dir().join("consulta.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool settings for [`crate::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }

    /// Discount policy: stored plan tiers over the configured ones, with
    /// the configured exempt panels.
    pub fn discount_policy(&self, plans: &[Plan]) -> DiscountPolicy {
        let mut policy = self.discount.clone();
        policy.merge_tiers(&DiscountPolicy::from_plans(plans));
        policy
    }
}

/// Parses `"38, 41"` into panel ids. An empty string means no exemptions.
fn parse_panel_list(raw: &str) -> ConfigResult<Vec<PanelId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<PanelId>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be comma-separated panel ids, got {:?}",
                    ENV_DISCOUNT_EXEMPT_PANELS, raw
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use consulta_core::{DiscountRate, Money, PlanCategory, PlanId};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, PathBuf::from("consulta.db"));
        assert_eq!(config.database.max_connections, 5);
        assert!(config.discount.is_exempt(PanelId::new(38)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "/data/consulta.db"

            [discount]
            exempt_panels = [12]

            [discount.tiers]
            rainha = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/data/consulta.db"));
        assert_eq!(config.database.max_connections, 5);
        assert!(config.discount.is_exempt(PanelId::new(12)));
        assert!(!config.discount.is_exempt(PanelId::new(38)));
        assert_eq!(config.discount.rate_for("rainha").bps(), 1500);
    }

    #[test]
    fn test_toml_tiers_are_normalized_and_capped() {
        let config: AppConfig = toml::from_str(
            r#"
            [discount.tiers]
            Rainha = 1500
            "Rei Supremo " = 25000
            "#,
        )
        .unwrap();

        let quote = config
            .discount
            .quote(Money::from_cents(1000), Some("rainha"), None);
        assert_eq!(quote.final_price.cents(), 850);
        assert_eq!(config.discount.rate_for("rei supremo").bps(), 10_000);
    }

    #[test]
    fn test_env_overrides_beat_file_values() {
        let mut config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "from-file.db"
            max_connections = 2

            [discount]
            exempt_panels = [12]
            "#,
        )
        .unwrap();

        config
            .apply_env_overrides(env(&[
                (ENV_DB_PATH, "from-env.db"),
                (ENV_DB_MAX_CONNECTIONS, " 9 "),
                (ENV_DISCOUNT_EXEMPT_PANELS, "38, 41"),
            ]))
            .unwrap();

        assert_eq!(config.database.path, PathBuf::from("from-env.db"));
        assert_eq!(config.database.max_connections, 9);
        assert!(config.discount.is_exempt(PanelId::new(41)));
        assert!(!config.discount.is_exempt(PanelId::new(12)));
    }

    #[test]
    fn test_empty_exempt_list_disables_exemptions() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[(ENV_DISCOUNT_EXEMPT_PANELS, "")]))
            .unwrap();
        assert!(config.discount.exempt_panels().is_empty());
    }

    #[test]
    fn test_malformed_env_rejected() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_env_overrides(env(&[(ENV_DB_MAX_CONNECTIONS, "many")]))
            .is_err());
        assert!(config
            .apply_env_overrides(env(&[(ENV_DISCOUNT_EXEMPT_PANELS, "38,x")]))
            .is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("consulta-config-{}", std::process::id()));
        let path = dir.join("consulta.toml");

        let mut config = AppConfig::default();
        config.database.max_connections = 3;
        config.save(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_discount_policy_merges_plan_tiers() {
        let mut config = AppConfig::default();
        config.discount = config
            .discount
            .clone()
            .with_tier("rainha", DiscountRate::from_bps(500))
            .with_tier("fixo", DiscountRate::from_bps(300));

        let plan = Plan {
            id: PlanId::new(1),
            name: "Rainha".to_string(),
            slug: "rainha".to_string(),
            description: None,
            price: Money::from_cents(4990),
            original_price: None,
            duration_days: 30,
            max_consultations: None,
            features: vec![],
            modules_included: vec![],
            panels_included: vec![],
            category: PlanCategory::Basic,
            is_active: true,
            is_popular: false,
            discount_percentage: 15.0,
        };

        let policy = config.discount_policy(&[plan]);
        assert_eq!(policy.rate_for("rainha").bps(), 1500);
        assert_eq!(policy.rate_for("fixo").bps(), 300);
        assert!(policy.is_exempt(PanelId::new(38)));
    }
}
