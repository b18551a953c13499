//! Application configuration module
//!
//! Configuration is read from environment variables with the `LICENSING`
//! prefix; nested values are separated by double underscores. A `.env` file
//! is honoured during development.
//!
//! # Example
//!
//! ```no_run
//! use commerce_license::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod licensing;
mod logging;
mod order_workflow;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use licensing::{parse_offset, LicensingConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use order_workflow::OrderWorkflowConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub licensing: LicensingConfig,

    #[serde(default)]
    pub order_workflow: OrderWorkflowConfig,

    /// Present only when licenses are persisted in PostgreSQL
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `LICENSING__LICENSING__DEFAULT_TIMEZONE=+02:00`
    /// - `LICENSING__ORDER_WORKFLOW__PLACED_STATE=completed`
    /// - `LICENSING__DATABASE__URL=postgres://...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LICENSING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.licensing.validate()?;
        self.order_workflow.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "LICENSING__LICENSING__DEFAULT_TIMEZONE",
        "LICENSING__ORDER_WORKFLOW__PLACED_STATE",
        "LICENSING__ORDER_WORKFLOW__ACTIVATE_ON_PLACE_REQUIRES_DRAFT_ORIGIN",
        "LICENSING__DATABASE__URL",
        "LICENSING__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.licensing.default_timezone, "+00:00");
        assert_eq!(config.order_workflow, OrderWorkflowConfig::default());
        assert!(config.database.is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_nested_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LICENSING__LICENSING__DEFAULT_TIMEZONE", "+02:00");
        env::set_var("LICENSING__ORDER_WORKFLOW__PLACED_STATE", "completed");
        env::set_var(
            "LICENSING__ORDER_WORKFLOW__ACTIVATE_ON_PLACE_REQUIRES_DRAFT_ORIGIN",
            "false",
        );
        env::set_var("LICENSING__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.licensing.default_offset().unwrap().local_minus_utc(),
            2 * 3600
        );
        assert_eq!(config.order_workflow.placed_state, "completed");
        assert!(!config.order_workflow.activate_on_place_requires_draft_origin);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn database_section_is_validated_when_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LICENSING__DATABASE__URL", "mysql://localhost/licenses");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));
    }

    #[test]
    fn bad_offset_fails_validation() {
        let mut config = AppConfig::default();
        config.licensing.default_timezone = "CET".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidOffset(_))
        ));
    }
}
