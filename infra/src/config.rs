//! Configuration loading for the infrastructure layer.

use config::{Config, ConfigError, Environment};

use mp_shared::config::AppConfig;

/// Load the application configuration.
///
/// Layering, later sources winning: built-in defaults enriched by the plain
/// environment variables the individual configs read (`DATABASE_URL`,
/// `MAIL_API_KEY`, ...), then any `MAILPROOF__`-prefixed variables
/// (`MAILPROOF__RATE_LIMIT__MAX_RESENDS_PER_WINDOW=5`). A `.env` file is
/// honored when present.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();

    Config::builder()
        .add_source(Config::try_from(&AppConfig::from_env())?)
        .add_source(Environment::with_prefix("MAILPROOF").separator("__"))
        .build()?
        .try_deserialize()
}
