use axum_helpers::JwtConfig;
use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_parse, server::ServerConfig};
use std::time::Duration;

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// Deadline for a single store call
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout: domain_events::DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl FromEnv for StoreConfig {
    /// Reads `STORE_TIMEOUT_MS` (default 5000)
    fn from_env() -> Result<Self, ConfigError> {
        let millis: u64 = env_parse("STORE_TIMEOUT_MS", 5000)?;
        if millis == 0 {
            return Err(ConfigError::ParseError {
                key: "STORE_TIMEOUT_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            timeout: Duration::from_millis(millis),
        })
    }
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();

        Ok(Self {
            app: app_info!(),
            mongodb: MongoConfig::from_env()?,
            server: ServerConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            store: StoreConfig::from_env()?,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_timeout_default_and_override() {
        temp_env::with_var_unset("STORE_TIMEOUT_MS", || {
            let store = StoreConfig::from_env().unwrap();
            assert_eq!(store.timeout, Duration::from_millis(5000));
        });

        temp_env::with_var("STORE_TIMEOUT_MS", Some("250"), || {
            let store = StoreConfig::from_env().unwrap();
            assert_eq!(store.timeout, Duration::from_millis(250));
        });
    }

    #[test]
    fn test_store_timeout_rejects_zero_and_garbage() {
        temp_env::with_var("STORE_TIMEOUT_MS", Some("0"), || {
            assert!(StoreConfig::from_env().is_err());
        });

        temp_env::with_var("STORE_TIMEOUT_MS", Some("soon"), || {
            assert!(StoreConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", None::<&str>),
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("scheduler_test")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some("a-very-long-secret-for-config-tests!!")),
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("scheduler_test")),
                ("PORT", Some("9090")),
                ("STORE_TIMEOUT_MS", Some("1500")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.mongodb.database(), "scheduler_test");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.store.timeout, Duration::from_millis(1500));
            },
        );
    }
}
