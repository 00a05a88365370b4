use std::env;
use std::path::PathBuf;

use dotenv::dotenv;
use log::{info, warn};
use serde::Deserialize;

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub preferences: PreferencesConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    /// Static bearer credential
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    pub path: PathBuf,
}

/// Upper bound for the default analytics range, ten years
pub const MAX_RANGE_DAYS: u32 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Counter animation length; 0 disables animation
    pub animation_ms: u64,
    pub default_range_days: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_env_files();

        let environment = env::var("RUST_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .unwrap_or(Environment::Development);

        info!("Loading configuration for environment: {:?}", environment);

        let config = Self::from_lookup(environment, |key| env::var(key).ok())?;
        config.validate()?;
        config.log_configuration();

        Ok(config)
    }

    fn load_env_files() {
        // ENV_FILE_PATH replaces the .env lookup entirely
        if let Ok(env_file_path) = env::var("ENV_FILE_PATH") {
            if !env_file_path.is_empty() {
                info!("Loading environment from ENV_FILE_PATH: {}", env_file_path);
                dotenv::from_filename(&env_file_path).ok();
                return;
            }
        }

        dotenv().ok();
        let environment_hint = env::var("RUST_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .unwrap_or(Environment::Development);
        let env_file = format!(".env.{:?}", environment_hint).to_lowercase();
        if env_file != ".env.development" {
            let _ = dotenv::from_filename(&env_file);
        }
    }

    /// Builds the configuration from a variable lookup, applying the
    /// per-environment defaults
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u64 = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let default_range_days = match lookup("DASHBOARD_DEFAULT_RANGE_DAYS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ApiError::Config(format!("DASHBOARD_DEFAULT_RANGE_DAYS is not a valid day count: {}", raw))
            })?,
            None => 30,
        };

        let base_url = match (&environment, lookup("DASHBOARD_API_URL")) {
            (_, Some(url)) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            (Environment::Development, _) => {
                warn!("DASHBOARD_API_URL not found in environment, using default");
                "http://localhost:3000/api".to_string()
            }
            (Environment::Test, _) => "http://127.0.0.1:3000/api".to_string(),
            (Environment::Production, _) => {
                return Err(ApiError::Config(
                    "DASHBOARD_API_URL must be set in production".to_string(),
                ))
            }
        };

        let default_timeout = match environment {
            Environment::Production => 30,
            _ => 10,
        };

        Ok(Config {
            api: ApiConfig {
                base_url,
                token: lookup("DASHBOARD_API_TOKEN").filter(|t| !t.trim().is_empty()),
                timeout_seconds: parse_u64("DASHBOARD_REQUEST_TIMEOUT_SECS", default_timeout),
            },
            cache: CacheConfig {
                ttl_seconds: parse_u64("DASHBOARD_CACHE_TTL_SECS", 300),
            },
            preferences: PreferencesConfig {
                path: lookup("DASHBOARD_PREFERENCES_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".dashboard-preferences.json")),
            },
            display: DisplayConfig {
                animation_ms: parse_u64("DASHBOARD_ANIMATION_MS", 1000),
                default_range_days,
            },
            environment,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url)?;

        if self.is_production() {
            if url.scheme() != "https" {
                return Err(ApiError::Config("Production API URL must use https".to_string()));
            }
            if self.api.token.is_none() {
                return Err(ApiError::Config(
                    "DASHBOARD_API_TOKEN must be set in production".to_string(),
                ));
            }
        }

        if self.api.timeout_seconds == 0 {
            return Err(ApiError::Config("Request timeout cannot be 0".to_string()));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ApiError::Config("Cache TTL cannot be 0".to_string()));
        }

        if !(1..=MAX_RANGE_DAYS).contains(&self.display.default_range_days) {
            return Err(ApiError::Config(format!(
                "Default date range must be between 1 and {} days",
                MAX_RANGE_DAYS
            )));
        }

        Ok(())
    }

    fn log_configuration(&self) {
        info!("Configuration loaded successfully");
        info!("Environment: {:?}", self.environment);
        info!(
            "API: {} (timeout: {}s, token: {})",
            self.api.base_url,
            self.api.timeout_seconds,
            if self.api.token.is_some() { "set" } else { "not set" }
        );
        info!("Cache TTL: {}s", self.cache.ttl_seconds);
        info!("Preferences: {}", self.preferences.path.display());

        if self.is_development() {
            warn!("Running in development mode - requests may go to a local backend");
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert!("unknown".parse::<Environment>().is_err());
    }

    #[test]
    fn test_environment_default() {
        assert_eq!(Environment::default(), Environment::Development);
    }

    #[test]
    fn test_environment_case_insensitive() {
        assert_eq!("DEVELOPMENT".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("Prod".parse::<Environment>().unwrap(), Environment::Production);
    }
}
