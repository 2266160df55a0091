//! Configuration management for the `TintWave` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TintwaveError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying the upstream provider credential
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Root configuration structure for the `TintWave` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TintwaveConfig {
    /// Weather provider configuration
    pub weather: WeatherConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Aggregation endpoint configuration
    pub server: ServerConfig,
    /// Lookup client configuration
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Weather provider configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider API key, usually supplied through `WEATHER_API_KEY`
    pub api_key: Option<String>,
    /// Base URL for the provider API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures (0 disables retrying)
    pub max_retries: u32,
}

/// Response cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window in seconds
    pub ttl_seconds: u32,
    /// Maximum number of cached responses
    pub max_entries: u32,
}

/// Aggregation endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub body_limit_bytes: u32,
}

/// Lookup client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of a running aggregation endpoint
    pub endpoint: String,
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_timeout() -> u32 {
    10
}

fn default_cache_ttl() -> u32 {
    900
}

fn default_cache_max_entries() -> u32 {
    1024
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_body_limit() -> u32 {
    16 * 1024
}

fn default_client_endpoint() -> String {
    "http://localhost:3000".to_string()
}

fn default_client_timeout() -> u32 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_client_endpoint(),
            timeout_seconds: default_client_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.into())
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl TintwaveConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TINTWAVE_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("TINTWAVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TintwaveConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if let Ok(api_key) = env::var(API_KEY_ENV) {
            config.weather.api_key = Some(api_key);
        }

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tintwave").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.max_entries == 0 {
            self.cache.max_entries = default_cache_max_entries();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.body_limit_bytes == 0 {
            self.server.body_limit_bytes = default_body_limit();
        }
        if self.client.endpoint.is_empty() {
            self.client.endpoint = default_client_endpoint();
        }
        if self.client.timeout_seconds == 0 {
            self.client.timeout_seconds = default_client_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings except the provider credential,
    /// which only the endpoint needs (see [`Self::validate_api_keys`]).
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the provider credential and return it
    pub fn validate_api_keys(&self) -> Result<&str> {
        let Some(api_key) = self.weather.api_key.as_deref() else {
            return Err(TintwaveError::config(format!(
                "{API_KEY_ENV} environment variable is not set"
            ))
            .into());
        };

        if api_key.trim().is_empty() {
            return Err(TintwaveError::config(format!("{API_KEY_ENV} cannot be empty")).into());
        }

        if api_key.len() > 100 {
            return Err(TintwaveError::config(
                "Weather API key appears to be invalid (too long). Please check your API key.",
            )
            .into());
        }

        Ok(api_key)
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 60 {
            return Err(TintwaveError::config("Weather API timeout cannot exceed 60 seconds").into());
        }

        if self.weather.max_retries > 5 {
            return Err(TintwaveError::config("Weather API max retries cannot exceed 5").into());
        }

        if self.cache.ttl_seconds > 86_400 {
            return Err(
                TintwaveError::config("Cache TTL cannot exceed 86400 seconds (1 day)").into(),
            );
        }

        if self.cache.max_entries > 100_000 {
            return Err(TintwaveError::config("Cache max entries cannot exceed 100000").into());
        }

        if self.server.body_limit_bytes > 1024 * 1024 {
            return Err(TintwaveError::config("Request body limit cannot exceed 1 MiB").into());
        }

        if self.client.timeout_seconds > 120 {
            return Err(TintwaveError::config("Client timeout cannot exceed 120 seconds").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TintwaveError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TintwaveError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !is_http_url(&self.weather.base_url) {
            return Err(TintwaveError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if !is_http_url(&self.client.endpoint) {
            return Err(
                TintwaveError::config("Client endpoint must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TintwaveConfig::default();
        assert_eq!(config.weather.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.weather.timeout_seconds, 10);
        assert_eq!(config.weather.max_retries, 0);
        assert_eq!(config.cache.ttl(), Duration::from_secs(900));
        assert_eq!(config.server.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = TintwaveConfig::default();
        let err = config.validate_api_keys().unwrap_err();
        assert!(err.to_string().contains("WEATHER_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let mut config = TintwaveConfig::default();
        config.weather.api_key = Some("   ".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_valid_api_key() {
        let mut config = TintwaveConfig::default();
        config.weather.api_key = Some("0123456789abcdef".to_string());
        assert_eq!(config.validate_api_keys().unwrap(), "0123456789abcdef");
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TintwaveConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TintwaveConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = TintwaveConfig::default();
        config.weather.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_zero_values() {
        let mut config = TintwaveConfig::default();
        config.cache.ttl_seconds = 0;
        config.weather.timeout_seconds = 0;
        config.apply_defaults();
        assert_eq!(config.cache.ttl_seconds, 900);
        assert_eq!(config.weather.timeout_seconds, 10);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 8080\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: TintwaveConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.ttl_seconds, 900);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TintwaveConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("tintwave"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
