//! Configuration management for `AirSight`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AirSightError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `AirSight`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AirSightConfig {
    /// Geocoding service settings
    pub geocoding: GeocodingConfig,
    /// Air quality service settings
    pub air_quality: AirQualityConfig,
    /// Form defaults and validation rules
    pub form: FormConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Search endpoint URL
    pub base_url: String,
    /// Sent with every request; the public Nominatim instance rejects anonymous clients
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Air quality service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityConfig {
    /// Air quality endpoint URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Form defaults and validation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Country used when the form leaves it blank
    pub default_country: String,
    /// Reject anything but letters, spaces, accents, hyphens, apostrophes and periods
    pub strict_characters: bool,
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
fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    format!("AirSight/{}", crate::VERSION)
}

fn default_air_quality_base_url() -> String {
    "https://air-quality-api.open-meteo.com/v1/air-quality".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_country() -> String {
    "Brasil".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            base_url: default_air_quality_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl AirQualityConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_country: default_country(),
            strict_characters: true,
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

impl AirSightConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AIRSIGHT_GEOCODING__TIMEOUT_SECONDS=5 overrides geocoding.timeout_seconds
        builder = builder.add_source(
            Environment::with_prefix("AIRSIGHT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AirSightConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("airsight").join("config.toml"))
    }

    /// Fill in blanks left by an explicitly empty file or environment value
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.air_quality.base_url.is_empty() {
            self.air_quality.base_url = default_air_quality_base_url();
        }
        if self.form.default_country.trim().is_empty() {
            self.form.default_country = default_country();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_timeouts()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<()> {
        for (name, seconds) in [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Air quality", self.air_quality.timeout_seconds),
        ] {
            if seconds == 0 {
                return Err(
                    AirSightError::config(format!("{name} timeout must be at least 1 second"))
                        .into(),
                );
            }
            if seconds > 120 {
                return Err(AirSightError::config(format!(
                    "{name} timeout cannot exceed 120 seconds"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AirSightError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AirSightError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Air quality", &self.air_quality.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AirSightError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.form.default_country.trim().chars().count() < 2 {
            return Err(
                AirSightError::config("Default country must be at least 2 characters").into(),
            );
        }

        Ok(())
    }
}
