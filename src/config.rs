//! Configuration management for the travel dashboard
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TravelError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// OpenWeatherMap (weather + geocoding)
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Ticketmaster Discovery (events)
    #[serde(default)]
    pub events: EventsConfig,
    /// OpenTripMap via RapidAPI (points of interest)
    #[serde(default)]
    pub places: PlacesConfig,
    /// Query cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default application settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Weather and geocoding API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for current conditions and forecast
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Base URL for direct geocoding
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
}

/// Events API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Ticketmaster API key
    pub api_key: Option<String>,
    #[serde(default = "default_events_base_url")]
    pub base_url: String,
    /// Maximum number of events requested per search
    #[serde(default = "default_events_page_size")]
    pub page_size: u32,
}

/// Points-of-interest API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// RapidAPI key for OpenTripMap
    pub api_key: Option<String>,
    #[serde(default = "default_places_base_url")]
    pub base_url: String,
    /// Value of the `X-RapidAPI-Host` header
    #[serde(default = "default_places_host")]
    pub rapidapi_host: String,
    /// Search radius in meters
    #[serde(default = "default_places_radius")]
    pub radius_m: u32,
    /// Maximum number of places returned by the radius search
    #[serde(default = "default_places_limit")]
    pub limit: u32,
    /// Minimum OpenTripMap interest rating
    #[serde(default = "default_places_min_rate")]
    pub min_rate: u8,
    /// Upper bound on concurrent detail requests
    #[serde(default = "default_places_concurrency")]
    pub max_concurrent_details: usize,
}

/// Query cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// First backoff delay between caller-level retries, doubled per attempt
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// ISO 3166-1 alpha-2 country every search is restricted to
    #[serde(default = "default_country_code")]
    pub country_code: String,
    /// Zoom level handed to the map collaborator
    #[serde(default = "default_map_zoom")]
    pub map_zoom: u8,
}

// Default value functions
fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("mexico-travel/{}", crate::VERSION)
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_events_base_url() -> String {
    "https://app.ticketmaster.com/discovery/v2".to_string()
}

fn default_events_page_size() -> u32 {
    30
}

fn default_places_base_url() -> String {
    "https://opentripmap-places-v1.p.rapidapi.com".to_string()
}

fn default_places_host() -> String {
    "opentripmap-places-v1.p.rapidapi.com".to_string()
}

fn default_places_radius() -> u32 {
    20_000
}

fn default_places_limit() -> u32 {
    50
}

fn default_places_min_rate() -> u8 {
    2
}

fn default_places_concurrency() -> usize {
    8
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_country_code() -> String {
    "MX".to_string()
}

fn default_map_zoom() -> u8 {
    12
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            geo_base_url: default_geo_base_url(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_events_base_url(),
            page_size: default_events_page_size(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_places_base_url(),
            rapidapi_host: default_places_host(),
            radius_m: default_places_radius(),
            limit: default_places_limit(),
            min_rate: default_places_min_rate(),
            max_concurrent_details: default_places_concurrency(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retry_base_delay_ms: default_retry_base_delay(),
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

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            map_zoom: default_map_zoom(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl CacheConfig {
    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl TravelConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

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

        // MEXICO_TRAVEL_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("MEXICO_TRAVEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TravelConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mexico-travel").join("config.toml"))
    }

    /// Apply default values to zeroed or blank fields
    pub fn apply_defaults(&mut self) {
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.geo_base_url.is_empty() {
            self.weather.geo_base_url = default_geo_base_url();
        }
        if self.events.base_url.is_empty() {
            self.events.base_url = default_events_base_url();
        }
        if self.events.page_size == 0 {
            self.events.page_size = default_events_page_size();
        }
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
        }
        if self.places.rapidapi_host.is_empty() {
            self.places.rapidapi_host = default_places_host();
        }
        if self.places.radius_m == 0 {
            self.places.radius_m = default_places_radius();
        }
        if self.places.limit == 0 {
            self.places.limit = default_places_limit();
        }
        if self.places.max_concurrent_details == 0 {
            self.places.max_concurrent_details = default_places_concurrency();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.country_code.is_empty() {
            self.defaults.country_code = default_country_code();
        }
        if self.defaults.map_zoom == 0 {
            self.defaults.map_zoom = default_map_zoom();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys. Keys are optional; a missing key only fails the
    /// requests that need it.
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Weather", &self.weather.api_key),
            ("Events", &self.events.api_key),
            ("Places", &self.places.api_key),
        ];

        for (service, key) in keys {
            if let Some(api_key) = key {
                if api_key.trim().is_empty() {
                    return Err(TravelError::config(format!(
                        "{service} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if api_key.len() < 8 {
                    return Err(TravelError::config(format!(
                        "{service} API key appears to be invalid (too short). Please check your API key."
                    ))
                    .into());
                }

                if api_key.len() > 100 {
                    return Err(TravelError::config(format!(
                        "{service} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(TravelError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.events.page_size > 200 {
            return Err(TravelError::config("Events page size cannot exceed 200").into());
        }

        if self.places.radius_m > 100_000 {
            return Err(TravelError::config("Places radius cannot exceed 100000 meters").into());
        }

        if self.places.limit > 500 {
            return Err(TravelError::config("Places limit cannot exceed 500").into());
        }

        if self.places.min_rate > 3 {
            return Err(TravelError::config("Places minimum rating must be between 0 and 3").into());
        }

        if self.places.max_concurrent_details > 64 {
            return Err(
                TravelError::config("Places detail concurrency cannot exceed 64").into(),
            );
        }

        if self.defaults.map_zoom > 19 {
            return Err(TravelError::config("Map zoom cannot exceed 19").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Weather", &self.weather.base_url),
            ("Geocoding", &self.weather.geo_base_url),
            ("Events", &self.events.base_url),
            ("Places", &self.places.base_url),
        ];
        for (service, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TravelError::config(format!(
                    "{service} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        let code = &self.defaults.country_code;
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TravelError::config(format!(
                "Invalid country code '{code}'. Must be an ISO 3166-1 alpha-2 code"
            ))
            .into());
        }

        Ok(())
    }
}
