//! Weather adapter for OpenWeatherMap
//!
//! Fetches current conditions and the three-hourly forecast for a
//! destination name and normalizes them into a [`WeatherReport`]. Unlike the
//! other adapters this one propagates failures, so the caller can show an
//! error state with a retry action.

use crate::config::{TravelConfig, WeatherConfig};
use crate::http::{ApiRequest, JsonTransport, require_key};
use crate::models::{ForecastDay, WeatherReport, WeatherSnapshot};
use crate::{Result, TravelError};
use chrono::DateTime;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const SERVICE: &str = "openweathermap";

/// Three-hourly entries per day
pub const FORECAST_STRIDE: usize = 8;

/// Maximum number of forecast days kept
pub const FORECAST_DAYS: usize = 5;

pub struct WeatherAdapter {
    transport: Arc<dyn JsonTransport>,
    config: WeatherConfig,
    country_code: String,
}

impl WeatherAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, config: &TravelConfig) -> Self {
        Self {
            transport,
            config: config.weather.clone(),
            country_code: config.defaults.country_code.to_lowercase(),
        }
    }

    /// Current conditions plus up to five daily forecast entries.
    ///
    /// Both upstream requests run concurrently; either one failing fails the
    /// whole call.
    #[instrument(skip(self))]
    pub async fn fetch_weather(&self, location_name: &str) -> Result<WeatherReport> {
        let start_time = Instant::now();
        if location_name.trim().is_empty() {
            return Err(TravelError::validation("Location name is blank"));
        }
        let api_key = require_key("Weather", &self.config.api_key)?;

        let query = format!(
            "q={},{}&units=metric&appid={}",
            urlencoding::encode(location_name),
            self.country_code,
            api_key
        );
        let current_request =
            ApiRequest::get(SERVICE, format!("{}/weather?{}", self.config.base_url, query));
        let forecast_request =
            ApiRequest::get(SERVICE, format!("{}/forecast?{}", self.config.base_url, query));

        let (current, forecast) = tokio::try_join!(
            self.transport.get_json(&current_request),
            self.transport.get_json(&forecast_request)
        )?;

        let current: openweather::CurrentResponse =
            serde_json::from_value(current).map_err(|e| {
                warn!("Invalid current weather payload for '{}': {}", location_name, e);
                TravelError::parse(format!("Invalid current weather data: {e}"))
            })?;
        let forecast: openweather::ForecastResponse =
            serde_json::from_value(forecast).map_err(|e| {
                warn!("Invalid forecast payload for '{}': {}", location_name, e);
                TravelError::parse(format!("Invalid forecast data: {e}"))
            })?;

        let report = WeatherReport {
            current: current.into_snapshot()?,
            forecast: downsample_forecast(&forecast.list)?,
        };

        info!(
            "Retrieved weather for '{}' ({}°C, {} forecast days) in {:.3}s",
            location_name,
            report.current.temperature_c,
            report.forecast.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }
}

/// Every [`FORECAST_STRIDE`]th entry starting at index 0, at most
/// [`FORECAST_DAYS`] of them.
pub fn downsample<T>(series: &[T]) -> impl Iterator<Item = &T> {
    series.iter().step_by(FORECAST_STRIDE).take(FORECAST_DAYS)
}

fn downsample_forecast(entries: &[openweather::ForecastEntry]) -> Result<Vec<ForecastDay>> {
    downsample(entries)
        .map(openweather::ForecastEntry::to_forecast_day)
        .collect()
}

fn round(value: f64) -> i32 {
    value.round() as i32
}

/// OpenWeatherMap response structures
mod openweather {
    use super::{DateTime, ForecastDay, Result, TravelError, WeatherSnapshot, round};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        /// Condition group ("Clear", "Clouds", ...)
        pub main: String,
        pub icon: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentMain {
        pub temp: f64,
        pub humidity: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct Wind {
        pub speed: f64,
    }

    /// `/weather` body
    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub name: String,
        pub main: CurrentMain,
        pub weather: Vec<Condition>,
        pub wind: Wind,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastMain {
        pub temp: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastEntry {
        /// Unix timestamp, seconds
        pub dt: i64,
        pub main: ForecastMain,
        pub weather: Vec<Condition>,
    }

    /// `/forecast` body
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub list: Vec<ForecastEntry>,
    }

    fn first_condition(conditions: &[Condition]) -> Result<&Condition> {
        conditions
            .first()
            .ok_or_else(|| TravelError::parse("Weather entry has no conditions"))
    }

    impl CurrentResponse {
        pub fn into_snapshot(self) -> Result<WeatherSnapshot> {
            let condition = first_condition(&self.weather)?;
            Ok(WeatherSnapshot {
                temperature_c: round(self.main.temp),
                condition_code: condition.main.clone(),
                icon_id: condition.icon.clone(),
                location_label: self.name,
                humidity_pct: self.main.humidity,
                wind_speed_ms: round(self.wind.speed),
            })
        }
    }

    impl ForecastEntry {
        pub fn to_forecast_day(&self) -> Result<ForecastDay> {
            let condition = first_condition(&self.weather)?;
            let date = DateTime::from_timestamp(self.dt, 0).ok_or_else(|| {
                TravelError::parse(format!("Invalid forecast timestamp {}", self.dt))
            })?;
            Ok(ForecastDay {
                date,
                temperature_c: round(self.main.temp),
                condition_code: condition.main.clone(),
                icon_id: condition.icon.clone(),
            })
        }
    }
}
