//! Weather models: current conditions and the daily forecast

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for a destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius, rounded to the nearest degree
    pub temperature_c: i32,
    /// Upstream condition group ("Clear", "Clouds", "Rain", ...)
    pub condition_code: String,
    /// Upstream icon id ("01d")
    pub icon_id: String,
    /// Location name as reported by the weather service
    pub location_label: String,
    /// Relative humidity in percent
    pub humidity_pct: u8,
    /// Wind speed in m/s, rounded to the nearest whole unit
    pub wind_speed_ms: i32,
}

/// One entry of the downsampled forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: DateTime<Utc>,
    pub temperature_c: i32,
    pub condition_code: String,
    pub icon_id: String,
}

/// Everything the weather adapter returns for one destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    /// At most five entries, one per day, ascending by date
    pub forecast: Vec<ForecastDay>,
}

/// Coarse condition class used to pick an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherCondition {
    /// Classify an upstream condition group. Unrecognized groups (mist,
    /// haze, dust, ...) render as clear.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "clouds" => WeatherCondition::Clouds,
            "rain" => WeatherCondition::Rain,
            "snow" => WeatherCondition::Snow,
            "thunderstorm" => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Clear,
        }
    }

    /// Danish display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Klart",
            WeatherCondition::Clouds => "Skyet",
            WeatherCondition::Rain => "Regn",
            WeatherCondition::Snow => "Sne",
            WeatherCondition::Thunderstorm => "Tordenvejr",
        }
    }
}

impl WeatherSnapshot {
    #[must_use]
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(&self.condition_code)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{}°C", self.temperature_c)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{} m/s", self.wind_speed_ms)
    }
}

impl ForecastDay {
    #[must_use]
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(&self.condition_code)
    }
}
