//! Destination model: a named city the dashboard can be pointed at

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A named geographic point of interest to the user (a city).
///
/// Equality and hashing only consider `id`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Destination {
    /// Lowercase, hyphen-separated slug
    pub id: String,
    /// Plain name used for keyword searches ("Cancun")
    pub name: String,
    /// Name shown to the user ("Cancún")
    pub display_name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Destination {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: display_name.into(),
            latitude,
            longitude,
        }
    }

    /// Build a destination whose id and display name derive from `name`
    #[must_use]
    pub fn from_name(name: &str, latitude: f64, longitude: f64) -> Self {
        Self::new(slugify(name), name, name, latitude, longitude)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Destination {}

impl Hash for Destination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Lowercase `name` and collapse every whitespace run into a single hyphen
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
