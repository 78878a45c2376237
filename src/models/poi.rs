//! Point-of-interest model and its label helpers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Label used when the upstream category is missing or unknown
pub const FALLBACK_CATEGORY: &str = "Seværdighed";

/// Label used when the upstream record carries no road name
pub const FALLBACK_ADDRESS: &str = "Adresse ikke tilgængelig";

static CATEGORY_LABELS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("historic", "Historisk"),
        ("architecture", "Arkitektur"),
        ("cultural", "Kultur"),
        ("natural", "Natur"),
        ("religion", "Religion"),
        ("beaches", "Strand"),
        ("museums", "Museum"),
        ("urban_environment", "Bymiljø"),
        ("tourist_facilities", "Turistfaciliteter"),
        ("sport", "Sport"),
        ("amusements", "Underholdning"),
        ("pools", "Swimmingpool"),
        ("water", "Vand"),
        ("gardens_and_parks", "Parker og Haver"),
        ("monuments", "Monument"),
        ("other", "Andet"),
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointOfInterest {
    /// Upstream place identifier (OpenTripMap `xid`)
    pub id: String,
    pub name: String,
    pub category_label: String,
    pub address_label: String,
    pub distance_label: String,
    pub photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Wikipedia article, when the upstream record links one
    pub reference_url: Option<String>,
}

impl PointOfInterest {
    /// Entries without a name or category never reach the presentation layer
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.category_label.is_empty()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Map a comma-separated OpenTripMap `kinds` string to a display label.
///
/// Only the first token counts: `"historic,architecture"` is `"Historisk"`.
#[must_use]
pub fn translate_category(kinds: &str) -> &'static str {
    let key = kinds
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    CATEGORY_LABELS
        .get(key.as_str())
        .copied()
        .unwrap_or(FALLBACK_CATEGORY)
}

/// Human readable distance: whole meters below one kilometer, otherwise
/// kilometers with one decimal.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}
