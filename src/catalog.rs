//! Known destinations offered before any search

use crate::models::Destination;
use std::sync::LazyLock;

static MEXICAN_DESTINATIONS: LazyLock<Vec<Destination>> = LazyLock::new(|| {
    vec![
        Destination::new("cancun", "Cancun", "Cancún", 21.1619, -86.8515),
        Destination::new("tulum", "Tulum", "Tulum", 20.2114, -87.4654),
        Destination::new("mexico-city", "Mexico City", "Mexico City", 19.4326, -99.1332),
        Destination::new("cabo", "Cabo San Lucas", "Cabo San Lucas", 22.8905, -109.9167),
        Destination::new(
            "puerto-vallarta",
            "Puerto Vallarta",
            "Puerto Vallarta",
            20.6534,
            -105.2253,
        ),
    ]
});

/// All catalog destinations, in display order
#[must_use]
pub fn destinations() -> &'static [Destination] {
    &MEXICAN_DESTINATIONS
}

/// The destination selected when the dashboard starts
#[must_use]
pub fn default_destination() -> &'static Destination {
    &MEXICAN_DESTINATIONS[0]
}

#[must_use]
pub fn find(id: &str) -> Option<&'static Destination> {
    MEXICAN_DESTINATIONS.iter().find(|d| d.id == id)
}
