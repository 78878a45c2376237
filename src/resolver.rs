//! Destination resolution
//!
//! Turns a free-text city query into a [`Destination`] through the
//! OpenWeatherMap direct geocoding endpoint, restricted to one country.

use crate::config::{TravelConfig, WeatherConfig};
use crate::http::{ApiRequest, JsonTransport, require_key};
use crate::models::{Destination, slugify};
use crate::{FetchOutcome, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "openweathermap-geo";

/// Geocoding result from the OpenWeatherMap API
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeocodingResult {
    /// Location name
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// ISO 3166 country code
    pub country: Option<String>,
}

impl GeocodingResult {
    /// Whether the result lies in `country_code`; results without a country
    /// are accepted.
    #[must_use]
    pub fn is_in_country(&self, country_code: &str) -> bool {
        self.country
            .as_deref()
            .is_none_or(|country| country.eq_ignore_ascii_case(country_code))
    }
}

impl From<GeocodingResult> for Destination {
    fn from(geocoding: GeocodingResult) -> Self {
        Destination::new(
            slugify(&geocoding.name),
            geocoding.name.clone(),
            geocoding.name,
            geocoding.lat,
            geocoding.lon,
        )
    }
}

/// Service for resolving free-text destination queries
pub struct DestinationResolver {
    transport: Arc<dyn JsonTransport>,
    config: WeatherConfig,
    country_code: String,
}

impl DestinationResolver {
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, config: &TravelConfig) -> Self {
        Self {
            transport,
            config: config.weather.clone(),
            country_code: config.defaults.country_code.to_lowercase(),
        }
    }

    /// Resolve `query` to the best matching destination.
    ///
    /// Never returns an error: an empty answer is [`FetchOutcome::Empty`],
    /// transport or payload problems are logged and become
    /// [`FetchOutcome::Failed`]. No retries.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> FetchOutcome<Destination> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring blank destination query");
            return FetchOutcome::Empty;
        }

        match self.geocode(query).await {
            Ok(results) => match results
                .into_iter()
                .find(|result| result.is_in_country(&self.country_code))
            {
                Some(result) => {
                    info!(
                        "Resolved '{}' to {} ({:.4}, {:.4})",
                        query, result.name, result.lat, result.lon
                    );
                    FetchOutcome::Success(result.into())
                }
                None => {
                    warn!("No results found for destination '{}'", query);
                    FetchOutcome::Empty
                }
            },
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", query, e);
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// `resolve` collapsed to an option
    pub async fn resolve_or_none(&self, query: &str) -> Option<Destination> {
        self.resolve(query).await.into_option()
    }

    async fn geocode(&self, query: &str) -> Result<Vec<GeocodingResult>> {
        let api_key = require_key("Weather", &self.config.api_key)?;
        let url = format!(
            "{}/direct?q={},{}&limit=1&appid={}",
            self.config.geo_base_url,
            urlencoding::encode(query),
            self.country_code,
            api_key
        );

        let body = self.transport.get_json(&ApiRequest::get(SERVICE, url)).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubTransport, fixtures};
    use serde_json::json;

    fn config() -> TravelConfig {
        let mut config = TravelConfig::default();
        config.weather.api_key = Some("owm-test-key".to_string());
        config
    }

    fn make_resolver(stub: StubTransport) -> (DestinationResolver, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        (DestinationResolver::new(stub.clone(), &config()), stub)
    }

    #[tokio::test]
    async fn test_resolve_derives_slug_id() {
        let (resolver, stub) = make_resolver(
            StubTransport::new().with_json(
                "/direct",
                fixtures::geocoding(&[("San Miguel de Allende", 20.914, -100.745)]),
            ),
        );

        let destination = resolver.resolve("san miguel").await;

        let FetchOutcome::Success(destination) = destination else {
            panic!("expected a destination, got {destination:?}");
        };
        assert_eq!(destination.id, "san-miguel-de-allende");
        assert_eq!(destination.display_name, "San Miguel de Allende");
        assert_eq!(destination.latitude, 20.914);

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].url.contains("q=san%20miguel,mx&limit=1&appid=owm-test-key"));
    }

    #[tokio::test]
    async fn test_empty_result_is_empty() {
        let (resolver, _) = make_resolver(StubTransport::new().with_json("/direct", json!([])));
        assert!(resolver.resolve("Atlantis").await.is_empty());
        assert!(resolver.resolve_or_none("Atlantis").await.is_none());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let (resolver, _) = make_resolver(StubTransport::new().with_transport_error("/direct"));
        assert!(resolver.resolve("Oaxaca").await.is_failed());

        let (resolver, _) = make_resolver(
            StubTransport::new()
                .with_json("/direct", json!({"cod": 401, "message": "Invalid API key"})),
        );
        assert!(resolver.resolve("Oaxaca").await.is_failed());
    }

    #[tokio::test]
    async fn test_result_outside_country_is_empty() {
        let (resolver, _) = make_resolver(StubTransport::new().with_json(
            "/direct",
            json!([{"name": "Merida", "lat": 38.9161, "lon": -6.3437, "country": "ES"}]),
        ));
        assert!(resolver.resolve("Merida").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        let (resolver, stub) = make_resolver(StubTransport::new());
        assert!(resolver.resolve("   ").await.is_empty());
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let stub = Arc::new(StubTransport::new());
        let resolver = DestinationResolver::new(stub.clone(), &TravelConfig::default());
        assert!(resolver.resolve("Oaxaca").await.is_failed());
        assert!(stub.calls().is_empty());
    }
}
