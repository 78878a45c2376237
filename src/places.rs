//! Points-of-interest adapter for OpenTripMap (through RapidAPI)
//!
//! Two stages: a radius search around the destination, then one details
//! request per place. Detail requests run concurrently with at most
//! `places.max_concurrent_details` in flight, and results keep the radius
//! search order (nearest first).

use crate::config::{PlacesConfig, TravelConfig};
use crate::http::{ApiRequest, JsonTransport, require_key};
use crate::models::poi::FALLBACK_ADDRESS;
use crate::models::{PointOfInterest, format_distance, translate_category};
use crate::{FetchOutcome, Result};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "opentripmap";

pub struct PlacesAdapter {
    transport: Arc<dyn JsonTransport>,
    config: PlacesConfig,
}

impl PlacesAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, config: &TravelConfig) -> Self {
        Self {
            transport,
            config: config.places.clone(),
        }
    }

    /// Named, categorized places around a coordinate.
    ///
    /// A failed radius search is [`FetchOutcome::Failed`]. A radius answer
    /// that is not a list is logged and treated as [`FetchOutcome::Empty`].
    /// Individual details failures only drop that place.
    #[instrument(skip(self))]
    pub async fn fetch_points_of_interest(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> FetchOutcome<Vec<PointOfInterest>> {
        let start_time = Instant::now();

        let body = match self.search_radius(latitude, longitude).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Radius search at ({:.4}, {:.4}) failed: {}", latitude, longitude, e);
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let records = match body {
            Value::Array(records) => records,
            other => {
                warn!("Radius search returned a non-list payload: {}", other);
                return FetchOutcome::Empty;
            }
        };

        let candidates: Vec<RadiusPlace> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(place) => Some(place),
                Err(e) => {
                    debug!("Skipping malformed radius record: {}", e);
                    None
                }
            })
            .collect();
        let candidate_count = candidates.len();

        let points: Vec<PointOfInterest> = stream::iter(candidates)
            .map(|place| self.enrich(place))
            .buffered(self.config.max_concurrent_details.max(1))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .filter(PointOfInterest::is_valid)
            .collect();

        info!(
            "Kept {} of {} places around ({:.4}, {:.4}) in {:.3}s",
            points.len(),
            candidate_count,
            latitude,
            longitude,
            start_time.elapsed().as_secs_f64()
        );

        FetchOutcome::from_items(points)
    }

    fn request(&self, url: String) -> Result<ApiRequest> {
        let api_key = require_key("Places", &self.config.api_key)?;
        Ok(ApiRequest::get(SERVICE, url)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", self.config.rapidapi_host.as_str()))
    }

    async fn search_radius(&self, latitude: f64, longitude: f64) -> Result<Value> {
        let request = self.request(format!(
            "{}/en/places/radius?radius={}&lon={}&lat={}&limit={}&rate={}&format=json",
            self.config.base_url,
            self.config.radius_m,
            longitude,
            latitude,
            self.config.limit,
            self.config.min_rate
        ))?;

        self.transport.get_json(&request).await
    }

    async fn details(&self, xid: &str) -> Result<PlaceDetails> {
        let request = self.request(format!(
            "{}/en/places/xid/{}",
            self.config.base_url,
            urlencoding::encode(xid)
        ))?;

        let body = self.transport.get_json(&request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Radius record plus details to a point of interest, or `None` when the
    /// details are unavailable or unnamed.
    async fn enrich(&self, place: RadiusPlace) -> Option<PointOfInterest> {
        let details = match self.details(&place.xid).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Details for place {} unavailable: {}", place.xid, e);
                return None;
            }
        };

        let name = details.name.clone().filter(|n| !n.trim().is_empty())?;

        Some(PointOfInterest {
            name,
            category_label: translate_category(details.kinds.as_deref().unwrap_or_default())
                .to_string(),
            address_label: details
                .address
                .as_ref()
                .and_then(|a| a.road.clone())
                .filter(|road| !road.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_ADDRESS.to_string()),
            distance_label: format_distance(place.dist),
            photo_url: details.preview.as_ref().and_then(|p| p.source.clone()),
            latitude: place.point.as_ref().map(|p| p.lat),
            longitude: place.point.as_ref().map(|p| p.lon),
            reference_url: details.reference_url(),
            id: place.xid,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RadiusPlace {
    xid: String,
    /// Meters from the search center
    #[serde(default)]
    dist: f64,
    point: Option<Point>,
}

#[derive(Debug, Deserialize)]
struct Point {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    name: Option<String>,
    kinds: Option<String>,
    address: Option<Address>,
    preview: Option<Preview>,
    /// Either a URL string or an object with a `link` field
    wikipedia: Option<Value>,
    wikipedia_extracts: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Address {
    road: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    source: Option<String>,
}

impl PlaceDetails {
    fn reference_url(&self) -> Option<String> {
        let present = |url: &&str| !url.trim().is_empty();

        let from_wikipedia = self.wikipedia.as_ref().and_then(|wikipedia| match wikipedia {
            Value::String(url) => Some(url.as_str()),
            other => other.get("link").and_then(Value::as_str),
        });

        from_wikipedia
            .filter(present)
            .or_else(|| {
                self.wikipedia_extracts
                    .as_ref()
                    .and_then(|extracts| extracts.get("url"))
                    .and_then(Value::as_str)
                    .filter(present)
            })
            .map(str::to_string)
    }
}
