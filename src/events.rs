//! Events adapter for the Ticketmaster Discovery API
//!
//! Keyword search by destination name, restricted to one country. Records
//! that cannot be normalized are skipped individually; the adapter itself
//! never fails its caller.

use crate::config::{EventsConfig, TravelConfig};
use crate::http::{ApiRequest, JsonTransport, require_key};
use crate::models::{Event, EventStart};
use crate::{FetchOutcome, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "ticketmaster";

pub const FALLBACK_DESCRIPTION: &str = "Ingen beskrivelse tilgængelig";
pub const FALLBACK_VENUE: &str = "Placering ikke angivet";

pub struct EventsAdapter {
    transport: Arc<dyn JsonTransport>,
    config: EventsConfig,
    country_code: String,
}

impl EventsAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, config: &TravelConfig) -> Self {
        Self {
            transport,
            config: config.events.clone(),
            country_code: config.defaults.country_code.to_uppercase(),
        }
    }

    /// Upcoming events matching `destination_name`, earliest first.
    #[instrument(skip(self))]
    pub async fn fetch_events(&self, destination_name: &str) -> FetchOutcome<Vec<Event>> {
        let start_time = Instant::now();

        let body = match self.search(destination_name).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Event search for '{}' failed: {}", destination_name, e);
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let response: SearchResponse = match serde_json::from_value(body) {
            Ok(response) => response,
            Err(e) => {
                warn!("Unexpected event search payload for '{}': {}", destination_name, e);
                return FetchOutcome::Failed(format!("Malformed response: {e}"));
            }
        };

        let Some(records) = response.embedded.map(|embedded| embedded.events) else {
            info!("No events listed for '{}'", destination_name);
            return FetchOutcome::Empty;
        };

        let mut events: Vec<Event> = records.into_iter().filter_map(normalize_event).collect();
        events.sort_by_key(|event| event.start.sort_key());

        info!(
            "Found {} events for '{}' in {:.3}s",
            events.len(),
            destination_name,
            start_time.elapsed().as_secs_f64()
        );

        FetchOutcome::from_items(events)
    }

    async fn search(&self, keyword: &str) -> Result<Value> {
        let api_key = require_key("Events", &self.config.api_key)?;
        let url = format!(
            "{}/events.json?apikey={}&keyword={}&countryCode={}&size={}&locale=*&sort=date,asc",
            self.config.base_url,
            api_key,
            urlencoding::encode(keyword),
            self.country_code,
            self.config.page_size
        );

        self.transport.get_json(&ApiRequest::get(SERVICE, url)).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_start(start: &StartDto) -> Option<EventStart> {
    if let Some(date_time) = start.date_time.as_deref()
        && let Ok(parsed) = DateTime::parse_from_rfc3339(date_time)
    {
        return Some(EventStart::DateTime(parsed.with_timezone(&Utc)));
    }

    start
        .local_date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .map(EventStart::Date)
}

/// One Ticketmaster record to an [`Event`], or `None` when it lacks a start
/// date or does not have the expected shape.
fn normalize_event(record: Value) -> Option<Event> {
    let record: EventDto = match serde_json::from_value(record) {
        Ok(record) => record,
        Err(e) => {
            debug!("Skipping malformed event record: {}", e);
            return None;
        }
    };

    let Some(start) = record.dates.as_ref().and_then(|d| d.start.as_ref()).and_then(parse_start)
    else {
        debug!("Skipping event '{}' without a start date", record.id);
        return None;
    };

    let venue_label = record
        .embedded
        .and_then(|embedded| embedded.venues.into_iter().next())
        .and_then(|venue| non_blank(venue.name))
        .unwrap_or_else(|| FALLBACK_VENUE.to_string());

    Some(Event {
        id: record.id,
        title: record.name,
        description: non_blank(record.info)
            .or_else(|| non_blank(record.description))
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
        start,
        venue_label,
        image_url: record.images.into_iter().next().map(|image| image.url),
        detail_url: non_blank(record.url),
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<SearchEmbedded>,
}

#[derive(Debug, Deserialize)]
struct SearchEmbedded {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EventDto {
    id: String,
    name: String,
    url: Option<String>,
    info: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<ImageDto>,
    dates: Option<DatesDto>,
    #[serde(rename = "_embedded")]
    embedded: Option<EventEmbedded>,
}

#[derive(Debug, Deserialize)]
struct ImageDto {
    url: String,
}

#[derive(Debug, Deserialize)]
struct DatesDto {
    start: Option<StartDto>,
}

#[derive(Debug, Deserialize)]
struct StartDto {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    #[serde(rename = "localDate")]
    local_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventEmbedded {
    #[serde(default)]
    venues: Vec<VenueDto>,
}

#[derive(Debug, Deserialize)]
struct VenueDto {
    name: Option<String>,
}
