//! Test utilities for adapters and the dashboard.
//!
//! [`StubTransport`] is a deterministic [`JsonTransport`] that answers from
//! canned JSON keyed by URL fragment, so adapter logic can be exercised
//! without network access. [`fixtures`] builds upstream payloads in the shape
//! each service returns.
//!
//! # Example
//!
//! ```
//! use mexico_travel::http::{ApiRequest, JsonTransport};
//! use mexico_travel::test_support::StubTransport;
//! use serde_json::json;
//!
//! let stub = StubTransport::new().with_json("/weather", json!({"name": "Tulum"}));
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let body = rt
//!     .block_on(stub.get_json(&ApiRequest::get("test", "https://x.test/weather?q=Tulum")))
//!     .unwrap();
//! assert_eq!(body["name"], "Tulum");
//! assert_eq!(stub.call_count("/weather"), 1);
//! ```

use crate::http::{ApiRequest, JsonTransport};
use crate::{Result, TravelError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum StubReply {
    Json(Value),
    Status(u16),
    Transport(String),
}

#[derive(Debug)]
struct Route {
    fragment: String,
    reply: StubReply,
    /// Answers left before the route stops matching; `None` is unlimited
    remaining: Option<AtomicUsize>,
}

impl Route {
    fn new(fragment: String, reply: StubReply) -> Self {
        Self {
            fragment,
            reply,
            remaining: None,
        }
    }

    fn claim(&self, url: &str) -> bool {
        if !url.contains(&self.fragment) {
            return false;
        }
        match &self.remaining {
            None => true,
            Some(remaining) => remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok(),
        }
    }
}

/// Stub `JsonTransport` for testing.
///
/// Routes are matched in registration order; the first route whose fragment
/// occurs in the request URL answers. Unmatched requests get HTTP 404.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: Vec<Route>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ApiRequest>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl StubTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer URLs containing `fragment` with `body`
    #[must_use]
    pub fn with_json(mut self, fragment: impl Into<String>, body: Value) -> Self {
        self.routes.push(Route::new(fragment.into(), StubReply::Json(body)));
        self
    }

    /// Answer URLs containing `fragment` with a non-2xx status
    #[must_use]
    pub fn with_status(mut self, fragment: impl Into<String>, status: u16) -> Self {
        self.routes.push(Route::new(fragment.into(), StubReply::Status(status)));
        self
    }

    /// Answer the first `times` URLs containing `fragment` with a non-2xx
    /// status; later requests fall through to the routes registered after it
    #[must_use]
    pub fn with_status_times(
        mut self,
        fragment: impl Into<String>,
        status: u16,
        times: usize,
    ) -> Self {
        let mut route = Route::new(fragment.into(), StubReply::Status(status));
        route.remaining = Some(AtomicUsize::new(times));
        self.routes.push(route);
        self
    }

    /// Fail URLs containing `fragment` as if the network were down
    #[must_use]
    pub fn with_transport_error(mut self, fragment: impl Into<String>) -> Self {
        self.routes.push(Route::new(
            fragment.into(),
            StubReply::Transport("connection refused".to_string()),
        ));
        self
    }

    /// Sleep before every answer
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request seen so far, in arrival order
    #[must_use]
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of requests whose URL contains `fragment`
    #[must_use]
    pub fn call_count(&self, fragment: &str) -> usize {
        self.calls()
            .iter()
            .filter(|request| request.url.contains(fragment))
            .count()
    }

    /// Highest number of requests that were being answered at the same time
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JsonTransport for StubTransport {
    async fn get_json(&self, request: &ApiRequest) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let route = self.routes.iter().find(|route| route.claim(&request.url));

        match route.map(|r| &r.reply) {
            Some(StubReply::Json(body)) => Ok(body.clone()),
            Some(StubReply::Status(status)) => Err(TravelError::status(
                request.service,
                *status,
                "stubbed status",
            )),
            Some(StubReply::Transport(message)) => Err(TravelError::transport(message.clone())),
            None => Err(TravelError::status(request.service, 404, "no stub route")),
        }
    }
}

/// Upstream payload builders
pub mod fixtures {
    use serde_json::{Value, json};

    /// OpenWeatherMap `/weather` body
    #[must_use]
    pub fn current_weather(name: &str, temp: f64, wind: f64) -> Value {
        json!({
            "name": name,
            "main": { "temp": temp, "humidity": 74 },
            "weather": [{
                "id": 803,
                "main": "Clouds",
                "description": "broken clouds",
                "icon": "04d"
            }],
            "wind": { "speed": wind, "deg": 120 }
        })
    }

    /// OpenWeatherMap `/forecast` body with `entries` three-hourly items
    /// starting at 2026-03-01T00:00:00Z. Temperature rises by one degree per day.
    #[must_use]
    pub fn forecast(entries: usize) -> Value {
        let start = 1_772_323_200_i64; // 2026-03-01T00:00:00Z
        let list: Vec<Value> = (0..entries)
            .map(|i| {
                json!({
                    "dt": start + (i as i64) * 3 * 3600,
                    "main": { "temp": 20.4 + (i / 8) as f64, "humidity": 70 },
                    "weather": [{
                        "main": if i % 2 == 0 { "Clear" } else { "Rain" },
                        "icon": format!("{:02}d", i % 10)
                    }]
                })
            })
            .collect();
        json!({ "cod": "200", "cnt": entries, "list": list })
    }

    /// OpenWeatherMap geocoding body
    #[must_use]
    pub fn geocoding(results: &[(&str, f64, f64)]) -> Value {
        Value::Array(
            results
                .iter()
                .map(|(name, lat, lon)| {
                    json!({ "name": name, "lat": lat, "lon": lon, "country": "MX" })
                })
                .collect(),
        )
    }

    /// Ticketmaster record with every optional field present
    #[must_use]
    pub fn event(id: &str, name: &str, date_time: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "url": format!("https://www.ticketmaster.com.mx/event/{id}"),
            "info": format!("{name} live"),
            "images": [{ "url": format!("https://s1.ticketm.net/{id}.jpg"), "width": 640 }],
            "dates": { "start": { "localDate": &date_time[..10], "dateTime": date_time } },
            "_embedded": { "venues": [{ "name": "Arena Cancún" }] }
        })
    }

    /// Ticketmaster search body
    #[must_use]
    pub fn events(records: Vec<Value>) -> Value {
        let total = records.len();
        json!({
            "_embedded": { "events": records },
            "page": { "size": 30, "totalElements": total }
        })
    }

    /// OpenTripMap radius body: one record per `(xid, dist)`
    #[must_use]
    pub fn places_radius(places: &[(&str, f64)]) -> Value {
        Value::Array(
            places
                .iter()
                .enumerate()
                .map(|(i, (xid, dist))| {
                    json!({
                        "xid": xid,
                        "name": format!("place {i}"),
                        "dist": dist,
                        "rate": 3,
                        "kinds": "interesting_places",
                        "point": { "lon": -86.85 + i as f64 * 0.01, "lat": 21.16 + i as f64 * 0.01 }
                    })
                })
                .collect(),
        )
    }

    /// OpenTripMap details body
    #[must_use]
    pub fn place_details(xid: &str, name: &str, kinds: &str) -> Value {
        json!({
            "xid": xid,
            "name": name,
            "kinds": kinds,
            "address": { "road": "Boulevard Kukulcán", "city": "Cancún" },
            "preview": { "source": format!("https://upload.wikimedia.org/{xid}.jpg") },
            "wikipedia": format!("https://en.wikipedia.org/wiki/{}", name.replace(' ', "_"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_matching_route_wins() {
        let stub = StubTransport::new()
            .with_status("/xid/bad", 500)
            .with_json("/xid/", json!({"name": "ok"}));

        let bad = stub
            .get_json(&ApiRequest::get("t", "https://x.test/xid/bad"))
            .await;
        assert!(matches!(bad, Err(TravelError::Status { status: 500, .. })));

        let good = stub
            .get_json(&ApiRequest::get("t", "https://x.test/xid/good"))
            .await
            .unwrap();
        assert_eq!(good["name"], "ok");
        assert_eq!(stub.call_count("/xid/"), 2);
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let stub = StubTransport::new();
        let result = stub.get_json(&ApiRequest::get("t", "https://x.test/none")).await;
        assert!(matches!(result, Err(TravelError::Status { status: 404, .. })));
    }

    #[test]
    fn test_forecast_fixture_shape() {
        let body = fixtures::forecast(40);
        assert_eq!(body["list"].as_array().map(Vec::len), Some(40));
    }

    #[tokio::test]
    async fn test_limited_route_falls_through() {
        let stub = StubTransport::new()
            .with_status_times("/weather?", 503, 1)
            .with_json("/weather?", json!({"name": "Tulum"}));
        let request = ApiRequest::get("t", "https://x.test/weather?q=Tulum");

        let first = stub.get_json(&request).await;
        assert!(matches!(first, Err(TravelError::Status { status: 503, .. })));
        assert_eq!(stub.get_json(&request).await.unwrap()["name"], "Tulum");
        assert_eq!(stub.get_json(&request).await.unwrap()["name"], "Tulum");
    }
}
