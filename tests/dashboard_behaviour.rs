//! Dashboard behaviour against stubbed upstream services

use async_trait::async_trait;
use mexico_travel::advisories::AdvisoryProvider;
use mexico_travel::models::MarkerKind;
use mexico_travel::test_support::{StubTransport, fixtures};
use mexico_travel::{AdvisoryNotice, Dashboard, SelectionStore, TravelConfig, WidgetState};
use serde_json::json;
use std::sync::Arc;

fn config() -> TravelConfig {
    let mut config = TravelConfig::default();
    config.weather.api_key = Some("owm-test-key".to_string());
    config.events.api_key = Some("tm-test-key".to_string());
    config.places.api_key = Some("rapid-test-key".to_string());
    config.cache.retry_base_delay_ms = 1;
    config
}

fn weather_routes(stub: StubTransport) -> StubTransport {
    stub.with_json("/weather?", fixtures::current_weather("Cancún", 29.4, 5.2))
        .with_json("/forecast?", fixtures::forecast(40))
}

fn places_routes(stub: StubTransport) -> StubTransport {
    stub.with_json(
        "/en/places/radius",
        fixtures::places_radius(&[
            ("N1", 420.0),
            ("N2", 1234.0),
            ("N3", 3050.0),
            ("N4", 8900.0),
            ("N5", 15_500.0),
        ]),
    )
    .with_json("/xid/N1", fixtures::place_details("N1", "Playa Delfines", "beaches"))
    .with_json("/xid/N2", fixtures::place_details("N2", "El Rey", "historic,architecture"))
    .with_transport_error("/xid/N3")
    .with_json("/xid/N4", fixtures::place_details("N4", "MUSA", "museums"))
    .with_json(
        "/xid/N5",
        fixtures::place_details("N5", "Parque de las Palapas", "gardens_and_parks"),
    )
}

fn full_stub() -> StubTransport {
    let stub = weather_routes(StubTransport::new()).with_json(
        "/events.json",
        fixtures::events(vec![
            fixtures::event("E2", "Festival del Mar", "2026-04-02T19:00:00Z"),
            fixtures::event("E1", "Jazz en la Playa", "2026-03-20T21:30:00Z"),
        ]),
    );
    places_routes(stub)
}

fn build(stub: StubTransport) -> (Dashboard, Arc<StubTransport>) {
    let stub = Arc::new(stub);
    let store = Arc::new(SelectionStore::default());
    (Dashboard::new(&config(), stub.clone(), store), stub)
}

#[tokio::test]
async fn test_full_dashboard_for_default_destination() {
    let (dashboard, _) = build(full_stub());

    let snapshot = dashboard.load().await;

    assert_eq!(snapshot.destination.id, "cancun");

    let report = snapshot.weather.ready().expect("weather should load");
    assert_eq!(report.current.temperature_c, 29);
    assert_eq!(report.forecast.len(), 5);

    let events = snapshot.events.ready().expect("events should load");
    assert_eq!(events[0].title, "Jazz en la Playa");
    assert_eq!(events[1].title, "Festival del Mar");

    let advisories = snapshot.advisories.ready().expect("advisories should load");
    assert_eq!(advisories.len(), 2);

    let points = snapshot.points_of_interest.ready().expect("places should load");
    assert_eq!(points.len(), 4);
    assert_eq!(points[1].category_label, "Historisk");

    assert_eq!(snapshot.map.zoom, 12);
    assert_eq!(snapshot.map.markers.len(), 5);
    assert_eq!(snapshot.map.markers[0].kind, MarkerKind::Destination);
    assert_eq!(snapshot.map.markers[0].label, "Cancún");
}

#[tokio::test]
async fn test_switching_back_uses_cached_results() {
    let (dashboard, stub) = build(full_stub());

    let first = dashboard.load().await;
    dashboard.select_destination("tulum").expect("tulum is in the catalog");
    let second = dashboard.load().await;
    dashboard.select_destination("cancun").expect("cancun is in the catalog");
    let third = dashboard.load().await;

    assert_eq!(second.destination.id, "tulum");
    assert_eq!(third.destination.id, "cancun");

    assert_eq!(stub.call_count("/events.json"), 2);
    assert_eq!(stub.call_count("/en/places/radius"), 2);
    assert_eq!(third.events, first.events);
    assert_eq!(third.points_of_interest, first.points_of_interest);
    assert_eq!(third.weather, first.weather);

    assert!(stub.calls().iter().any(|c| c.url.contains("keyword=Tulum")));
    assert!(stub.calls().iter().any(|c| c.url.contains("lat=20.2114")));
}

#[tokio::test]
async fn test_weather_failure_leaves_other_widgets_intact() {
    let stub = places_routes(
        StubTransport::new()
            .with_status("/weather?", 401)
            .with_json("/forecast?", fixtures::forecast(40))
            .with_json(
                "/events.json",
                fixtures::events(vec![fixtures::event("E1", "Jazz", "2026-03-20T21:30:00Z")]),
            ),
    );
    let (dashboard, _) = build(stub);

    let snapshot = dashboard.load().await;

    assert!(snapshot.weather.is_error());
    assert!(snapshot.events.is_ready());
    assert!(snapshot.advisories.is_ready());
    assert!(snapshot.points_of_interest.is_ready());
}

#[tokio::test]
async fn test_weather_retry_after_failure() {
    let (dashboard, _) = build(StubTransport::new().with_transport_error("openweathermap.org"));
    assert!(dashboard.load().await.weather.is_error());
    assert!(dashboard.reload_weather().await.is_error());

    let (dashboard, _) = build(weather_routes(StubTransport::new()));
    let reloaded = dashboard.reload_weather().await;
    assert!(reloaded.is_ready());
    assert!(dashboard.cache().contains("weather:Cancun").await);
}

#[tokio::test]
async fn test_transient_weather_failure_is_retried() {
    let stub = places_routes(weather_routes(
        StubTransport::new().with_status_times("/weather?", 503, 1),
    ))
    .with_json("/events.json", fixtures::events(vec![]));
    let (dashboard, stub) = build(stub);

    let snapshot = dashboard.load().await;

    assert!(snapshot.weather.is_ready());
    assert_eq!(stub.call_count("/weather?"), 2);
}

#[tokio::test]
async fn test_concurrent_loads_share_fetches() {
    let (dashboard, stub) = build(full_stub());

    let (first, second) = tokio::join!(dashboard.load(), dashboard.load());

    assert_eq!(first.weather, second.weather);
    assert_eq!(first.events, second.events);
    assert_eq!(first.points_of_interest, second.points_of_interest);
    assert_eq!(stub.call_count("/weather?"), 1);
    assert_eq!(stub.call_count("/events.json"), 1);
    assert_eq!(stub.call_count("/en/places/radius"), 1);
}

#[tokio::test]
async fn test_zero_events_renders_empty() {
    let stub = places_routes(weather_routes(StubTransport::new()))
        .with_json("/events.json", json!({"page": {"totalElements": 0}}));
    let (dashboard, stub) = build(stub);

    let snapshot = dashboard.load().await;

    assert_eq!(snapshot.events, WidgetState::Empty);
    assert_eq!(stub.call_count("/events.json"), 1);
}

#[tokio::test]
async fn test_failing_events_are_retried_then_empty() {
    let stub = places_routes(weather_routes(StubTransport::new())).with_status("/events.json", 503);
    let (dashboard, stub) = build(stub);

    let snapshot = dashboard.load().await;

    assert!(snapshot.events.is_empty());
    assert_eq!(stub.call_count("/events.json"), 3);
    assert!(snapshot.weather.is_ready());
}

#[tokio::test]
async fn test_non_list_places_response_renders_empty() {
    let stub = weather_routes(StubTransport::new())
        .with_json("/events.json", fixtures::events(vec![]))
        .with_json("/en/places/radius", json!({"message": "Too many requests"}));
    let (dashboard, _) = build(stub);

    let snapshot = dashboard.load().await;

    assert!(snapshot.points_of_interest.is_empty());
    assert_eq!(snapshot.map.markers.len(), 1);
}

#[tokio::test]
async fn test_search_switches_dashboard_to_result() {
    let geocoding = fixtures::geocoding(&[("Oaxaca", 17.0732, -96.7266)]);
    let stub = full_stub().with_json("/direct", geocoding);
    let (dashboard, stub) = build(stub);
    let mut selection = dashboard.store().subscribe();

    let found = dashboard.search_destination("Oaxaca").await;
    assert!(found.is_success());
    assert!(selection.has_changed().unwrap());
    assert_eq!(selection.borrow_and_update().selected.id, "oaxaca");

    let snapshot = dashboard.load().await;
    assert_eq!(snapshot.destination.id, "oaxaca");
    assert_eq!(snapshot.map.center, (17.0732, -96.7266));
    assert!(stub.calls().iter().any(|c| c.url.contains("/weather?q=Oaxaca,mx")));

    let ids: Vec<String> = dashboard.store().all_destinations().into_iter().map(|d| d.id).collect();
    assert_eq!(ids.last().map(String::as_str), Some("oaxaca"));
}

#[tokio::test]
async fn test_unknown_search_keeps_current_destination() {
    let stub = full_stub().with_json("/direct", json!([]));
    let (dashboard, _) = build(stub);

    assert!(dashboard.search_destination("Atlantis").await.is_empty());
    assert_eq!(dashboard.load().await.destination.id, "cancun");
}

struct NoAdvisories;

#[async_trait]
impl AdvisoryProvider for NoAdvisories {
    async fn fetch_advisories(&self) -> Vec<AdvisoryNotice> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_custom_advisory_provider() {
    let (dashboard, _) = build(full_stub());
    let dashboard = dashboard.with_advisory_provider(Arc::new(NoAdvisories));

    let snapshot = dashboard.load().await;
    assert!(snapshot.advisories.is_empty());
}

#[tokio::test]
async fn test_map_view_uses_cached_places() {
    let (dashboard, _) = build(full_stub());

    assert_eq!(dashboard.map_view().await.markers.len(), 1);
    dashboard.load().await;

    let map = dashboard.map_view().await;
    assert_eq!(map.markers.len(), 5);
    assert!(
        map.markers
            .iter()
            .skip(1)
            .all(|m| m.kind == MarkerKind::PointOfInterest && m.detail.is_some())
    );
}
