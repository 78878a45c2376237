//! Dashboard: the composition root
//!
//! Owns the selection store, the query cache and one instance of every
//! adapter. [`Dashboard::load`] runs the four widget queries concurrently
//! for the selected destination and turns each result into a
//! [`WidgetState`].

use crate::advisories::{AdvisoryProvider, StaticAdvisoryProvider};
use crate::cache::{QueryCache, QueryPolicies, keys};
use crate::config::TravelConfig;
use crate::events::EventsAdapter;
use crate::http::JsonTransport;
use crate::models::{AdvisoryNotice, Destination, Event, MapView, PointOfInterest, WeatherReport};
use crate::places::PlacesAdapter;
use crate::resolver::DestinationResolver;
use crate::store::SelectionStore;
use crate::weather::WeatherAdapter;
use crate::{FetchOutcome, Result, TravelError};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

/// What a widget renders
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState<T> {
    Ready(T),
    /// Nothing to show ("no results found")
    Empty,
    /// User-facing message; only the weather widget ends up here
    Error(String),
}

impl<T> WidgetState<T> {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, WidgetState::Ready(_))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, WidgetState::Empty)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, WidgetState::Error(_))
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            WidgetState::Ready(value) => Some(value),
            WidgetState::Empty | WidgetState::Error(_) => None,
        }
    }
}

impl<T> WidgetState<Vec<T>> {
    /// An empty list renders as [`WidgetState::Empty`]
    #[must_use]
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            WidgetState::Empty
        } else {
            WidgetState::Ready(items)
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub destination: Destination,
    pub weather: WidgetState<WeatherReport>,
    pub events: WidgetState<Vec<Event>>,
    pub advisories: WidgetState<Vec<AdvisoryNotice>>,
    pub points_of_interest: WidgetState<Vec<PointOfInterest>>,
    pub map: MapView,
}

/// Background refresh tasks; dropping the handle stops them.
#[derive(Debug)]
pub struct AutoRefresh {
    tasks: Vec<JoinHandle<()>>,
}

impl AutoRefresh {
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every task now
    pub fn stop(self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

type Fetch<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

#[derive(Clone)]
pub struct Dashboard {
    store: Arc<SelectionStore>,
    cache: QueryCache,
    policies: QueryPolicies,
    resolver: Arc<DestinationResolver>,
    weather: Arc<WeatherAdapter>,
    events: Arc<EventsAdapter>,
    places: Arc<PlacesAdapter>,
    advisories: Arc<dyn AdvisoryProvider>,
    map_zoom: u8,
}

impl Dashboard {
    #[must_use]
    pub fn new(
        config: &TravelConfig,
        transport: Arc<dyn JsonTransport>,
        store: Arc<SelectionStore>,
    ) -> Self {
        Self {
            store,
            cache: QueryCache::from_config(&config.cache),
            policies: QueryPolicies::default(),
            resolver: Arc::new(DestinationResolver::new(transport.clone(), config)),
            weather: Arc::new(WeatherAdapter::new(transport.clone(), config)),
            events: Arc::new(EventsAdapter::new(transport.clone(), config)),
            places: Arc::new(PlacesAdapter::new(transport, config)),
            advisories: Arc::new(StaticAdvisoryProvider::default()),
            map_zoom: config.defaults.map_zoom,
        }
    }

    #[must_use]
    pub fn with_advisory_provider(mut self, provider: Arc<dyn AdvisoryProvider>) -> Self {
        self.advisories = provider;
        self
    }

    #[must_use]
    pub fn with_policies(mut self, policies: QueryPolicies) -> Self {
        self.policies = policies;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SelectionStore> {
        &self.store
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Snapshot for the currently selected destination
    #[instrument(skip(self))]
    pub async fn load(&self) -> DashboardSnapshot {
        let start_time = Instant::now();
        let destination = self.store.selected();

        let (weather, events, advisories, points_of_interest) = tokio::join!(
            self.weather_state(&destination),
            self.events_state(&destination),
            self.advisories_state(),
            self.places_state(&destination),
        );

        let map = MapView::new(
            &destination,
            points_of_interest.ready().map(Vec::as_slice).unwrap_or_default(),
            self.map_zoom,
        );

        info!(
            "Dashboard for '{}' loaded in {:.3}s",
            destination.id,
            start_time.elapsed().as_secs_f64()
        );

        DashboardSnapshot {
            destination,
            weather,
            events,
            advisories,
            points_of_interest,
            map,
        }
    }

    /// Map for the selected destination, using whatever places are cached
    pub async fn map_view(&self) -> MapView {
        let destination = self.store.selected();
        let points: Vec<PointOfInterest> = self
            .cache
            .peek(&keys::places(destination.latitude, destination.longitude))
            .await
            .unwrap_or_default();

        MapView::new(&destination, &points, self.map_zoom)
    }

    /// Refetch weather for the selected destination, bypassing the cache.
    /// This is the retry action of the weather widget's error state.
    pub async fn reload_weather(&self) -> WidgetState<WeatherReport> {
        let destination = self.store.selected();
        let result = self
            .cache
            .refresh(
                &keys::weather(&destination.name),
                &self.policies.weather,
                &self.weather_fetch(&destination),
            )
            .await;

        weather_widget(&destination, result)
    }

    /// Resolve a free-text query; on success the destination is remembered
    /// and selected.
    pub async fn search_destination(&self, query: &str) -> FetchOutcome<Destination> {
        let outcome = self.resolver.resolve(query).await;
        if let FetchOutcome::Success(destination) = &outcome {
            self.store.add_custom(destination.clone());
            self.store.select(destination.clone());
        }
        outcome
    }

    /// Select a catalog or custom destination by id
    pub fn select_destination(&self, id: &str) -> Option<Destination> {
        let destination = self
            .store
            .all_destinations()
            .into_iter()
            .find(|d| d.id == id)?;
        self.store.select(destination.clone());
        Some(destination)
    }

    /// Start periodic refreshes for every query that has a refetch interval.
    /// Each tick works on the destination selected at that moment.
    pub fn spawn_auto_refresh(&self) -> AutoRefresh {
        let mut tasks = Vec::new();

        if let Some(period) = self.policies.weather.refetch_interval {
            let dashboard = self.clone();
            tasks.push(spawn_every(period, move || {
                let dashboard = dashboard.clone();
                async move {
                    dashboard.reload_weather().await;
                }
            }));
        }

        if let Some(period) = self.policies.events.refetch_interval {
            let dashboard = self.clone();
            tasks.push(spawn_every(period, move || {
                let dashboard = dashboard.clone();
                async move {
                    let destination = dashboard.store.selected();
                    let key = keys::events(&destination.name);
                    let fetch = dashboard.events_fetch(&destination);
                    let policy = &dashboard.policies.events;
                    if let Err(e) = dashboard.cache.refresh(&key, policy, &fetch).await {
                        warn!("Scheduled refresh of '{}' failed: {}", key, e);
                    }
                }
            }));
        }

        if let Some(period) = self.policies.advisories.refetch_interval {
            let dashboard = self.clone();
            tasks.push(spawn_every(period, move || {
                let dashboard = dashboard.clone();
                async move {
                    let fetch = dashboard.advisories_fetch();
                    if let Err(e) = dashboard
                        .cache
                        .refresh(keys::ADVISORIES, &dashboard.policies.advisories, &fetch)
                        .await
                    {
                        warn!("Scheduled refresh of advisories failed: {}", e);
                    }
                }
            }));
        }

        if let Some(period) = self.policies.places.refetch_interval {
            let dashboard = self.clone();
            tasks.push(spawn_every(period, move || {
                let dashboard = dashboard.clone();
                async move {
                    let destination = dashboard.store.selected();
                    let key = keys::places(destination.latitude, destination.longitude);
                    let fetch = dashboard.places_fetch(&destination);
                    let policy = &dashboard.policies.places;
                    if let Err(e) = dashboard.cache.refresh(&key, policy, &fetch).await {
                        warn!("Scheduled refresh of '{}' failed: {}", key, e);
                    }
                }
            }));
        }

        info!("Started {} auto-refresh tasks", tasks.len());
        AutoRefresh { tasks }
    }

    async fn weather_state(&self, destination: &Destination) -> WidgetState<WeatherReport> {
        let result = self
            .cache
            .query(
                &keys::weather(&destination.name),
                &self.policies.weather,
                self.weather_fetch(destination),
            )
            .await;

        weather_widget(destination, result)
    }

    async fn events_state(&self, destination: &Destination) -> WidgetState<Vec<Event>> {
        let key = keys::events(&destination.name);
        let result = self
            .cache
            .query(&key, &self.policies.events, self.events_fetch(destination))
            .await;

        list_widget(&key, result)
    }

    async fn advisories_state(&self) -> WidgetState<Vec<AdvisoryNotice>> {
        let result = self
            .cache
            .query(keys::ADVISORIES, &self.policies.advisories, self.advisories_fetch())
            .await;

        list_widget(keys::ADVISORIES, result)
    }

    async fn places_state(&self, destination: &Destination) -> WidgetState<Vec<PointOfInterest>> {
        let key = keys::places(destination.latitude, destination.longitude);
        let result = self
            .cache
            .query(&key, &self.policies.places, self.places_fetch(destination))
            .await;

        list_widget(&key, result)
    }

    fn weather_fetch(&self, destination: &Destination) -> Fetch<WeatherReport> {
        let adapter = self.weather.clone();
        let name = destination.name.clone();
        Box::new(move || {
            let adapter = adapter.clone();
            let name = name.clone();
            async move { adapter.fetch_weather(&name).await }.boxed()
        })
    }

    fn events_fetch(&self, destination: &Destination) -> Fetch<Vec<Event>> {
        let adapter = self.events.clone();
        let name = destination.name.clone();
        Box::new(move || {
            let adapter = adapter.clone();
            let name = name.clone();
            async move { adapter.fetch_events(&name).await.into_result() }.boxed()
        })
    }

    fn advisories_fetch(&self) -> Fetch<Vec<AdvisoryNotice>> {
        let provider = self.advisories.clone();
        Box::new(move || {
            let provider = provider.clone();
            async move { Ok::<_, TravelError>(provider.fetch_advisories().await) }.boxed()
        })
    }

    fn places_fetch(&self, destination: &Destination) -> Fetch<Vec<PointOfInterest>> {
        let adapter = self.places.clone();
        let (latitude, longitude) = (destination.latitude, destination.longitude);
        Box::new(move || {
            let adapter = adapter.clone();
            async move {
                adapter
                    .fetch_points_of_interest(latitude, longitude)
                    .await
                    .into_result()
            }
            .boxed()
        })
    }
}

fn weather_widget(
    destination: &Destination,
    result: Result<WeatherReport>,
) -> WidgetState<WeatherReport> {
    match result {
        Ok(report) => WidgetState::Ready(report),
        Err(e) => {
            error!("Weather for '{}' unavailable: {}", destination.name, e);
            WidgetState::Error(e.user_message())
        }
    }
}

/// Optional widgets degrade to empty on failure
fn list_widget<T>(key: &str, result: Result<Vec<T>>) -> WidgetState<Vec<T>> {
    match result {
        Ok(items) => WidgetState::from_items(items),
        Err(e) => {
            warn!("Showing no results for '{}': {}", key, e);
            WidgetState::Empty
        }
    }
}

fn spawn_every<F, Fut>(period: Duration, tick: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tick().await;
        }
    })
}
