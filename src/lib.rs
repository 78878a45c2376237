//! Mexico travel dashboard core
//!
//! Gathers weather, local events, travel advisories and nearby points of
//! interest for Mexican destinations and normalizes them for display on
//! dashboard cards and a map.

pub mod advisories;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod http;
pub mod logging;
pub mod models;
pub mod places;
pub mod resolver;
pub mod store;
pub mod test_support;
pub mod weather;

// Re-export core types for public API
pub use advisories::{AdvisoryProvider, StaticAdvisoryProvider};
pub use cache::{QueryCache, QueryPolicies, QueryPolicy};
pub use config::TravelConfig;
pub use dashboard::{AutoRefresh, Dashboard, DashboardSnapshot, WidgetState};
pub use error::{FetchOutcome, TravelError};
pub use events::EventsAdapter;
pub use http::{ApiRequest, JsonTransport, ReqwestTransport};
pub use models::{
    AdvisoryNotice, Destination, Event, EventStart, MapView, PointOfInterest, Severity,
    WeatherReport,
};
pub use places::PlacesAdapter;
pub use resolver::DestinationResolver;
pub use store::{SelectionState, SelectionStore};
pub use weather::WeatherAdapter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelError>;
