//! Domain models for the travel dashboard
//!
//! - Destination: the city being looked at
//! - Weather: current conditions and daily forecast
//! - Event, AdvisoryNotice, PointOfInterest: widget payloads
//! - MapView: what the map collaborator draws

pub mod advisory;
pub mod destination;
pub mod event;
pub mod map;
pub mod poi;
pub mod weather;

pub use advisory::{AdvisoryNotice, Severity};
pub use destination::{Destination, slugify};
pub use event::{Event, EventStart};
pub use map::{MapMarker, MapView, MarkerKind};
pub use poi::{PointOfInterest, format_distance, translate_category};
pub use weather::{ForecastDay, WeatherCondition, WeatherReport, WeatherSnapshot};
