//! Core library for the `eventcast` weather and events lookup.
//!
//! This crate defines:
//! - Input validation for the location/date search form
//! - Shared domain models (coordinates, events, weather)
//! - Abstractions over the events catalog, weather backends and geocoding
//! - Observable state stores and the context that coordinates them
//! - Configuration & credentials handling
//!
//! It is used by `eventcast-cli`, but the stores can back any front end that
//! re-renders from their snapshots or subscriptions.

pub mod app;
pub mod config;
pub mod model;
pub mod provider;
pub mod store;
pub mod validation;

pub use app::{AppContext, SearchOutcome, Services};
pub use config::{Config, ProviderConfig};
pub use model::{
    Coordinates, Event, EventMarker, ForecastDay, MarkerKind, WeatherReport, WeatherRequest,
    WeatherSnapshot,
};
pub use provider::{EventsApi, Geocoder, ProviderId, WeatherProvider};
pub use validation::{ValidationError, ValidationResult};
