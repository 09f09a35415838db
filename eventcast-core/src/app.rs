//! Application context: owns one instance of every store and wires the
//! cross-store rules between them.
//!
//! User actions land here. Each one mutates the input or map store, runs a
//! lookup through a collaborator and writes the result back. Callers must
//! not assume atomicity across an `.await`: another action may have moved
//! the pin by the time a lookup resolves.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveTime;
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    model::Coordinates,
    provider::{
        self, EventsApi, Geocoder, WeatherProvider,
        events::{HttpEventsApi, SeededEventsApi},
        nominatim::NominatimGeocoder,
    },
    store::{EventsStore, ForecastStore, InputStore, MapStore},
    validation,
};

/// Label used when a dropped pin has no known place name.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The form failed validation; the error is on the input store.
    Invalid,
    /// The geocoder had no match. Coordinates are unchanged.
    NotFound(String),
    Found(Coordinates),
}

/// External collaborators the context is built from.
#[derive(Debug, Clone)]
pub struct Services {
    pub events: Arc<dyn EventsApi>,
    pub weather: Arc<dyn WeatherProvider>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let events: Arc<dyn EventsApi> = match &config.events.url {
            Some(url) => Arc::new(HttpEventsApi::new(url.clone())),
            None => Arc::new(SeededEventsApi::new()),
        };
        let geocoder = NominatimGeocoder::new(
            config.geocoding.base_url.clone(),
            &config.geocoding.user_agent,
        )?;

        Ok(Self {
            events,
            weather: provider::default_provider_from_config(config)?,
            geocoder: Arc::new(geocoder),
        })
    }
}

#[derive(Debug)]
pub struct AppContext {
    pub input: Arc<InputStore>,
    pub events: Arc<EventsStore>,
    pub map: Arc<MapStore>,
    pub forecast: Arc<ForecastStore>,
    geocoder: Arc<dyn Geocoder>,
    startup: Vec<JoinHandle<()>>,
}

impl AppContext {
    /// Build every store and launch the start-up fetches (events catalog and
    /// weather for the initial pin). Must run inside a tokio runtime.
    pub fn start(services: Services, initial: Coordinates) -> Self {
        let (events, events_task) = EventsStore::spawn(services.events);
        let map = Arc::new(MapStore::new(Arc::clone(&events), initial));
        let (forecast, forecast_task) = ForecastStore::spawn(services.weather, Arc::clone(&map));

        Self {
            input: Arc::new(InputStore::new()),
            events,
            map,
            forecast,
            geocoder: services.geocoder,
            startup: vec![events_task, forecast_task],
        }
    }

    /// Build from already constructed stores. Nothing is fetched.
    pub fn from_parts(
        input: Arc<InputStore>,
        events: Arc<EventsStore>,
        map: Arc<MapStore>,
        forecast: Arc<ForecastStore>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self { input, events, map, forecast, geocoder, startup: Vec::new() }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::start(Services::from_config(config)?, config.default_location()))
    }

    /// Wait for the start-up fetches launched by [`AppContext::start`].
    pub async fn wait_for_startup(&mut self) {
        for task in self.startup.drain(..) {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "start-up fetch task failed");
            }
        }
    }

    /// Search for the city typed into the form.
    pub async fn search(&self) -> SearchOutcome {
        if !self.input.validate_all() {
            return SearchOutcome::Invalid;
        }

        let query = validation::sanitize_location(&self.input.location());
        let coords = match self.geocoder.geocode(&query).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = ?err, %query, "geocoding failed");
                None
            }
        };

        let Some(coords) = coords else {
            tracing::debug!(%query, "no geocoding match");
            return SearchOutcome::NotFound(query);
        };

        self.map.set_location(coords);
        self.forecast
            .fetch_weather_data(Some(query), Some(self.input.date().date()))
            .await;

        SearchOutcome::Found(coords)
    }

    /// Drop a pin on the map. Returns the label written into the form.
    pub async fn drop_pin(&self, coords: Coordinates) -> String {
        self.map.set_location(coords);

        let place = match self.geocoder.reverse_geocode(coords.lat, coords.lng).await {
            Ok(place) => place,
            Err(err) => {
                tracing::warn!(error = ?err, %coords, "reverse geocoding failed");
                None
            }
        };
        let label = place.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        self.input.set_location(label.clone());

        // An unnamed pin keeps the provider's own naming (coordinates for Open-Meteo).
        let date = self.input.is_date_valid().then(|| self.input.date().date());
        self.forecast.fetch_weather_data(place, date).await;

        label
    }

    /// Pick an event from the catalog. Returns `false` for an unknown id.
    pub async fn choose_event(&self, event_id: &str) -> bool {
        let Some(event) = self.events.find(event_id) else {
            tracing::debug!(event_id, "unknown event");
            return false;
        };

        self.map.select_event(event.id.clone(), event.coordinates());
        self.input.set_location(event.location.clone());

        let day = event.day();
        match day {
            Some(day) => self.input.set_date(day.and_time(NaiveTime::MIN)),
            None => tracing::warn!(event_id, date = %event.date, "event has an unparseable date"),
        }

        self.forecast.fetch_weather_data(Some(event.location), day).await;
        true
    }

    /// Fetch the events catalog again, e.g. after a failed start-up load.
    /// Returns whether the catalog loaded.
    pub async fn reload_events(&self) -> bool {
        self.events.fetch_events().await;
        self.events.error().is_none()
    }

    /// Reset the form, the selected event and the weather panel.
    pub fn clear(&self) {
        self.input.clear_inputs();
        self.map.clear_selected_event();
        self.forecast.clear_data();
    }
}
