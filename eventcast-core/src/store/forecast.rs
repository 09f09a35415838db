use std::sync::Arc;

use chrono::NaiveDate;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    model::{ForecastDay, WeatherRequest, WeatherSnapshot},
    provider::WeatherProvider,
};

use super::{MapStore, StateCell};

pub const WEATHER_ERROR: &str = "Failed to fetch weather data";
pub const TEMPERATURE_UNIT: &str = "°C";
pub const DEFAULT_WEATHER_ICON: &str = "⛅";

/// Checked in order; the first rule with a matching keyword wins.
const ICON_RULES: &[(&[&str], &str)] = &[
    (&["sun"], "☀️"),
    (&["cloud"], "☁️"),
    (&["rain"], "🌧️"),
    (&["storm"], "⛈️"),
    (&["snow"], "❄️"),
    (&["fog", "mist"], "🌫️"),
];

/// Pick an icon for a free-text condition by case-insensitive keyword match.
pub fn weather_icon(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();

    ICON_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| condition.contains(k)))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_WEATHER_ICON)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastState {
    pub current_weather: Option<WeatherSnapshot>,
    pub forecast: Vec<ForecastDay>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Weather for wherever the map pin currently is.
#[derive(Debug)]
pub struct ForecastStore {
    provider: Arc<dyn WeatherProvider>,
    map: Arc<MapStore>,
    state: StateCell<ForecastState>,
}

impl ForecastStore {
    pub fn new(provider: Arc<dyn WeatherProvider>, map: Arc<MapStore>) -> Self {
        Self { provider, map, state: StateCell::new(ForecastState::default()) }
    }

    /// Construct the store and launch one fetch for the map's current pin.
    pub fn spawn(provider: Arc<dyn WeatherProvider>, map: Arc<MapStore>) -> (Arc<Self>, JoinHandle<()>) {
        let store = Arc::new(Self::new(provider, map));
        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.fetch_weather_data(None, None).await }
        });
        (store, task)
    }

    /// Fetch weather for the pin as it is when the call starts. `label` names
    /// the place in the resulting snapshot; without one the provider decides.
    pub async fn fetch_weather_data(&self, label: Option<String>, date: Option<NaiveDate>) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let request = WeatherRequest { coords: self.map.location(), date, label };
        tracing::debug!(coords = %request.coords, ?date, label = ?request.label, "fetching weather");

        match self.provider.get_weather(&request).await {
            Ok(report) => {
                self.state.update(|s| {
                    s.current_weather = Some(report.current);
                    s.forecast = report.forecast;
                    s.loading = false;
                });
            }
            Err(err) => {
                tracing::error!(error = ?err, coords = %request.coords, "weather fetch failed");
                self.state.update(|s| {
                    s.error = Some(WEATHER_ERROR.to_string());
                    s.loading = false;
                });
            }
        }
    }

    pub fn snapshot(&self) -> ForecastState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ForecastState> {
        self.state.subscribe()
    }

    pub fn current_weather(&self) -> Option<WeatherSnapshot> {
        self.state.read(|s| s.current_weather.clone())
    }

    pub fn forecast(&self) -> Vec<ForecastDay> {
        self.state.read(|s| s.forecast.clone())
    }

    pub fn loading(&self) -> bool {
        self.state.read(|s| s.loading)
    }

    pub fn error(&self) -> Option<String> {
        self.state.read(|s| s.error.clone())
    }

    pub fn is_data_available(&self) -> bool {
        self.state.read(|s| s.current_weather.is_some() && !s.forecast.is_empty())
    }

    pub fn temperature_unit(&self) -> &'static str {
        TEMPERATURE_UNIT
    }

    pub fn weather_icon(&self, condition: &str) -> &'static str {
        weather_icon(condition)
    }

    pub fn clear_data(&self) {
        self.state.update(|s| {
            s.current_weather = None;
            s.forecast.clear();
            s.error = None;
        });
    }
}
