use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lng >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.4}°{ns}, {:.4}°{ew}", self.lat.abs(), self.lng.abs())
    }
}

/// A scheduled event from the events catalog. `date` is `YYYY-MM-DD`, `time` is `HH:MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Event {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Event,
}

/// Map-marker projection of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMarker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub coords: Coordinates,
    pub date: Option<NaiveDate>,
    /// Place name the user searched for or picked. Providers report it back
    /// as the snapshot location instead of their own naming.
    pub label: Option<String>,
}

/// Conditions for one place. Temperature in °C, humidity in %, wind in km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub condition: String,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: String,
    pub icon: String,
    pub humidity: u8,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    pub forecast: Vec<ForecastDay>,
}
