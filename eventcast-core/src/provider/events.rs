use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use reqwest::Client;
use serde_json::Value;

use crate::{model::Event, provider::fetch_json};

use super::EventsApi;

/// Events catalog served as a JSON array over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEventsApi {
    url: String,
    http: Client,
}

impl HttpEventsApi {
    pub fn new(url: String) -> Self {
        Self { url, http: Client::new() }
    }
}

#[async_trait]
impl EventsApi for HttpEventsApi {
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        let body: Value = fetch_json(self.http.get(&self.url), "events API").await?;
        events_from_json(body)
    }
}

/// Anything that is not a JSON array is treated as an empty catalog.
fn events_from_json(body: Value) -> Result<Vec<Event>> {
    match body {
        Value::Array(_) => {
            let events: Vec<Event> =
                serde_json::from_value(body).context("Failed to decode events from events API")?;
            Ok(dedupe_by_id(events))
        }
        other => {
            tracing::debug!(kind = json_kind(&other), "events API returned a non-list body");
            Ok(Vec::new())
        }
    }
}

/// Keep the first event for each id; later copies are logged and dropped.
fn dedupe_by_id(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| {
            let first = seen.insert(event.id.clone());
            if !first {
                tracing::warn!(id = %event.id, name = %event.name, "dropping event with duplicate id");
            }
            first
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Built-in catalog used when no events URL is configured.
///
/// Dates are laid out relative to the day the catalog is fetched so the
/// seeded events always fall inside the forecast window.
#[derive(Debug, Clone, Default)]
pub struct SeededEventsApi {
    today: Option<NaiveDate>,
}

impl SeededEventsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the catalog to a fixed start day.
    pub fn starting_on(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    pub fn catalog(today: NaiveDate) -> Vec<Event> {
        SEED
            .iter()
            .enumerate()
            .map(|(idx, seed)| Event {
                id: (idx + 1).to_string(),
                name: seed.name.to_string(),
                date: today
                    .checked_add_days(Days::new(seed.days_ahead))
                    .unwrap_or(today)
                    .format("%Y-%m-%d")
                    .to_string(),
                time: seed.time.to_string(),
                location: seed.location.to_string(),
                lat: seed.lat,
                lng: seed.lng,
                description: seed.description.map(str::to_string),
            })
            .collect()
    }
}

#[async_trait]
impl EventsApi for SeededEventsApi {
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        Ok(Self::catalog(today))
    }
}

struct SeedEvent {
    name: &'static str,
    days_ahead: u64,
    time: &'static str,
    location: &'static str,
    lat: f64,
    lng: f64,
    description: Option<&'static str>,
}

const SEED: &[SeedEvent] = &[
    SeedEvent {
        name: "Global Music Festival",
        days_ahead: 1,
        time: "18:00",
        location: "Amsterdam, NL",
        lat: 52.3676,
        lng: 4.9041,
        description: Some("A celebration of world music."),
    },
    SeedEvent {
        name: "Tech Expo",
        days_ahead: 2,
        time: "09:00",
        location: "San Francisco, USA",
        lat: 37.7749,
        lng: -122.4194,
        description: Some("Latest in technology and innovation."),
    },
    SeedEvent {
        name: "Harbour Food Market",
        days_ahead: 3,
        time: "11:00",
        location: "Copenhagen, DK",
        lat: 55.6761,
        lng: 12.5683,
        description: Some("Street food stalls along the waterfront."),
    },
    SeedEvent {
        name: "City Marathon",
        days_ahead: 4,
        time: "07:30",
        location: "Berlin, DE",
        lat: 52.52,
        lng: 13.405,
        description: None,
    },
    SeedEvent {
        name: "Open Air Cinema",
        days_ahead: 5,
        time: "21:00",
        location: "Barcelona, ES",
        lat: 41.3874,
        lng: 2.1686,
        description: Some("Classic films under the stars."),
    },
    SeedEvent {
        name: "Lantern Festival",
        days_ahead: 6,
        time: "19:00",
        location: "Taipei, TW",
        lat: 25.033,
        lng: 121.5654,
        description: None,
    },
    SeedEvent {
        name: "Jazz on the River",
        days_ahead: 7,
        time: "20:00",
        location: "New Orleans, USA",
        lat: 29.9511,
        lng: -90.0715,
        description: Some("Live jazz aboard a paddle steamer."),
    },
    SeedEvent {
        name: "Design Week",
        days_ahead: 8,
        time: "10:00",
        location: "Milan, IT",
        lat: 45.4642,
        lng: 9.19,
        description: Some("Installations and showrooms across the city."),
    },
    SeedEvent {
        name: "Winter Lights",
        days_ahead: 9,
        time: "17:00",
        location: "Reykjavík, IS",
        lat: 64.1466,
        lng: -21.9426,
        description: None,
    },
    SeedEvent {
        name: "Cherry Blossom Walk",
        days_ahead: 10,
        time: "08:00",
        location: "Kyoto, JP",
        lat: 35.0116,
        lng: 135.7681,
        description: Some("Guided walk along the Philosopher's Path."),
    },
    SeedEvent {
        name: "Surf Open",
        days_ahead: 12,
        time: "06:00",
        location: "Sydney, AU",
        lat: -33.8688,
        lng: 151.2093,
        description: None,
    },
    SeedEvent {
        name: "Book Fair",
        days_ahead: 13,
        time: "10:00",
        location: "Frankfurt, DE",
        lat: 50.1109,
        lng: 8.6821,
        description: Some("The world's largest trade fair for books."),
    },
];
