//! Scripted collaborators for store and coordination tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Semaphore;

use crate::{
    model::{Coordinates, Event, ForecastDay, WeatherReport, WeatherRequest, WeatherSnapshot},
    provider::{EventsApi, Geocoder, WeatherProvider},
};

/// Holds a fake call open until the test releases it.
#[derive(Debug)]
pub(crate) struct Gate {
    entered: Semaphore,
    released: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self { entered: Semaphore::new(0), released: Semaphore::new(0) }
    }

    async fn pass(&self) {
        self.entered.add_permits(1);
        self.released.acquire().await.expect("gate semaphore open").forget();
    }

    /// Wait until one more call has reached the gate.
    pub(crate) async fn entered(&self) {
        self.entered.acquire().await.expect("gate semaphore open").forget();
    }

    /// Let one waiting (or future) call through.
    pub(crate) fn release(&self) {
        self.released.add_permits(1);
    }
}

type Reply<T> = std::result::Result<T, String>;

fn next_reply<T>(queue: &Mutex<VecDeque<Reply<T>>>) -> Option<Reply<T>> {
    queue.lock().expect("reply queue lock").pop_front()
}

#[derive(Debug)]
pub(crate) struct ScriptedEvents {
    replies: Mutex<VecDeque<Reply<Vec<Event>>>>,
    gate: Option<Gate>,
    calls: AtomicUsize,
}

impl ScriptedEvents {
    pub(crate) fn new(replies: Vec<Reply<Vec<Event>>>) -> Self {
        Self { replies: Mutex::new(replies.into()), gate: None, calls: AtomicUsize::new(0) }
    }

    pub(crate) fn gated(replies: Vec<Reply<Vec<Event>>>) -> Self {
        Self { gate: Some(Gate::new()), ..Self::new(replies) }
    }

    pub(crate) fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("constructed with ScriptedEvents::gated")
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventsApi for ScriptedEvents {
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        match next_reply(&self.replies) {
            Some(reply) => reply.map_err(|e| anyhow!(e)),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedWeather {
    replies: Mutex<VecDeque<Reply<WeatherReport>>>,
    requests: Mutex<Vec<WeatherRequest>>,
    gate: Option<Gate>,
}

impl ScriptedWeather {
    pub(crate) fn new(replies: Vec<Reply<WeatherReport>>) -> Self {
        Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()), gate: None }
    }

    pub(crate) fn gated(replies: Vec<Reply<WeatherReport>>) -> Self {
        Self { gate: Some(Gate::new()), ..Self::new(replies) }
    }

    pub(crate) fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("constructed with ScriptedWeather::gated")
    }

    pub(crate) fn requests(&self) -> Vec<WeatherRequest> {
        self.requests.lock().expect("request log lock").clone()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        self.requests.lock().expect("request log lock").push(request.clone());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        match next_reply(&self.replies) {
            Some(reply) => reply.map_err(|e| anyhow!(e)),
            None => {
                let place = request.label.clone().unwrap_or_else(|| request.coords.to_string());
                Ok(report_for(&place))
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeGeocoder {
    cities: HashMap<String, Coordinates>,
    label: Option<String>,
    failing: bool,
    queries: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_city(mut self, name: &str, coords: Coordinates) -> Self {
        self.cities.insert(name.to_string(), coords);
        self
    }

    pub(crate) fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub(crate) fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("query log lock").clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, city: &str) -> Result<Option<Coordinates>> {
        self.queries.lock().expect("query log lock").push(city.to_string());
        if self.failing {
            return Err(anyhow!("geocoder unavailable"));
        }
        Ok(self.cities.get(city).copied())
    }

    async fn reverse_geocode(&self, _lat: f64, _lng: f64) -> Result<Option<String>> {
        if self.failing {
            return Err(anyhow!("geocoder unavailable"));
        }
        Ok(self.label.clone())
    }
}

pub(crate) fn sample_events(count: usize) -> Vec<Event> {
    (1..=count)
        .map(|i| Event {
            id: format!("e{i}"),
            name: format!("Event {i}"),
            date: format!("2026-10-{:02}", 16 + i % 10),
            time: "18:00".to_string(),
            location: format!("City {i}"),
            lat: 40.0 + i as f64,
            lng: -3.0 - i as f64,
            description: None,
        })
        .collect()
}

pub(crate) fn report_for(location: &str) -> WeatherReport {
    WeatherReport {
        current: WeatherSnapshot {
            location: location.to_string(),
            condition: "Partly cloudy".to_string(),
            temperature: 18.0,
            humidity: 60,
            wind_speed: 12.0,
            icon: "☁️".to_string(),
            warning: None,
        },
        forecast: vec![ForecastDay {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date"),
            high: 20.0,
            low: 11.0,
            condition: "Sunny".to_string(),
            icon: "☀️".to_string(),
            humidity: 55,
            wind_speed: 9.0,
        }],
    }
}
