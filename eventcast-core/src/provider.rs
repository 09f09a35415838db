use crate::{
    Config, Coordinates, Event, WeatherReport, WeatherRequest,
    provider::{openmeteo::OpenMeteoProvider, weatherapi::WeatherApiProvider},
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc};

pub mod events;
pub mod nominatim;
pub mod openmeteo;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::WeatherApi]
    }

    /// Whether the provider refuses to work without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::WeatherApi)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: openmeteo, weatherapi."
            )),
        }
    }
}

/// Weather backend: current conditions plus a short daily outlook for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> anyhow::Result<WeatherReport>;
}

/// Source of the events catalog. No paging or filtering.
#[async_trait]
pub trait EventsApi: Send + Sync + Debug {
    async fn fetch_events(&self) -> anyhow::Result<Vec<Event>>;
}

/// Forward and reverse geocoding. `Ok(None)` means the service had no answer.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, city: &str) -> anyhow::Result<Option<Coordinates>>;

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> anyhow::Result<Option<String>>;
}

/// Construct a weather provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider: Arc<dyn WeatherProvider> = match id {
        ProviderId::OpenMeteo => Arc::new(OpenMeteoProvider::new()),
        ProviderId::WeatherApi => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: run `eventcast configure {id}` and enter your API key."
                )
            })?;
            Arc::new(WeatherApiProvider::new(api_key.to_owned()))
        }
    };

    Ok(provider)
}

/// Construct the default weather provider from config, using the `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Which slice of weather a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateRequest {
    Current,
    Day(NaiveDate),
}

pub(crate) fn classify_date(today: NaiveDate, date: Option<NaiveDate>) -> DateRequest {
    match date {
        Some(day) if day != today => DateRequest::Day(day),
        _ => DateRequest::Current,
    }
}

/// Send a request and decode a JSON body, failing on non-2xx statuses.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: &str,
) -> anyhow::Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {service}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {service} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{service} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {service} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
