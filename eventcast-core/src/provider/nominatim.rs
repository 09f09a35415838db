use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{model::Coordinates, provider::fetch_json};

use super::Geocoder;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Geocoder backed by an OpenStreetMap Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    /// Nominatim rejects anonymous clients, so a User-Agent is mandatory.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client for Nominatim")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NmPlace {
    lat: String,
    lon: String,
}

#[derive(Debug, Default, Deserialize)]
struct NmAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmReverse {
    #[serde(default)]
    address: Option<NmAddress>,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, city: &str) -> Result<Option<Coordinates>> {
        let url = format!("{}/search", self.base_url);
        let places: Vec<NmPlace> = fetch_json(
            self.http
                .get(url)
                .query(&[("format", "json"), ("q", city), ("limit", "1")]),
            "Nominatim search",
        )
        .await?;

        places.first().map(place_coordinates).transpose()
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let reply: NmReverse = fetch_json(
            self.http.get(url).query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
            ]),
            "Nominatim reverse",
        )
        .await?;

        Ok(reply.address.and_then(place_label))
    }
}

fn place_coordinates(place: &NmPlace) -> Result<Coordinates> {
    let lat = place
        .lat
        .parse::<f64>()
        .with_context(|| format!("Nominatim returned a malformed latitude: {}", place.lat))?;
    let lng = place
        .lon
        .parse::<f64>()
        .with_context(|| format!("Nominatim returned a malformed longitude: {}", place.lon))?;

    Ok(Coordinates::new(lat, lng))
}

/// City if known, else town, else village.
fn place_label(address: NmAddress) -> Option<String> {
    address.city.or(address.town).or(address.village)
}
