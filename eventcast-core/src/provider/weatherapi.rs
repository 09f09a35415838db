use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::{ForecastDay, WeatherReport, WeatherRequest, WeatherSnapshot},
    provider::{DateRequest, classify_date, fetch_json},
    store::forecast::weather_icon,
};

use super::WeatherProvider;

const FORECAST_URL: &str = "http://api.weatherapi.com/v1/forecast.json";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avghumidity: f64,
    maxwind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaAlert {
    headline: String,
}

#[derive(Debug, Default, Deserialize)]
struct WaAlerts {
    #[serde(default)]
    alert: Vec<WaAlert>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
    #[serde(default)]
    alerts: WaAlerts,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        let q = format!("{},{}", request.coords.lat, request.coords.lng);

        let mut query: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("q", q),
            ("days", "5".to_string()),
            ("alerts", "yes".to_string()),
        ];
        if let Some(day) = request.date {
            query.push(("dt", day.to_string()));
        }

        let parsed: WaResponse =
            fetch_json(self.http.get(FORECAST_URL).query(&query), "WeatherAPI.com").await?;

        into_report(parsed, request, Local::now().date_naive())
    }
}

fn into_report(parsed: WaResponse, request: &WeatherRequest, today: NaiveDate) -> Result<WeatherReport> {
    let location_name = request
        .label
        .clone()
        .unwrap_or_else(|| format!("{}, {}", parsed.location.name, parsed.location.country));
    let warning = parsed.alerts.alert.first().map(|a| a.headline.clone());

    let forecast: Vec<ForecastDay> = parsed
        .forecast
        .forecastday
        .iter()
        .map(|fd| ForecastDay {
            date: fd.date,
            high: fd.day.maxtemp_c,
            low: fd.day.mintemp_c,
            condition: fd.day.condition.text.clone(),
            icon: weather_icon(&fd.day.condition.text).to_string(),
            humidity: fd.day.avghumidity.round().clamp(0.0, 100.0) as u8,
            wind_speed: fd.day.maxwind_kph,
        })
        .collect();

    let current = match classify_date(today, request.date) {
        DateRequest::Current => WeatherSnapshot {
            location: location_name,
            condition: parsed.current.condition.text.clone(),
            icon: weather_icon(&parsed.current.condition.text).to_string(),
            temperature: parsed.current.temp_c,
            humidity: parsed.current.humidity,
            wind_speed: parsed.current.wind_kph,
            warning,
        },
        DateRequest::Day(day) => {
            let entry = forecast.iter().find(|f| f.date == day).ok_or_else(|| {
                anyhow::anyhow!("WeatherAPI response contained no forecastday data for {day}")
            })?;
            WeatherSnapshot {
                location: location_name,
                condition: entry.condition.clone(),
                icon: entry.icon.clone(),
                temperature: entry.high,
                humidity: entry.humidity,
                wind_speed: entry.wind_speed,
                warning,
            }
        }
    };

    Ok(WeatherReport { current, forecast })
}
