use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::{ForecastDay, WeatherReport, WeatherRequest, WeatherSnapshot},
    provider::{DateRequest, classify_date, fetch_json},
    store::forecast::weather_icon,
};

use super::WeatherProvider;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Number of daily entries requested for the outlook.
const OUTLOOK_DAYS: u64 = 5;

/// Keyless provider backed by the Open-Meteo forecast API.
#[derive(Debug, Clone, Default)]
pub struct OpenMeteoProvider {
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    weather_code: Vec<Option<u8>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: OmCurrent,
    daily: OmDaily,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        let mut query: Vec<(&str, String)> = vec![
            ("latitude", request.coords.lat.to_string()),
            ("longitude", request.coords.lng.to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code".to_string(),
            ),
            (
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min,\
                 relative_humidity_2m_mean,wind_speed_10m_max"
                    .to_string(),
            ),
            ("timezone", "auto".to_string()),
        ];

        match request.date {
            Some(start) => {
                let end = start
                    .checked_add_days(Days::new(OUTLOOK_DAYS - 1))
                    .ok_or_else(|| anyhow!("Requested date {start} is out of range"))?;
                query.push(("start_date", start.to_string()));
                query.push(("end_date", end.to_string()));
            }
            None => query.push(("forecast_days", OUTLOOK_DAYS.to_string())),
        }

        let parsed: OmResponse =
            fetch_json(self.http.get(FORECAST_URL).query(&query), "Open-Meteo").await?;

        into_report(parsed, request, Local::now().date_naive())
    }
}

fn into_report(parsed: OmResponse, request: &WeatherRequest, today: NaiveDate) -> Result<WeatherReport> {
    let daily = &parsed.daily;

    let forecast: Vec<ForecastDay> = daily
        .time
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let code = daily.weather_code.get(i).copied().flatten().unwrap_or(u8::MAX);
            let condition = weather_description(code).to_string();
            ForecastDay {
                date: *date,
                high: value_at(&daily.temperature_2m_max, i),
                low: value_at(&daily.temperature_2m_min, i),
                icon: weather_icon(&condition).to_string(),
                condition,
                humidity: percent(value_at(&daily.relative_humidity_2m_mean, i)),
                wind_speed: value_at(&daily.wind_speed_10m_max, i),
            }
        })
        .collect();

    let location = request.label.clone().unwrap_or_else(|| request.coords.to_string());

    let current = match classify_date(today, request.date) {
        DateRequest::Current => {
            let c = &parsed.current;
            let condition = weather_description(c.weather_code).to_string();
            WeatherSnapshot {
                location,
                icon: weather_icon(&condition).to_string(),
                condition,
                temperature: c.temperature_2m,
                humidity: percent(c.relative_humidity_2m),
                wind_speed: c.wind_speed_10m,
                warning: warning_for(c.weather_code).map(str::to_string),
            }
        }
        DateRequest::Day(day) => {
            let idx = daily
                .time
                .iter()
                .position(|d| *d == day)
                .ok_or_else(|| anyhow!("Open-Meteo response contained no data for {day}"))?;
            let entry = &forecast[idx];
            let code = daily.weather_code.get(idx).copied().flatten().unwrap_or(u8::MAX);
            WeatherSnapshot {
                location,
                condition: entry.condition.clone(),
                temperature: entry.high,
                humidity: entry.humidity,
                wind_speed: entry.wind_speed,
                icon: entry.icon.clone(),
                warning: warning_for(code).map(str::to_string),
            }
        }
    };

    Ok(WeatherReport { current, forecast })
}

fn value_at(values: &[Option<f64>], idx: usize) -> f64 {
    values.get(idx).copied().flatten().unwrap_or(0.0)
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Convert a WMO weather code to a human-readable description.
fn weather_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 => "Snow",
        77 => "Snow grains",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

fn warning_for(code: u8) -> Option<&'static str> {
    match code {
        65 | 67 | 82 => Some("Heavy rain expected."),
        75 | 86 => Some("Heavy snow expected."),
        95 | 96 | 99 => Some("Thunderstorms expected."),
        _ => None,
    }
}
