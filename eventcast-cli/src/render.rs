//! Plain-text views over store snapshots.

use eventcast_core::{
    Coordinates, Event,
    store::{ForecastState, InputState, forecast::TEMPERATURE_UNIT},
};

pub fn weather(state: &ForecastState, pin: Option<Coordinates>) -> String {
    if state.loading {
        return "Loading weather…".to_string();
    }
    if let Some(err) = &state.error {
        return format!("⚠️ {err}");
    }
    let Some(current) = &state.current_weather else {
        return "No weather data yet.".to_string();
    };

    let mut lines = vec![format!("📍 {}", current.location)];
    if let Some(pin) = pin {
        lines.push(format!("   {pin}"));
    }
    lines.push(format!(
        "{} {:.1}{TEMPERATURE_UNIT}  {}",
        current.icon, current.temperature, current.condition
    ));
    lines.push(format!(
        "💧 Humidity {}%   💨 Wind {:.1} km/h",
        current.humidity, current.wind_speed
    ));
    if let Some(warning) = &current.warning {
        lines.push(format!("⚠️ {warning}"));
    }

    if !state.forecast.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}-Day Forecast", state.forecast.len()));
        for day in &state.forecast {
            lines.push(format!(
                "{}  {}  {:.0}°/{:.0}°  {}",
                day.date.format("%a %-m/%-d"),
                day.icon,
                day.high,
                day.low,
                day.condition
            ));
        }
    }

    lines.join("\n")
}

pub fn event_header(event: &Event) -> String {
    let mut header = format!("🎫 {} — {} {} · {}", event.name, event.date, event.time, event.location);
    if let Some(description) = &event.description {
        header.push_str("\n   ");
        header.push_str(description);
    }
    header
}

pub fn events(events: &[Event], selected: Option<&str>) -> String {
    if events.is_empty() {
        return "No upcoming events.".to_string();
    }

    events
        .iter()
        .map(|e| {
            let marker = if selected == Some(e.id.as_str()) { "▶" } else { " " };
            format!("{marker} [{}] {} · {} {} · {}", e.id, e.name, e.date, e.time, e.location)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn form(state: &InputState) -> String {
    let location = if state.location.is_empty() { "—" } else { state.location.as_str() };
    let mut lines = vec![format!(
        "Location: {location}   Date: {}",
        state.date.format("%-m/%-d/%Y")
    )];
    for err in [&state.location_error, &state.date_error].into_iter().flatten() {
        lines.push(format!("⚠️ {err}"));
    }
    lines.join("\n")
}
