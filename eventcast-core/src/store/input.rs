use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::sync::watch;

use crate::validation;

use super::StateCell;

/// The search form: raw location text, chosen date and per-field errors.
///
/// Errors are only set by an explicit `validate_*` call and are cleared as
/// soon as the matching raw field changes.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    pub location: String,
    pub date: NaiveDateTime,
    pub location_error: Option<String>,
    pub date_error: Option<String>,
}

#[derive(Debug)]
pub struct InputStore {
    state: StateCell<InputState>,
    now: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Default for InputStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InputStore {
    pub fn new() -> Self {
        Self::with_clock(local_now)
    }

    /// Use `now` for "today" and for the date a cleared form resets to.
    pub fn with_clock(now: fn() -> NaiveDateTime) -> Self {
        Self {
            state: StateCell::new(InputState {
                location: String::new(),
                date: now(),
                location_error: None,
                date_error: None,
            }),
            now,
        }
    }

    pub fn snapshot(&self) -> InputState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<InputState> {
        self.state.subscribe()
    }

    pub fn location(&self) -> String {
        self.state.read(|s| s.location.clone())
    }

    pub fn date(&self) -> NaiveDateTime {
        self.state.read(|s| s.date)
    }

    pub fn location_error(&self) -> Option<String> {
        self.state.read(|s| s.location_error.clone())
    }

    pub fn date_error(&self) -> Option<String> {
        self.state.read(|s| s.date_error.clone())
    }

    pub fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        self.state.update(|s| {
            s.location = location;
            s.location_error = None;
        });
    }

    pub fn set_date(&self, date: NaiveDateTime) {
        self.state.update(|s| {
            s.date = date;
            s.date_error = None;
        });
    }

    pub fn validate_location(&self) -> bool {
        let result = validation::validate_location(&self.location());
        self.state.update(|s| s.location_error = result.err().map(|e| e.to_string()));
        result.is_ok()
    }

    pub fn validate_date(&self) -> bool {
        let result = validation::validate_date_on(self.date(), self.today());
        self.state.update(|s| s.date_error = result.err().map(|e| e.to_string()));
        result.is_ok()
    }

    /// Validate both fields, attaching a failure to the field that caused it.
    pub fn validate_all(&self) -> bool {
        let InputState { location, date, .. } = self.snapshot();
        let result = validation::validate_inputs_on(&location, date, self.today());

        self.state.update(|s| match &result {
            Ok(()) => {
                s.location_error = None;
                s.date_error = None;
            }
            Err(err) if err.is_location_error() => s.location_error = Some(err.to_string()),
            Err(err) => s.date_error = Some(err.to_string()),
        });

        result.is_ok()
    }

    pub fn clear_inputs(&self) {
        let now = (self.now)();
        self.state.update(|s| {
            s.location.clear();
            s.date = now;
            s.location_error = None;
            s.date_error = None;
        });
    }

    pub fn is_location_valid(&self) -> bool {
        self.state.read(|s| validation::validate_location(&s.location).is_ok())
    }

    pub fn is_date_valid(&self) -> bool {
        validation::validate_date_on(self.date(), self.today()).is_ok()
    }

    pub fn is_form_valid(&self) -> bool {
        self.is_location_valid() && self.is_date_valid()
    }

    pub fn is_date_in_future(&self) -> bool {
        self.date().date() >= self.today()
    }

    pub fn formatted_date(&self) -> String {
        self.date().format("%-m/%-d/%Y").to_string()
    }

    fn today(&self) -> NaiveDate {
        (self.now)().date()
    }
}
