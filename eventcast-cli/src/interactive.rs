use std::fmt;

use eventcast_core::{
    AppContext, Coordinates, Event, SearchOutcome,
    validation::{format_validation_error, parse_date},
};
use inquire::{CustomType, InquireError, Select, Text};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SearchCity,
    PickEvent,
    ReloadEvents,
    DropPin,
    ChangeDate,
    Clear,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::SearchCity,
        Action::PickEvent,
        Action::ReloadEvents,
        Action::DropPin,
        Action::ChangeDate,
        Action::Clear,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::SearchCity => "🔍 Search city",
            Action::PickEvent => "🎫 Pick an event",
            Action::ReloadEvents => "🔄 Reload events",
            Action::DropPin => "📌 Drop a pin",
            Action::ChangeDate => "📅 Change date",
            Action::Clear => "🧹 Clear",
            Action::Quit => "Quit",
        })
    }
}

struct EventChoice(Event);

impl fmt::Display for EventChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} · {} · {}", self.0.name, self.0.date, self.0.location)
    }
}

/// Menu loop. Escape or Ctrl-C at any prompt ends the session.
pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    println!("{}\n", render::weather(&ctx.forecast.snapshot(), Some(ctx.map.location())));

    loop {
        match step(ctx).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn step(ctx: &AppContext) -> Result<bool, InquireError> {
    println!("{}", render::form(&ctx.input.snapshot()));

    let action = Select::new("What next?", Action::ALL.to_vec()).prompt()?;
    match action {
        Action::SearchCity => {
            let city = Text::new("City:")
                .with_initial_value(&ctx.input.location())
                .prompt()?;
            ctx.input.set_location(city);

            match ctx.search().await {
                SearchOutcome::Invalid => return Ok(true),
                SearchOutcome::NotFound(query) => {
                    println!("No place found for '{query}'.\n");
                    return Ok(true);
                }
                SearchOutcome::Found(_) => {}
            }
        }
        Action::PickEvent => {
            let upcoming = ctx.events.upcoming_events();
            if upcoming.is_empty() {
                match ctx.events.error() {
                    Some(err) => println!("⚠️ {err}. Choose \"{}\" to try again.\n", Action::ReloadEvents),
                    None => println!("No upcoming events.\n"),
                }
                return Ok(true);
            }

            let choices = upcoming.into_iter().map(EventChoice).collect();
            let EventChoice(event) = Select::new("Event:", choices).prompt()?;
            ctx.choose_event(&event.id).await;
            println!("{}\n", render::event_header(&event));
        }
        Action::ReloadEvents => {
            if ctx.reload_events().await {
                let selected = ctx.map.selected_event_id();
                println!("{}\n", render::events(&ctx.events.upcoming_events(), selected.as_deref()));
            } else if let Some(err) = ctx.events.error() {
                println!("⚠️ {err}\n");
            }
            return Ok(true);
        }
        Action::DropPin => {
            let lat = CustomType::<f64>::new("Latitude:")
                .with_error_message("Enter a number, e.g. 52.37")
                .prompt()?;
            let lng = CustomType::<f64>::new("Longitude:")
                .with_error_message("Enter a number, e.g. 4.90")
                .prompt()?;

            let label = ctx.drop_pin(Coordinates::new(lat, lng)).await;
            println!("📌 {label}\n");
        }
        Action::ChangeDate => {
            let raw = Text::new("Date (YYYY-MM-DD):").prompt()?;
            match parse_date(&raw) {
                Ok(date) => {
                    ctx.input.set_date(date);
                    ctx.input.validate_date();
                }
                Err(err) => println!("{}", format_validation_error(&err)),
            }
            return Ok(true);
        }
        Action::Clear => {
            ctx.clear();
            return Ok(true);
        }
        Action::Quit => return Ok(false),
    }

    println!("{}\n", render::weather(&ctx.forecast.snapshot(), Some(ctx.map.location())));
    Ok(true)
}
