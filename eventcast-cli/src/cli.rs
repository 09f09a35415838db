use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use eventcast_core::{
    AppContext, Config, Coordinates, ProviderId, SearchOutcome,
    validation::{self, format_validation_error},
};
use inquire::{Confirm, Password, PasswordDisplayMode};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "eventcast", version, about = "Weather for places and events")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific weather provider.
    Configure {
        /// Provider short name, e.g. "openmeteo" or "weatherapi".
        provider: String,
    },

    /// Show weather for a city.
    Show {
        /// City or place name.
        location: String,

        /// Forecast day (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// List upcoming events.
    Events,

    /// Show weather at an event.
    Event {
        /// Event id as listed by `eventcast events`.
        id: String,
    },

    /// Show weather at a coordinate.
    Pin {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,

        /// Forecast day (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Search, pick events and drop pins from a menu.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { location, date } => {
                let ctx = start().await?;
                ctx.input.set_location(location);
                if let Some(date) = date {
                    ctx.input.set_date(validation::parse_date(&date)?);
                }

                match ctx.search().await {
                    SearchOutcome::Invalid => {
                        let state = ctx.input.snapshot();
                        let err = state.location_error.or(state.date_error).unwrap_or_default();
                        bail!("⚠️ {err}");
                    }
                    SearchOutcome::NotFound(query) => bail!("No place found for '{query}'."),
                    SearchOutcome::Found(coords) => {
                        println!("{}", render::weather(&ctx.forecast.snapshot(), Some(coords)));
                    }
                }
                Ok(())
            }
            Command::Events => {
                let ctx = start().await?;
                let state = ctx.events.snapshot();
                if let Some(err) = &state.error {
                    bail!("⚠️ {err}");
                }
                println!("{}", render::events(&ctx.events.upcoming_events(), None));
                Ok(())
            }
            Command::Event { id } => {
                let ctx = start().await?;
                if !ctx.choose_event(&id).await {
                    bail!("Unknown event '{id}'. Run `eventcast events` to list them.");
                }
                if let Some(event) = ctx.events.find(&id) {
                    println!("{}\n", render::event_header(&event));
                }
                println!("{}", render::weather(&ctx.forecast.snapshot(), Some(ctx.map.location())));
                Ok(())
            }
            Command::Pin { lat, lng, date } => {
                let ctx = start().await?;
                if let Some(date) = date {
                    let date = validation::parse_date(&date)?;
                    validation::validate_date(date).map_err(|e| anyhow::anyhow!(format_validation_error(&e)))?;
                    ctx.input.set_date(date);
                }

                let coords = Coordinates::new(lat, lng);
                let label = ctx.drop_pin(coords).await;
                println!("📌 {label}\n");
                println!("{}", render::weather(&ctx.forecast.snapshot(), Some(coords)));
                Ok(())
            }
            Command::Interactive => {
                let ctx = start().await?;
                interactive::run(&ctx).await
            }
        }
    }
}

async fn start() -> anyhow::Result<AppContext> {
    let config = Config::load()?;
    let mut ctx = AppContext::from_config(&config)?;
    ctx.wait_for_startup().await;
    Ok(ctx)
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;

        if api_key.trim().is_empty() {
            bail!("API key must not be empty.");
        }
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    }

    let current = config.default_provider_id().ok();
    if current != Some(id) {
        let make_default = Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
