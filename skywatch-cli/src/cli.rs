use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select};
use std::{sync::Arc, time::Duration};
use tracing::debug;

use skywatch_core::{
    Config, Coordinates, DeviceGeolocation, FavoritesStore, FileStore, FixedGeolocation,
    KeyValueStore, Location, LocationResolver, SearchSession, SessionState, ThemePreference,
    UnsupportedGeolocation, WeatherReport, WeatherSession, favorite_conditions,
    provider_from_config,
};

use crate::render;

/// Hung requests are left `Loading` by the core; the terminal gives up here.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Weather for your places")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key.
    Configure,

    /// Show weather for a place, or for the device position.
    Show {
        /// Place name; when absent the device position (or London) is used.
        query: Option<String>,

        /// Device latitude, used together with --lon.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Device longitude, used together with --lat.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Also print the hourly breakdown for today.
        #[arg(long)]
        hourly: bool,
    },

    /// Search for a place, pick one and show its weather.
    Search {
        query: String,
    },

    /// Manage favorite places.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Toggle the dark/light display preference.
    Theme,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// List favorites (default).
    List,
    /// Current conditions for every favorite.
    Overview,
    /// Remove a favorite by name and country.
    Remove { name: String, country: String },
    /// Remove all favorites.
    Clear,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        debug!(command = ?self.command, "dispatching");
        match self.command {
            Command::Configure => configure(),
            Command::Show { query, lat, lon, hourly } => {
                let geolocation: Arc<dyn DeviceGeolocation> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Arc::new(FixedGeolocation(Coordinates::new(lat, lon))),
                    _ => Arc::new(UnsupportedGeolocation),
                };
                show(query, geolocation, hourly).await
            }
            Command::Search { query } => search(&query).await,
            Command::Favorites { action } => favorites(action.unwrap_or(FavoritesAction::List)).await,
            Command::Theme => {
                let mut theme = ThemePreference::load(storage()?);
                let dark = theme.toggle().context("Failed to save theme preference")?;
                println!("Theme: {}", if dark { "dark" } else { "light" });
                Ok(())
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;
    let api_key = Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .prompt()
        .context("No API key entered")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn storage() -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(FileStore::in_dir(&Config::data_dir()?)))
}

async fn show(
    query: Option<String>,
    geolocation: Arc<dyn DeviceGeolocation>,
    hourly: bool,
) -> Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let resolver = LocationResolver::new(provider.clone(), geolocation);

    let location = match query {
        Some(query) => resolver
            .resolve_query(&query)
            .await
            .map_err(|e| anyhow!(e.user_message()))?
            .ok_or_else(|| anyhow!("No place found for '{query}'"))?,
        None => resolver.resolve_current().await,
    };

    let weather = WeatherSession::with_days(provider, config.forecast_days());
    weather.set_location(location);
    let report = wait_for_weather(&weather).await?;

    print!("{}", render::report(&report, hourly));
    Ok(())
}

async fn search(query: &str) -> Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let search = SearchSession::with_debounce(provider.clone(), config.search_debounce());
    let weather = WeatherSession::with_days(provider, config.forecast_days());

    search.on_query_changed(query);
    let mut rx = search.subscribe();
    let state = tokio::time::timeout(SETTLE_TIMEOUT, rx.wait_for(SessionState::is_settled))
        .await
        .context("Search timed out")??
        .clone();

    let results = match state {
        SessionState::Ready(set) => set.locations,
        SessionState::Failed(failure) => bail!("{}", failure.message),
        SessionState::Idle | SessionState::Loading => Vec::new(),
    };

    if results.is_empty() {
        println!("No places match '{query}'.");
        return Ok(());
    }

    let labels: Vec<String> = results.iter().map(Location::label).collect();
    let picked = Select::new("Pick a place:", labels.clone()).prompt()?;
    let index = labels.iter().position(|l| *l == picked).unwrap_or(0);
    let location = results[index].clone();

    search.select(location.clone(), &weather);
    let report = wait_for_weather(&weather).await?;
    print!("{}", render::report(&report, false));

    let favorites = FavoritesStore::load(storage()?);
    let prompt = if favorites.contains(&location) {
        "Remove from favorites?"
    } else {
        "Add to favorites?"
    };
    if Confirm::new(prompt).with_default(false).prompt()? {
        let now = favorites.toggle(&location).context("Failed to save favorites")?;
        println!("{} {}", location, if now { "added to favorites" } else { "removed from favorites" });
    }

    Ok(())
}

async fn favorites(action: FavoritesAction) -> Result<()> {
    let store = FavoritesStore::load(storage()?);

    match action {
        FavoritesAction::List => {
            if store.is_empty() {
                println!("No favorites yet. Use `skywatch search <place>` to add one.");
            }
            for fav in store.list() {
                println!("{}", render::favorite(&fav));
            }
        }
        FavoritesAction::Overview => {
            let config = Config::load()?;
            let provider = provider_from_config(&config)?;
            let overview = favorite_conditions(provider.as_ref(), &store.list())
                .await
                .map_err(|e| anyhow!("Failed to load favorite locations: {}", e.user_message()))?;
            for (location, current) in overview {
                println!("{}", render::overview_line(&location, &current));
            }
        }
        FavoritesAction::Remove { name, country } => {
            let target = Location::new(name, country, 0.0, 0.0);
            if store.remove(&target).context("Failed to save favorites")? {
                println!("Removed {target}");
            } else {
                println!("{target} is not a favorite");
            }
        }
        FavoritesAction::Clear => {
            store.clear().context("Failed to save favorites")?;
            println!("Favorites cleared");
        }
    }

    Ok(())
}

async fn wait_for_weather(weather: &WeatherSession) -> Result<WeatherReport> {
    let mut rx = weather.subscribe();
    let state = tokio::time::timeout(SETTLE_TIMEOUT, rx.wait_for(SessionState::is_settled))
        .await
        .context("Weather request timed out")??
        .clone();

    match state {
        SessionState::Ready(report) => Ok(report),
        SessionState::Failed(failure) => Err(anyhow!("{failure}")),
        SessionState::Idle | SessionState::Loading => Err(anyhow!("Weather session was reset")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["skywatch", "show", "--lat", "51.5", "--lon", "-0.12"])
            .expect("parses");
        match cli.command {
            Command::Show { query, lat, lon, .. } => {
                assert!(query.is_none());
                assert_eq!(lat, Some(51.5));
                assert_eq!(lon, Some(-0.12));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["skywatch", "show", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn favorites_defaults_to_list() {
        let cli = Cli::try_parse_from(["skywatch", "favorites"]).expect("parses");
        assert!(matches!(cli.command, Command::Favorites { action: None }));
    }
}
