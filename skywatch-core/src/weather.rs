use futures::future::try_join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::{
    config::DEFAULT_FORECAST_DAYS,
    error::{Failure, WeatherError},
    model::{CurrentConditions, Location, SessionState, WeatherReport},
    provider::WeatherProvider,
    session::Sequenced,
};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch weather data. Please try again.";

/// Holds the forecast for the currently selected location.
///
/// [`WeatherSession::set_location`] returns immediately; the fetch runs on the
/// Tokio runtime and must be called from within one. Selecting a new location
/// while a fetch is in flight makes that fetch's result invisible.
#[derive(Debug)]
pub struct WeatherSession {
    provider: Arc<dyn WeatherProvider>,
    days: u8,
    cell: Arc<Sequenced<WeatherReport>>,
    location: Mutex<Option<Location>>,
}

impl WeatherSession {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self::with_days(provider, DEFAULT_FORECAST_DAYS)
    }

    pub fn with_days(provider: Arc<dyn WeatherProvider>, days: u8) -> Self {
        Self {
            provider,
            days,
            cell: Arc::new(Sequenced::new()),
            location: Mutex::new(None),
        }
    }

    /// Start fetching the forecast for `location`.
    ///
    /// Calling again with the same location is the manual retry.
    pub fn set_location(&self, location: Location) {
        let sequence = {
            let mut current = self.location.lock();
            *current = Some(location.clone());
            self.cell.begin()
        };
        debug!(%location, sequence, "fetching forecast");

        let provider = Arc::clone(&self.provider);
        let cell = Arc::clone(&self.cell);
        let days = self.days;

        tokio::spawn(async move {
            let state = match provider.forecast(location.lat(), location.lon(), days).await {
                Ok(snapshot) => SessionState::Ready(WeatherReport { location, snapshot }),
                Err(error) => {
                    debug!(%location, "forecast failed: {error}");
                    SessionState::Failed(Failure::new(error, FETCH_FAILED_MESSAGE))
                }
            };

            if !cell.publish(sequence, state) {
                debug!(sequence, "discarding stale forecast");
            }
        });
    }

    /// Re-issue the fetch for the last requested location, if any.
    pub fn retry(&self) -> bool {
        let location = self.location.lock().clone();
        match location {
            Some(location) => {
                self.set_location(location);
                true
            }
            None => false,
        }
    }

    /// The location most recently passed to [`WeatherSession::set_location`].
    pub fn location(&self) -> Option<Location> {
        self.location.lock().clone()
    }

    pub fn state(&self) -> SessionState<WeatherReport> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState<WeatherReport>> {
        self.cell.subscribe()
    }
}

/// Current conditions for every favorite, fetched concurrently.
///
/// Any single failure fails the whole overview.
pub async fn favorite_conditions(
    provider: &dyn WeatherProvider,
    favorites: &[Location],
) -> Result<Vec<(Location, CurrentConditions)>, WeatherError> {
    let fetches = favorites.iter().map(|fav| async move {
        let snapshot = provider.forecast(fav.lat(), fav.lon(), 1).await?;
        Ok::<_, WeatherError>((fav.clone(), snapshot.current))
    });

    try_join_all(fetches).await
}
