//! Turning device position or free text into a [`Location`].

use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::{LocateError, WeatherError},
    geolocation::DeviceGeolocation,
    model::Location,
    provider::WeatherProvider,
};

#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn WeatherProvider>,
    geolocation: Arc<dyn DeviceGeolocation>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn WeatherProvider>, geolocation: Arc<dyn DeviceGeolocation>) -> Self {
        Self { provider, geolocation }
    }

    /// Where the user is, or London when that cannot be determined.
    ///
    /// Never fails: the first screen always has a location to show.
    pub async fn resolve_current(&self) -> Location {
        match self.locate().await {
            Ok(location) => location,
            Err(e) => {
                warn!("Falling back to default location: {e}");
                Location::london()
            }
        }
    }

    /// Explicit "use my location": like [`LocationResolver::resolve_current`]
    /// but reports why it failed.
    pub async fn locate(&self) -> Result<Location, LocateError> {
        let position = self.geolocation.current_position().await?;
        debug!(lat = position.latitude, lon = position.longitude, "device position acquired");

        let location = self
            .provider
            .resolve_by_coordinates(position.latitude, position.longitude)
            .await?;

        debug!(%location, "resolved device position");
        Ok(location)
    }

    /// Best match for free text, `None` when nothing matches.
    pub async fn resolve_query(&self, text: &str) -> Result<Option<Location>, WeatherError> {
        let query = text.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let mut hits = self.provider.search(query).await?;
        debug!(query, hits = hits.len(), "resolved query");
        Ok(if hits.is_empty() { None } else { Some(hits.swap_remove(0)) })
    }
}
