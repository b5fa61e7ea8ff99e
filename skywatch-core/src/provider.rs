use crate::{
    Config, Location, WeatherSnapshot, error::WeatherError,
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherapi;

/// The three request kinds the core issues against the remote weather API.
///
/// Each call is exactly one network round trip. No retries and no caching
/// happen at this layer.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Reverse lookup: name and country of the place at the given coordinates.
    /// The returned location keeps the coordinates it was asked about.
    async fn resolve_by_coordinates(&self, lat: f64, lon: f64) -> Result<Location, WeatherError>;

    /// Free-text place search.
    async fn search(&self, query: &str) -> Result<Vec<Location>, WeatherError>;

    /// Current conditions plus `days` days of hourly and daily forecast.
    async fn forecast(&self, lat: f64, lon: f64, days: u8) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the weather provider.\n\
                 Hint: run `skywatch configure` or set {} in the environment.",
            crate::config::API_KEY_ENV
        )
    })?;

    let provider = match config.base_url.as_deref() {
        Some(base_url) => WeatherApiProvider::with_base_url(api_key, base_url),
        None => WeatherApiProvider::new(api_key),
    };

    Ok(Arc::new(provider))
}
