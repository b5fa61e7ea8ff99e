//! Core library for the `skywatch` weather client.
//!
//! This crate defines:
//! - A client for the remote weather/geocoding API
//! - Location resolution with a default fallback
//! - Debounced place search and forecast sessions that only ever show the
//!   answer to the latest request
//! - A persisted favorites list and display preference
//!
//! It is used by `skywatch-cli`, but is meant to sit under any UI layer.

pub mod config;
pub mod error;
pub mod favorites;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod search;
mod session;
pub mod storage;
pub mod theme;
pub mod weather;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Failure, GeolocationError, LocateError, StorageError, WeatherError};
pub use favorites::FavoritesStore;
pub use geolocation::{DeviceGeolocation, FixedGeolocation, UnsupportedGeolocation};
pub use model::{
    ConditionIcon, Coordinates, Location, SearchResultSet, SessionState, WeatherReport,
    WeatherSnapshot,
};
pub use provider::{WeatherProvider, provider_from_config, weatherapi::WeatherApiProvider};
pub use resolver::LocationResolver;
pub use search::SearchSession;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::ThemePreference;
pub use weather::{WeatherSession, favorite_conditions};
