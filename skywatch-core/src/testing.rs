//! Scripted collaborators shared by the unit tests.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};

use crate::{
    error::{GeolocationError, WeatherError},
    geolocation::DeviceGeolocation,
    model::{
        Condition, Coordinates, CurrentConditions, DayReading, HourReading, Location,
        WeatherSnapshot,
    },
    provider::WeatherProvider,
};

type Scripted<T> = (Duration, Result<T, WeatherError>);

/// Provider whose answers (and their latency) are set up per request.
///
/// Unscripted searches return no matches, unscripted forecasts return
/// [`snapshot`] with the latitude as temperature, and unscripted reverse
/// lookups fail with a provider error.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    searches: Mutex<HashMap<String, Scripted<Vec<Location>>>>,
    forecasts: Mutex<HashMap<String, Scripted<WeatherSnapshot>>>,
    reverse: Mutex<Option<Result<Location, WeatherError>>>,
    pub search_calls: Mutex<Vec<String>>,
    pub forecast_calls: Mutex<Vec<(f64, f64, u8)>>,
}

impl ScriptedProvider {
    pub fn on_search(&self, query: &str, delay: Duration, result: Result<Vec<Location>, WeatherError>) {
        self.searches.lock().insert(query.to_string(), (delay, result));
    }

    pub fn on_forecast(
        &self,
        location: &Location,
        delay: Duration,
        result: Result<WeatherSnapshot, WeatherError>,
    ) {
        self.forecasts.lock().insert(location.coordinates().as_query(), (delay, result));
    }

    pub fn on_reverse(&self, result: Result<Location, WeatherError>) {
        *self.reverse.lock() = Some(result);
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.lock().len()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn resolve_by_coordinates(&self, lat: f64, lon: f64) -> Result<Location, WeatherError> {
        match self.reverse.lock().clone() {
            Some(Ok(found)) => Ok(Location::new(found.name(), found.country(), lat, lon)),
            Some(Err(e)) => Err(e),
            None => Err(WeatherError::Provider { status: 400, message: "unscripted".into() }),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        self.search_calls.lock().push(query.to_string());
        let scripted = self.searches.lock().get(query).cloned();
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(Vec::new()),
        }
    }

    async fn forecast(&self, lat: f64, lon: f64, days: u8) -> Result<WeatherSnapshot, WeatherError> {
        self.forecast_calls.lock().push((lat, lon, days));
        let scripted = self.forecasts.lock().get(&Coordinates::new(lat, lon).as_query()).cloned();
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(snapshot(lat)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedGeolocation(pub Result<Coordinates, GeolocationError>);

#[async_trait]
impl DeviceGeolocation for ScriptedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        self.0.clone()
    }
}

pub fn paris() -> Location {
    Location::new("Paris", "France", 48.8567, 2.3508)
}

pub fn tokyo() -> Location {
    Location::new("Tokyo", "Japan", 35.6895, 139.6917)
}

/// Minimal one-day snapshot; `temperature_c` tags it for assertions.
pub fn snapshot(temperature_c: f64) -> WeatherSnapshot {
    let condition = Condition { code: 1000, text: "Sunny".into() };
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
    WeatherSnapshot {
        current: CurrentConditions {
            temperature_c,
            feels_like_c: temperature_c,
            condition: condition.clone(),
            humidity_pct: 50,
            wind_kph: 10.0,
            pressure_mb: 1015.0,
            visibility_km: 10.0,
            uv_index: 5.0,
            cloud_pct: 0,
            observation_time: Utc::now(),
        },
        hourly: vec![HourReading {
            time: date.and_hms_opt(12, 0, 0).expect("valid time"),
            temperature_c,
            feels_like_c: temperature_c,
            condition: condition.clone(),
            humidity_pct: 50,
            wind_kph: 10.0,
            chance_of_rain_pct: 0,
        }],
        daily: vec![DayReading {
            date,
            max_temperature_c: temperature_c + 3.0,
            min_temperature_c: temperature_c - 3.0,
            condition,
            chance_of_rain_pct: 0,
            max_wind_kph: 15.0,
            sunrise: None,
            sunset: None,
        }],
        timezone_id: "UTC".into(),
    }
}
