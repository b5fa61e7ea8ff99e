use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    error::WeatherError,
    model::{Condition, CurrentConditions, DayReading, HourReading, Location, WeatherSnapshot},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Client for WeatherAPI.com (`current.json`, `search.json`, `forecast.json`).
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(WeatherError::network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::network)?;

        if !status.is_success() {
            debug!(%status, endpoint, "provider request failed");
            return Err(WeatherError::Provider {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(WeatherError::decode)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    #[instrument(level = "debug", skip(self))]
    async fn resolve_by_coordinates(&self, lat: f64, lon: f64) -> Result<Location, WeatherError> {
        let parsed: WaCurrentResponse =
            self.get_json("current.json", &[("q", format!("{lat},{lon}"))]).await?;

        Ok(Location::new(parsed.location.name, parsed.location.country, lat, lon))
    }

    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        let hits: Vec<WaSearchHit> =
            self.get_json("search.json", &[("q", query.to_string())]).await?;

        Ok(hits
            .into_iter()
            .map(|hit| Location::new(hit.name, hit.country, hit.lat, hit.lon))
            .collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn forecast(&self, lat: f64, lon: f64, days: u8) -> Result<WeatherSnapshot, WeatherError> {
        let parsed: WaForecastResponse = self
            .get_json(
                "forecast.json",
                &[
                    ("q", format!("{lat},{lon}")),
                    ("days", days.to_string()),
                    ("aqi", "no".to_string()),
                    ("alerts", "no".to_string()),
                ],
            )
            .await?;

        snapshot_from(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    #[serde(default)]
    tz_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaSearchHit {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    code: u32,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
    #[serde(default)]
    pressure_mb: f64,
    #[serde(default)]
    vis_km: f64,
    #[serde(default)]
    uv: f64,
    #[serde(default)]
    cloud: u8,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    location: WaLocation,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    maxwind_kph: f64,
    #[serde(default)]
    daily_chance_of_rain: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    sunrise: String,
    sunset: String,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time: String,
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    #[serde(default)]
    chance_of_rain: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    astro: WaAstro,
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    message: String,
}

impl From<WaCondition> for Condition {
    fn from(c: WaCondition) -> Self {
        Condition { code: c.code, text: c.text }
    }
}

fn snapshot_from(parsed: WaForecastResponse) -> Result<WeatherSnapshot, WeatherError> {
    let current = parsed.current;
    let observation_time = current
        .last_updated_epoch
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    let mut hourly = Vec::new();
    let mut daily = Vec::with_capacity(parsed.forecast.forecastday.len());

    for day in parsed.forecast.forecastday {
        for hour in day.hour {
            let time = NaiveDateTime::parse_from_str(&hour.time, "%Y-%m-%d %H:%M")
                .map_err(|e| WeatherError::decode(format!("bad hour time '{}': {e}", hour.time)))?;
            hourly.push(HourReading {
                time,
                temperature_c: hour.temp_c,
                feels_like_c: hour.feelslike_c,
                condition: hour.condition.into(),
                humidity_pct: hour.humidity,
                wind_kph: hour.wind_kph,
                chance_of_rain_pct: hour.chance_of_rain,
            });
        }

        daily.push(DayReading {
            date: day.date,
            max_temperature_c: day.day.maxtemp_c,
            min_temperature_c: day.day.mintemp_c,
            condition: day.day.condition.into(),
            chance_of_rain_pct: day.day.daily_chance_of_rain,
            max_wind_kph: day.day.maxwind_kph,
            sunrise: parse_astro_time(&day.astro.sunrise),
            sunset: parse_astro_time(&day.astro.sunset),
        });
    }

    Ok(WeatherSnapshot {
        current: CurrentConditions {
            temperature_c: current.temp_c,
            feels_like_c: current.feelslike_c,
            condition: current.condition.into(),
            humidity_pct: current.humidity,
            wind_kph: current.wind_kph,
            pressure_mb: current.pressure_mb,
            visibility_km: current.vis_km,
            uv_index: current.uv,
            cloud_pct: current.cloud,
            observation_time,
        },
        hourly,
        daily,
        timezone_id: parsed.location.tz_id.unwrap_or_else(|| "UTC".to_string()),
    })
}

/// `"06:45 AM"`; anything else (e.g. `"No sunrise"`) is `None`.
fn parse_astro_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%I:%M %p").ok()
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<WaErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
