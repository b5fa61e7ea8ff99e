use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::error::Failure;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Provider query form, e.g. `"51.5074,-0.1278"`.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// A named place.
///
/// Two locations are equal when their `(name, country)` pair is equal;
/// coordinates do not take part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, country: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), country: country.into(), lat, lon }
    }

    /// Shown when the device position cannot be resolved.
    pub fn london() -> Self {
        Self::new("London", "United Kingdom", 51.5074, -0.1278)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// Same place, ignoring coordinates.
    pub fn same_place(&self, other: &Location) -> bool {
        self.name == other.name && self.country == other.country
    }

    /// `"Paris, France"`
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.same_place(other)
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.country.hash(state);
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.country)
    }
}

/// Provider condition as reported (code + text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub code: u32,
    pub text: String,
}

impl Condition {
    pub fn icon(&self) -> ConditionIcon {
        ConditionIcon::from_code(self.code)
    }
}

/// Icon category for a provider condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionIcon {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Snow,
    Thunder,
    Fog,
    Wind,
}

impl ConditionIcon {
    /// Unknown codes fall back to [`ConditionIcon::Clear`].
    pub fn from_code(code: u32) -> Self {
        match code {
            1000 => Self::Clear,
            1003 => Self::PartlyCloudy,
            1006 | 1009 => Self::Cloudy,
            1063 | 1180 | 1186 | 1189 | 1192 | 1195 => Self::Rain,
            1066 | 1210 | 1213 | 1216 | 1219 | 1222 | 1225 => Self::Snow,
            1087 | 1273 | 1276 => Self::Thunder,
            1030 | 1135 | 1147 => Self::Fog,
            1007 | 1008 => Self::Wind,
            _ => Self::Clear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Thunder => "thunder",
            Self::Fog => "fog",
            Self::Wind => "wind",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition: Condition,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub pressure_mb: f64,
    pub visibility_km: f64,
    pub uv_index: f64,
    pub cloud_pct: u8,
    pub observation_time: DateTime<Utc>,
}

/// One hour of the forecast, in the location's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourReading {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition: Condition,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub chance_of_rain_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReading {
    pub date: NaiveDate,
    pub max_temperature_c: f64,
    pub min_temperature_c: f64,
    pub condition: Condition,
    pub chance_of_rain_pct: u8,
    pub max_wind_kph: f64,
    /// `None` on polar days/nights where the provider reports no event.
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
}

/// Forecast payload for one place. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    /// Every forecast hour across all days, in order.
    pub hourly: Vec<HourReading>,
    pub daily: Vec<DayReading>,
    pub timezone_id: String,
}

impl WeatherSnapshot {
    /// Hours belonging to the given local date.
    pub fn hours_on(&self, date: NaiveDate) -> impl Iterator<Item = &HourReading> {
        self.hourly.iter().filter(move |h| h.time.date() == date)
    }

    pub fn today(&self) -> Option<&DayReading> {
        self.daily.first()
    }
}

/// Matches for one issued search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultSet {
    pub query: String,
    pub sequence: u64,
    pub locations: Vec<Location>,
}

/// A snapshot paired with the location it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: Location,
    pub snapshot: WeatherSnapshot,
}

/// Observable state of a search or weather session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(Failure),
}

impl<T> SessionState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            SessionState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SessionState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// `true` once the latest request has produced a result either way.
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionState::Ready(_) | SessionState::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn location_identity_ignores_coordinates() {
        let a = Location::new("Paris", "France", 48.85, 2.35);
        let b = Location::new("Paris", "France", 48.0, 2.0);
        let c = Location::new("Paris", "United States of America", 33.66, -95.55);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn london_default() {
        let london = Location::london();
        assert_eq!(london.name(), "London");
        assert_eq!(london.country(), "United Kingdom");
        assert_eq!(london.lat(), 51.5074);
        assert_eq!(london.lon(), -0.1278);
        assert_eq!(london.label(), "London, United Kingdom");
    }

    #[test]
    fn coordinates_query_form() {
        assert_eq!(Coordinates::new(51.5, -0.12).as_query(), "51.5,-0.12");
    }

    #[test]
    fn condition_codes_map_to_icons() {
        assert_eq!(ConditionIcon::from_code(1000), ConditionIcon::Clear);
        assert_eq!(ConditionIcon::from_code(1009), ConditionIcon::Cloudy);
        assert_eq!(ConditionIcon::from_code(1195), ConditionIcon::Rain);
        assert_eq!(ConditionIcon::from_code(1225), ConditionIcon::Snow);
        assert_eq!(ConditionIcon::from_code(1276), ConditionIcon::Thunder);
        assert_eq!(ConditionIcon::from_code(1135), ConditionIcon::Fog);
        assert_eq!(ConditionIcon::from_code(1008), ConditionIcon::Wind);
        assert_eq!(ConditionIcon::from_code(4242), ConditionIcon::Clear);
        assert_eq!(ConditionIcon::PartlyCloudy.as_str(), "partly-cloudy");
    }

    #[test]
    fn location_serializes_with_coordinates() {
        let json = serde_json::to_string(&Location::new("Tokyo", "Japan", 35.69, 139.69))
            .expect("serialize");
        assert_eq!(json, r#"{"name":"Tokyo","country":"Japan","lat":35.69,"lon":139.69}"#);
    }

    #[test]
    fn session_state_accessors() {
        let state: SessionState<u8> = SessionState::Ready(3);
        assert_eq!(state.ready(), Some(&3));
        assert!(state.is_settled());
        assert!(!SessionState::<u8>::Loading.is_settled());
        assert!(SessionState::<u8>::default() == SessionState::Idle);
    }
}
