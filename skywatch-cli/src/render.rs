use chrono::{NaiveTime, Timelike};
use std::fmt::Write;

use skywatch_core::{Location, WeatherReport, model::CurrentConditions};

/// Every third hour keeps the hourly table readable.
const HOURLY_STRIDE: usize = 3;

pub fn report(report: &WeatherReport, hourly: bool) -> String {
    let snap = &report.snapshot;
    let cur = &snap.current;
    let mut out = String::new();

    let _ = writeln!(out, "{}  ({})", report.location.label(), snap.timezone_id);
    let _ = writeln!(
        out,
        "  {:.0}°C  {} [{}]",
        cur.temperature_c,
        cur.condition.text,
        cur.condition.icon().as_str()
    );
    let _ = writeln!(
        out,
        "  Feels like {:.0}°C  Humidity {}%  Wind {:.0} km/h",
        cur.feels_like_c, cur.humidity_pct, cur.wind_kph
    );
    let _ = writeln!(
        out,
        "  Pressure {:.0} mb  Visibility {:.0} km  UV {:.0}  Cloud {}%",
        cur.pressure_mb, cur.visibility_km, cur.uv_index, cur.cloud_pct
    );

    if hourly {
        if let Some(today) = snap.today() {
            let _ = writeln!(out, "\nHourly");
            for hour in snap.hours_on(today.date).step_by(HOURLY_STRIDE) {
                let _ = writeln!(
                    out,
                    "  {:02}:00  {:>4.0}°C  {:<22} {:.0} km/h",
                    hour.time.hour(),
                    hour.temperature_c,
                    hour.condition.text,
                    hour.wind_kph
                );
            }
        }
    }

    if !snap.daily.is_empty() {
        let _ = writeln!(out, "\n{}-day forecast", snap.daily.len());
    }
    for day in &snap.daily {
        let _ = writeln!(
            out,
            "  {}  {:>4.0}° / {:>4.0}°  {:<22} rain {:>3}%  wind {:.0} km/h  ↑{} ↓{}",
            day.date.format("%a %d %b"),
            day.max_temperature_c,
            day.min_temperature_c,
            day.condition.text,
            day.chance_of_rain_pct,
            day.max_wind_kph,
            clock(day.sunrise),
            clock(day.sunset),
        );
    }

    out
}

pub fn favorite(location: &Location) -> String {
    format!("{}  ({:.4}, {:.4})", location.label(), location.lat(), location.lon())
}

pub fn overview_line(location: &Location, current: &CurrentConditions) -> String {
    format!(
        "{:<32} {:>4.0}°C  {}  Humidity {}%  Wind {:.0} km/h",
        location.label(),
        current.temperature_c,
        current.condition.text,
        current.humidity_pct,
        current.wind_kph
    )
}

fn clock(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_or_dashes() {
        assert_eq!(clock(NaiveTime::from_hms_opt(6, 5, 0)), "06:05");
        assert_eq!(clock(None), "--:--");
    }

    #[test]
    fn favorite_line_has_coordinates() {
        let line = favorite(&Location::new("Tokyo", "Japan", 35.6895, 139.6917));
        assert_eq!(line, "Tokyo, Japan  (35.6895, 139.6917)");
    }
}
