use chrono::{NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const HOURS_PER_DAY: usize = 24;

/// A place resolved to coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub toponym: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(toponym: Option<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            toponym,
            latitude,
            longitude,
        }
    }

    /// Text shown in the report header: the toponym, or raw coordinates without one.
    pub fn label(&self) -> String {
        match &self.toponym {
            Some(name) => name.clone(),
            None => format!("{:.4}, {:.4}", self.latitude, self.longitude),
        }
    }
}

/// Hour-by-hour series, `24 × days` entries each.
#[derive(Debug, Clone, PartialEq)]
pub struct Hourly {
    pub time: Vec<NaiveDateTime>,
    pub temperature: Vec<f64>,
    pub apparent_temperature: Option<Vec<f64>>,
    pub weather_code: Vec<u8>,
    /// Metres per second.
    pub wind_speed: Vec<f64>,
}

/// Day-by-day series, one entry per forecast day.
#[derive(Debug, Clone, PartialEq)]
pub struct Daily {
    pub date: Vec<NaiveDate>,
    pub weather_code: Vec<u8>,
    pub temperature_min: Vec<f64>,
    pub temperature_max: Vec<f64>,
    pub apparent_temperature_min: Vec<f64>,
    pub apparent_temperature_max: Vec<f64>,
    pub sunrise: Vec<NaiveDateTime>,
    pub sunset: Vec<NaiveDateTime>,
    pub uv_index_max: Option<Vec<Option<f64>>>,
    pub uv_index_clear_sky_max: Option<Vec<Option<f64>>>,
}

/// Conditions reported for "now".
#[derive(Debug, Clone, PartialEq)]
pub struct Current {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub weather_code: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub hourly: Hourly,
    pub daily: Daily,
    pub current: Option<Current>,
    pub timezone: Tz,
}

impl Forecast {
    pub fn days(&self) -> usize {
        self.daily.date.len()
    }

    /// Index into the hourly series for `hour` of `day`.
    pub fn hour_index(day: usize, hour: usize) -> usize {
        day * HOURS_PER_DAY + hour
    }

    /// Hourly weather codes of one day.
    pub fn day_codes(&self, day: usize) -> &[u8] {
        let start = Self::hour_index(day, 0);
        &self.hourly.weather_code[start..start + HOURS_PER_DAY]
    }

    /// Apparent temperature of the hour that `time` falls into, if the series has it.
    pub fn apparent_at(&self, time: NaiveDateTime) -> Option<f64> {
        let hour = time.date().and_hms_opt(time.hour(), 0, 0)?;
        let index = self.hourly.time.iter().position(|t| *t == hour)?;
        let apparent = self.hourly.apparent_temperature.as_ref()?;
        apparent.get(index).copied()
    }

    /// Check that every series has the length the day count implies.
    pub fn validate(&self) -> Result<()> {
        let days = self.days();
        if days == 0 {
            return Err(Error::data("forecast contains no days"));
        }

        let daily = &self.daily;
        let daily_lengths = [
            ("daily.weather_code", daily.weather_code.len()),
            ("daily.temperature_min", daily.temperature_min.len()),
            ("daily.temperature_max", daily.temperature_max.len()),
            ("daily.apparent_temperature_min", daily.apparent_temperature_min.len()),
            ("daily.apparent_temperature_max", daily.apparent_temperature_max.len()),
            ("daily.sunrise", daily.sunrise.len()),
            ("daily.sunset", daily.sunset.len()),
        ];
        check_lengths(&daily_lengths, days)?;
        if let Some(uv) = &daily.uv_index_max {
            check_lengths(&[("daily.uv_index_max", uv.len())], days)?;
        }
        if let Some(uv) = &daily.uv_index_clear_sky_max {
            check_lengths(&[("daily.uv_index_clear_sky_max", uv.len())], days)?;
        }

        let hours = days * HOURS_PER_DAY;
        let hourly = &self.hourly;
        let hourly_lengths = [
            ("hourly.time", hourly.time.len()),
            ("hourly.temperature", hourly.temperature.len()),
            ("hourly.weather_code", hourly.weather_code.len()),
            ("hourly.wind_speed", hourly.wind_speed.len()),
        ];
        check_lengths(&hourly_lengths, hours)?;
        if let Some(apparent) = &hourly.apparent_temperature {
            check_lengths(&[("hourly.apparent_temperature", apparent.len())], hours)?;
        }

        Ok(())
    }
}

fn check_lengths(fields: &[(&str, usize)], expected: usize) -> Result<()> {
    for (name, len) in fields {
        if *len != expected {
            let message = format!("{name} has {len} entries, expected {expected}");
            return Err(Error::data(message));
        }
    }
    Ok(())
}
