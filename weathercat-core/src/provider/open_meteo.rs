use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{Current, Daily, Forecast, Hourly};

use super::ForecastProvider;

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
const SERVICE: &str = "Open-Meteo";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
                            apparent_temperature_max,apparent_temperature_min,\
                            sunrise,sunset,uv_index_max,uv_index_clear_sky_max";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Client for the Open-Meteo forecast API (no key required).
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    http: Client,
    base_url: String,
    timezone: String,
}

impl OpenMeteo {
    /// `timezone` is an IANA name; `None` lets Open-Meteo use the location's own zone.
    pub fn new(timezone: Option<String>) -> Result<Self> {
        Self::with_base_url(OPEN_METEO_URL, timezone)
    }

    pub fn with_base_url(base_url: &str, timezone: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::unavailable(SERVICE, e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timezone: timezone.unwrap_or_else(|| "auto".to_string()),
        })
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteo {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast> {
        let url = format!("{}/v1/forecast", self.base_url);
        tracing::debug!(
            %url,
            latitude,
            longitude,
            timezone = %self.timezone,
            "requesting forecast"
        );

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("hourly", HOURLY_FIELDS),
                ("daily", DAILY_FIELDS),
                ("current_weather", "true"),
                ("wind_speed_unit", "ms"),
                ("forecast_days", "7"),
                ("timezone", self.timezone.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::unavailable(SERVICE, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| Error::unavailable(SERVICE, e))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<OmError>(&body)
                .map(|e| e.reason)
                .unwrap_or_else(|_| truncate_body(&body));
            return Err(Error::ServiceUnavailable {
                service: SERVICE,
                reason: format!("status {status}: {reason}"),
            });
        }

        let parsed: OmResponse = serde_json::from_str(&body)
            .map_err(|e| Error::data(format!("invalid Open-Meteo response: {e}")))?;

        let forecast = parsed.into_forecast()?;
        forecast.validate()?;
        Ok(forecast)
    }
}

#[derive(Debug, Deserialize)]
struct OmError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    apparent_temperature: Option<Vec<f64>>,
    #[serde(alias = "weathercode")]
    weather_code: Vec<u8>,
    #[serde(alias = "windspeed_10m")]
    wind_speed_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    #[serde(alias = "weathercode")]
    weather_code: Vec<u8>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    apparent_temperature_max: Vec<f64>,
    apparent_temperature_min: Vec<f64>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
    uv_index_max: Option<Vec<Option<f64>>>,
    uv_index_clear_sky_max: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    time: String,
    temperature: f64,
    #[serde(alias = "weather_code")]
    weathercode: u8,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    timezone: String,
    hourly: OmHourly,
    daily: OmDaily,
    current_weather: Option<OmCurrentWeather>,
}

impl OmResponse {
    fn into_forecast(self) -> Result<Forecast> {
        let timezone = self
            .timezone
            .parse()
            .map_err(|_| Error::data(format!("unknown timezone {}", self.timezone)))?;

        let current = self
            .current_weather
            .map(|c| {
                Ok::<_, Error>(Current {
                    time: parse_time(&c.time)?,
                    temperature: c.temperature,
                    weather_code: c.weathercode,
                })
            })
            .transpose()?;

        Ok(Forecast {
            hourly: Hourly {
                time: parse_all(&self.hourly.time, parse_time)?,
                temperature: self.hourly.temperature_2m,
                apparent_temperature: self.hourly.apparent_temperature,
                weather_code: self.hourly.weather_code,
                wind_speed: self.hourly.wind_speed_10m,
            },
            daily: Daily {
                date: parse_all(&self.daily.time, parse_date)?,
                weather_code: self.daily.weather_code,
                temperature_min: self.daily.temperature_2m_min,
                temperature_max: self.daily.temperature_2m_max,
                apparent_temperature_min: self.daily.apparent_temperature_min,
                apparent_temperature_max: self.daily.apparent_temperature_max,
                sunrise: parse_all(&self.daily.sunrise, parse_time)?,
                sunset: parse_all(&self.daily.sunset, parse_time)?,
                uv_index_max: self.daily.uv_index_max,
                uv_index_clear_sky_max: self.daily.uv_index_clear_sky_max,
            },
            current,
            timezone,
        })
    }
}

fn parse_all<T>(values: &[String], parse: fn(&str) -> Result<T>) -> Result<Vec<T>> {
    values.iter().map(|v| parse(v)).collect()
}

fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| Error::data(format!("invalid timestamp {value:?}: {e}")))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::data(format!("invalid date {value:?}: {e}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A payload in Open-Meteo's shape covering `days` days from 2023-06-05.
    pub fn payload(days: usize) -> Value {
        let dates: Vec<String> = (0..days).map(|d| format!("2023-06-{:02}", 5 + d)).collect();
        let times: Vec<String> = dates
            .iter()
            .flat_map(|d| (0..24).map(move |h| format!("{d}T{h:02}:00")))
            .collect();
        let hours = times.len();
        json!({
            "latitude": 61.0,
            "longitude": 24.46,
            "timezone": "Europe/Helsinki",
            "current_weather": {
                "time": "2023-06-05T14:15",
                "temperature": 12.3,
                "windspeed": 3.1,
                "weathercode": 3
            },
            "hourly": {
                "time": times,
                "temperature_2m": vec![10.0; hours],
                "apparent_temperature": vec![9.0; hours],
                "weather_code": vec![1; hours],
                "wind_speed_10m": vec![4.0; hours]
            },
            "daily": {
                "time": dates,
                "weather_code": vec![61; days],
                "temperature_2m_max": vec![15.0; days],
                "temperature_2m_min": vec![5.0; days],
                "apparent_temperature_max": vec![14.0; days],
                "apparent_temperature_min": vec![3.0; days],
                "sunrise": dates.iter().map(|d| format!("{d}T03:54")).collect::<Vec<_>>(),
                "sunset": dates.iter().map(|d| format!("{d}T22:31")).collect::<Vec<_>>(),
                "uv_index_max": vec![Some(4.5); days],
                "uv_index_clear_sky_max": vec![None::<f64>; days]
            }
        })
    }

    async fn server_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn fetches_and_converts_forecast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "61"))
            .and(query_param("longitude", "24.46"))
            .and(query_param("wind_speed_unit", "ms"))
            .and(query_param("current_weather", "true"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload(2)))
            .mount(&server)
            .await;

        let provider = OpenMeteo::with_base_url(&server.uri(), None).expect("client");
        let forecast = provider.fetch_forecast(61.0, 24.46).await.expect("forecast");

        assert_eq!(forecast.days(), 2);
        assert_eq!(forecast.hourly.time.len(), 48);
        assert_eq!(forecast.timezone, chrono_tz::Europe::Helsinki);
        assert_eq!(forecast.daily.weather_code, vec![61, 61]);
        assert_eq!(forecast.daily.uv_index_max, Some(vec![Some(4.5), Some(4.5)]));
        assert_eq!(forecast.daily.uv_index_clear_sky_max, Some(vec![None, None]));
        let current = forecast.current.expect("current weather");
        assert_eq!(current.weather_code, 3);
        assert_eq!(current.time.format("%H:%M").to_string(), "14:15");
    }

    #[tokio::test]
    async fn configured_timezone_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("timezone", "Europe/Helsinki"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload(1)))
            .mount(&server)
            .await;

        let provider = OpenMeteo::with_base_url(&server.uri(), Some("Europe/Helsinki".into()))
            .expect("client");
        assert!(provider.fetch_forecast(61.0, 24.46).await.is_ok());
    }

    #[tokio::test]
    async fn optional_fields_may_be_absent() {
        let mut body = payload(1);
        let root = body.as_object_mut().expect("object");
        root.remove("current_weather");
        if let Some(hourly) = root.get_mut("hourly").and_then(Value::as_object_mut) {
            hourly.remove("apparent_temperature");
        }
        if let Some(daily) = root.get_mut("daily").and_then(Value::as_object_mut) {
            daily.remove("uv_index_max");
            daily.remove("uv_index_clear_sky_max");
        }

        let server = server_with(ResponseTemplate::new(200).set_body_json(body)).await;
        let provider = OpenMeteo::with_base_url(&server.uri(), None).expect("client");
        let forecast = provider.fetch_forecast(61.0, 24.46).await.expect("forecast");

        assert!(forecast.current.is_none());
        assert!(forecast.hourly.apparent_temperature.is_none());
        assert!(forecast.daily.uv_index_max.is_none());
    }

    #[tokio::test]
    async fn legacy_field_names_are_accepted() {
        let mut body = payload(1);
        let hourly = body["hourly"].as_object_mut().expect("object");
        let codes = hourly.remove("weather_code").expect("codes");
        let wind = hourly.remove("wind_speed_10m").expect("wind");
        hourly.insert("weathercode".into(), codes);
        hourly.insert("windspeed_10m".into(), wind);

        let server = server_with(ResponseTemplate::new(200).set_body_json(body)).await;
        let provider = OpenMeteo::with_base_url(&server.uri(), None).expect("client");
        let forecast = provider.fetch_forecast(61.0, 24.46).await.expect("forecast");
        assert_eq!(forecast.hourly.weather_code.len(), 24);
    }

    #[tokio::test]
    async fn api_error_reason_is_reported() {
        let body = json!({
            "error": true,
            "reason": "Latitude must be in range of -90 to 90°."
        });
        let template = ResponseTemplate::new(400).set_body_json(body);
        let server = server_with(template).await;
        let provider = OpenMeteo::with_base_url(&server.uri(), None).expect("client");

        let err = provider.fetch_forecast(161.0, 24.46).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ServiceUnavailable {
                service: "Open-Meteo",
                ..
            }
        ));
        assert!(err.to_string().contains("Latitude must be in range"));
    }

    #[tokio::test]
    async fn inconsistent_series_are_rejected() {
        let mut body = payload(2);
        body["hourly"]["temperature_2m"] = json!([1.0, 2.0]);
        let server = server_with(ResponseTemplate::new(200).set_body_json(body)).await;
        let provider = OpenMeteo::with_base_url(&server.uri(), None).expect("client");

        let err = provider.fetch_forecast(61.0, 24.46).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedData(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_distinguished() {
        let provider = OpenMeteo::with_base_url("http://127.0.0.1:9", None).expect("client");
        let err = provider.fetch_forecast(61.0, 24.46).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { .. }));
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        let body = "ä".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
