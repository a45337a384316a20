//! Place names to coordinates and back.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::Location;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const SERVICE: &str = "Nominatim";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("weathercat/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: Option<String>,
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

/// `/reverse` answers with either a place or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Found(Place),
    Missing { error: String },
}

impl Place {
    fn toponym(&self) -> Option<String> {
        let address = self.address.as_ref();
        let settlement = address
            .map(|a| a.city.is_some() || a.town.is_some() || a.village.is_some())
            .unwrap_or(false);

        match address {
            Some(a) if settlement => Some(
                [&a.city, &a.town, &a.village, &a.country]
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => self.display_name.clone(),
        }
    }

    fn into_location(self) -> Result<Location> {
        let latitude = parse_degrees(&self.lat)?;
        let longitude = parse_degrees(&self.lon)?;
        Ok(Location::new(self.toponym(), latitude, longitude))
    }
}

fn parse_degrees(value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| Error::data(format!("invalid coordinate from Nominatim: {value:?}")))
}

/// Recognize `"61.0, 24.4"`, `"61.0 24.4"` and `geo:` URIs such as
/// `"geo:61.0,24.4;u=35"`.
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let text = text.trim();
    let text = text.strip_prefix("geo:").unwrap_or(text);
    let text = text.split(';').next().unwrap_or(text);

    let mut parts = text.split([',', ' ']).filter(|p| !p.is_empty());
    let latitude: f64 = parts.next()?.parse().ok()?;
    let longitude: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    valid.then_some((latitude, longitude))
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    base_url: String,
    language: String,
}

impl Geocoder {
    /// `language` is sent as `accept-language`, e.g. `fi-FI`.
    pub fn new(language: impl Into<String>) -> Result<Self> {
        Self::with_base_url(NOMINATIM_URL, language)
    }

    pub fn with_base_url(base_url: &str, language: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::unavailable(SERVICE, e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.into(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, ?query, "querying Nominatim");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("accept-language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::unavailable(SERVICE, e))?
            .error_for_status()
            .map_err(|e| Error::unavailable(SERVICE, e))?;

        res.json::<T>()
            .await
            .map_err(|e| Error::data(format!("invalid Nominatim response: {e}")))
    }

    /// Best match for free text.
    pub async fn geocode(&self, query: &str) -> Result<Location> {
        let query_params = [("q", query.to_string()), ("limit", "1".to_string())];
        let places: Vec<Place> = self.get("search", &query_params).await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(query.to_string()))?;
        tracing::debug!(?place, "geocoded");
        place.into_location()
    }

    /// Place name for coordinates. The returned location keeps the given coordinates.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Location> {
        let query_params = [
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
        ];
        let response: ReverseResponse = self.get("reverse", &query_params).await?;

        match response {
            ReverseResponse::Found(place) => {
                tracing::debug!(?place, "reverse geocoded");
                Ok(Location::new(place.toponym(), latitude, longitude))
            }
            ReverseResponse::Missing { error } => {
                tracing::debug!(%error, "nothing at coordinates");
                Err(Error::NotFound(format!("{latitude}, {longitude}")))
            }
        }
    }

    /// Coordinates are reverse geocoded and never fail on a lookup problem;
    /// anything else is geocoded.
    pub async fn resolve(&self, text: &str) -> Result<Location> {
        let Some((latitude, longitude)) = parse_coordinates(text) else {
            return self.geocode(text).await;
        };

        self.name_or_bare(latitude, longitude).await
    }

    /// Reverse geocode, degrading to an unnamed location.
    pub async fn name_or_bare(&self, latitude: f64, longitude: f64) -> Result<Location> {
        match self.reverse(latitude, longitude).await {
            Ok(location) => Ok(location),
            Err(Error::NotFound(_)) => Ok(Location::new(None, latitude, longitude)),
            Err(e @ Error::ServiceUnavailable { .. }) => {
                tracing::warn!("{e}");
                Ok(Location::new(None, latitude, longitude))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn coordinate_forms() {
        assert_eq!(parse_coordinates("61.0, 24.4"), Some((61.0, 24.4)));
        assert_eq!(parse_coordinates("61.0 24.4"), Some((61.0, 24.4)));
        assert_eq!(
            parse_coordinates("geo:61.000689,24.479063"),
            Some((61.000689, 24.479063))
        );
        assert_eq!(parse_coordinates("geo:61.0,24.4;u=35"), Some((61.0, 24.4)));
        assert_eq!(parse_coordinates("-33.87,151.21"), Some((-33.87, 151.21)));
        assert_eq!(parse_coordinates(" 40.7 ,  -74.0 "), Some((40.7, -74.0)));
    }

    #[test]
    fn place_names_are_not_coordinates() {
        assert_eq!(parse_coordinates("Hölmölä"), None);
        assert_eq!(parse_coordinates("Helsinki, Suomi"), None);
        assert_eq!(parse_coordinates("61.0"), None);
        assert_eq!(parse_coordinates("1 2 3"), None);
        assert_eq!(parse_coordinates("91.0, 24.4"), None);
        assert_eq!(parse_coordinates("NaN, 24.4"), None);
    }

    #[test]
    fn toponym_prefers_settlements() {
        let place = Place {
            lat: "61.0".into(),
            lon: "24.4".into(),
            display_name: Some("Hölmölä, Kanta-Häme, Suomi".into()),
            address: Some(Address {
                village: Some("Hölmölä".into()),
                country: Some("Suomi".into()),
                ..Address::default()
            }),
        };
        assert_eq!(place.toponym().as_deref(), Some("Hölmölä, Suomi"));

        let wilderness = Place {
            address: Some(Address {
                country: Some("Suomi".into()),
                ..Address::default()
            }),
            ..place
        };
        assert_eq!(
            wilderness.toponym().as_deref(),
            Some("Hölmölä, Kanta-Häme, Suomi")
        );
    }

    #[tokio::test]
    async fn geocode_returns_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Helsinki"))
            .and(query_param("accept-language", "fi-FI"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "lat": "60.1674881",
                "lon": "24.9427473",
                "display_name": "Helsinki, Helsingin seutukunta, Uusimaa, Suomi",
                "address": {"city": "Helsinki", "country": "Suomi"}
            }])))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_base_url(&server.uri(), "fi-FI").expect("client");
        let location = geocoder.resolve("Helsinki").await.expect("location");

        assert_eq!(location.toponym.as_deref(), Some("Helsinki, Suomi"));
        assert!((location.latitude - 60.1674881).abs() < 1e-9);
        assert!((location.longitude - 24.9427473).abs() < 1e-9);
    }

    #[tokio::test]
    async fn geocode_without_match_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_base_url(&server.uri(), "en").expect("client");
        let err = geocoder.resolve("Qwxzzy").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "Unknown location: Qwxzzy");
    }

    #[tokio::test]
    async fn geocode_failure_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_base_url(&server.uri(), "en").expect("client");
        let err = geocoder.resolve("Helsinki").await.unwrap_err();
        assert!(matches!(
            err,
            Error::ServiceUnavailable {
                service: "Nominatim",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn coordinates_are_reverse_geocoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("lat", "61.000689"))
            .and(query_param("lon", "24.479063"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lat": "61.0006",
                "lon": "24.4790",
                "display_name": "Hölmölä, Kanta-Häme, Suomi",
                "address": {"village": "Hölmölä", "country": "Suomi"}
            })))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_base_url(&server.uri(), "fi-FI").expect("client");
        let location = geocoder
            .resolve("geo:61.000689,24.479063")
            .await
            .expect("location");

        assert_eq!(location.toponym.as_deref(), Some("Hölmölä, Suomi"));
        assert_eq!((location.latitude, location.longitude), (61.000689, 24.479063));
    }

    #[tokio::test]
    async fn reverse_failure_degrades_to_bare_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_base_url(&server.uri(), "en").expect("client");
        let location = geocoder.resolve("61.0, 24.4").await.expect("bare location");
        assert_eq!(location, Location::new(None, 61.0, 24.4));
    }

    #[tokio::test]
    async fn reverse_in_the_ocean_has_no_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "Unable to geocode"})),
            )
            .mount(&server)
            .await;

        let geocoder = Geocoder::with_base_url(&server.uri(), "en").expect("client");
        let err = geocoder.reverse(0.0, -30.0).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let location = geocoder.resolve("0.0, -30.0").await.expect("bare location");
        assert_eq!(location.toponym, None);
    }
}
