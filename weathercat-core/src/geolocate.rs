//! Where is the user? GeoClue first (Linux), then IP geolocation.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};

pub const IPINFO_URL: &str = "https://ipinfo.io/json";
const IP_SERVICE: &str = "IP geolocation";
const IP_TIMEOUT: Duration = Duration::from_secs(5);
#[cfg(target_os = "linux")]
const GEOCLUE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct IpInfo {
    loc: Option<String>,
}

/// Detects the current coordinates.
#[derive(Debug, Clone)]
pub struct Locator {
    ip_url: String,
    geoclue: bool,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            ip_url: IPINFO_URL.to_string(),
            geoclue: true,
        }
    }
}

impl Locator {
    /// Skip GeoClue and ask only `ip_url`.
    pub fn ip_only(ip_url: impl Into<String>) -> Self {
        Self {
            ip_url: ip_url.into(),
            geoclue: false,
        }
    }

    pub async fn locate(&self) -> Result<(f64, f64)> {
        if self.geoclue {
            if let Some(coordinates) = from_geoclue().await {
                return Ok(coordinates);
            }
        }
        self.from_ip().await
    }

    async fn from_ip(&self) -> Result<(f64, f64)> {
        tracing::debug!(url = %self.ip_url, "using IP geolocation");
        let http = Client::builder()
            .timeout(IP_TIMEOUT)
            .build()
            .map_err(|e| Error::unavailable(IP_SERVICE, e))?;

        let info: IpInfo = http
            .get(&self.ip_url)
            .send()
            .await
            .map_err(|e| Error::unavailable(IP_SERVICE, e))?
            .error_for_status()
            .map_err(|e| Error::unavailable(IP_SERVICE, e))?
            .json()
            .await
            .map_err(|e| Error::unavailable(IP_SERVICE, e))?;

        info.loc
            .as_deref()
            .and_then(parse_loc)
            .ok_or_else(|| Error::unavailable(IP_SERVICE, "no coordinates in response"))
    }
}

/// Autodetect with the default sources.
pub async fn autodetect() -> Result<(f64, f64)> {
    Locator::default().locate().await
}

/// `"60.1695,24.9354"`
fn parse_loc(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

#[cfg(target_os = "linux")]
async fn from_geoclue() -> Option<(f64, f64)> {
    tracing::debug!("using GeoClue");
    match tokio::time::timeout(GEOCLUE_TIMEOUT, geoclue::locate()).await {
        Ok(Ok(coordinates)) => coordinates,
        Ok(Err(e)) => {
            tracing::debug!("GeoClue unavailable: {e}");
            None
        }
        Err(_) => {
            tracing::warn!("GeoClue timeout");
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
async fn from_geoclue() -> Option<(f64, f64)> {
    None
}

#[cfg(target_os = "linux")]
mod geoclue {
    use futures::StreamExt;
    use zbus::proxy::CacheProperties;
    use zbus::zvariant::OwnedObjectPath;
    use zbus::{Connection, proxy};

    const DESKTOP_ID: &str = "weathercat";
    const ACCURACY_NEIGHBORHOOD: u32 = 5;

    #[proxy(
        interface = "org.freedesktop.GeoClue2.Manager",
        default_service = "org.freedesktop.GeoClue2",
        default_path = "/org/freedesktop/GeoClue2/Manager",
        gen_blocking = false
    )]
    trait Manager {
        fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
    }

    #[proxy(
        interface = "org.freedesktop.GeoClue2.Client",
        default_service = "org.freedesktop.GeoClue2",
        gen_blocking = false
    )]
    trait Client {
        fn start(&self) -> zbus::Result<()>;
        fn stop(&self) -> zbus::Result<()>;

        #[zbus(property)]
        fn location(&self) -> zbus::Result<OwnedObjectPath>;
        #[zbus(property)]
        fn set_desktop_id(&self, id: &str) -> zbus::Result<()>;
        #[zbus(property)]
        fn set_requested_accuracy_level(&self, level: u32) -> zbus::Result<()>;

        #[zbus(signal)]
        fn location_updated(
            &self,
            previous: OwnedObjectPath,
            current: OwnedObjectPath,
        ) -> zbus::Result<()>;
    }

    #[proxy(
        interface = "org.freedesktop.GeoClue2.Location",
        default_service = "org.freedesktop.GeoClue2",
        gen_blocking = false
    )]
    trait Location {
        #[zbus(property)]
        fn latitude(&self) -> zbus::Result<f64>;
        #[zbus(property)]
        fn longitude(&self) -> zbus::Result<f64>;
    }

    pub(super) async fn locate() -> zbus::Result<Option<(f64, f64)>> {
        let connection = Connection::system().await?;
        let manager = ManagerProxy::new(&connection).await?;
        let client = ClientProxy::builder(&connection)
            .path(manager.get_client().await?)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        client.set_desktop_id(DESKTOP_ID).await?;
        client.set_requested_accuracy_level(ACCURACY_NEIGHBORHOOD).await?;

        let mut updates = client.receive_location_updated().await?;
        client.start().await?;
        if updates.next().await.is_none() {
            return Ok(None);
        }

        let location = LocationProxy::builder(&connection)
            .path(client.location().await?)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let coordinates = (location.latitude().await?, location.longitude().await?);

        if let Err(e) = client.stop().await {
            tracing::debug!("could not stop GeoClue client: {e}");
        }
        Ok(Some(coordinates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn loc_field() {
        assert_eq!(parse_loc("60.1695,24.9354"), Some((60.1695, 24.9354)));
        assert_eq!(parse_loc("-33.8, 151.2"), Some((-33.8, 151.2)));
        assert_eq!(parse_loc("nowhere"), None);
    }

    #[tokio::test]
    async fn ip_geolocation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ip": "192.0.2.1",
                "city": "Helsinki",
                "loc": "60.1695,24.9354"
            })))
            .mount(&server)
            .await;

        let locator = Locator::ip_only(server.uri());
        let coordinates = locator.locate().await.expect("coordinates");
        assert_eq!(coordinates, (60.1695, 24.9354));
    }

    #[tokio::test]
    async fn missing_loc_is_unavailable() {
        let server = MockServer::start().await;
        let body = json!({"bogon": true});
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = Locator::ip_only(server.uri()).locate().await.unwrap_err();
        assert!(matches!(
            err,
            Error::ServiceUnavailable {
                service: "IP geolocation",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let locator = Locator::ip_only("http://127.0.0.1:9");
        let err = locator.locate().await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { .. }));
    }
}
