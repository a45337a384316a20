use crate::config::DefaultLocation;
use crate::error::Result;
use crate::geocode::Geocoder;
use crate::geolocate::Locator;
use crate::model::Location;

/// Pick the report location: the query if given, else the configured default,
/// else autodetected coordinates named by reverse geocoding.
pub async fn resolve_location(
    geocoder: &Geocoder,
    locator: &Locator,
    query: Option<&str>,
    default: Option<&DefaultLocation>,
) -> Result<Location> {
    if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
        tracing::debug!(%query, "resolving location from arguments");
        return geocoder.resolve(query).await;
    }

    match default {
        Some(DefaultLocation::Query(query)) => {
            tracing::debug!(%query, "resolving configured location");
            geocoder.resolve(query).await
        }
        Some(DefaultLocation::Place {
            name,
            latitude,
            longitude,
        }) => {
            tracing::debug!(?name, latitude, longitude, "using configured coordinates");
            Ok(Location::new(name.clone(), *latitude, *longitude))
        }
        None => {
            let (latitude, longitude) = locator.locate().await?;
            tracing::debug!(latitude, longitude, "autodetected");
            geocoder.name_or_bare(latitude, longitude).await
        }
    }
}
