use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::Result;
use crate::model::{Forecast, Location};

pub mod open_meteo;

pub use open_meteo::OpenMeteo;

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Seven days of hourly and daily data in the location's local time.
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast>;

    async fn forecast_for(&self, location: &Location) -> Result<Forecast> {
        self.fetch_forecast(location.latitude, location.longitude).await
    }
}
