//! Core library for the `weathercat` CLI.
//!
//! This crate defines:
//! - The forecast model and its normalization
//! - WMO code, wind and UV classification
//! - The terminal report renderer
//! - Moon phases from the JPL DE421 ephemeris (`moon` feature)
//! - Adapters for Open-Meteo, Nominatim and location autodetection
//! - Configuration handling
//!
//! It is used by `weathercat-cli`, but can also be reused by other binaries.

pub mod classify;
pub mod config;
pub mod error;
pub mod geocode;
pub mod geolocate;
pub mod locale;
pub mod location;
pub mod model;
pub mod moon;
pub mod normalize;
pub mod provider;
pub mod render;
pub mod temperature;

#[cfg(feature = "moon")]
pub mod ephemeris;

pub use config::{Config, DefaultLocation};
pub use error::{Error, Result};
pub use geocode::Geocoder;
pub use geolocate::{Locator, autodetect};
pub use location::resolve_location;
pub use model::{Forecast, Location};
pub use moon::{MoonPhases, NoMoon, moon_phases};
pub use normalize::normalize;
pub use provider::{ForecastProvider, OpenMeteo};
pub use render::{RenderContext, Report, print, render};
