//! Lunar phases from the JPL DE421 planetary ephemeris.

use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anise::almanac::Almanac;
use anise::constants::frames::{EARTH_J2000, MOON_J2000, SUN_J2000};
use anise::prelude::Epoch;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::moon::MoonPhases;

pub const DE421_FILENAME: &str = "de421.bsp";
pub const DE421_URL: &str = "https://ssd.jpl.nasa.gov/ftp/eph/planets/bsp/de421.bsp";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);
/// Obliquity of the ecliptic at J2000 (IAU 2006), in degrees.
const OBLIQUITY_J2000: f64 = 84_381.406 / 3600.0;
const FULL_MOON: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    Sun,
    Moon,
}

/// Earth-centred positions in the J2000 equatorial frame, in km.
trait Sky {
    fn geocentric(&self, body: Body, at: DateTime<Utc>) -> Result<[f64; 3]>;
}

impl Sky for Almanac {
    fn geocentric(&self, body: Body, at: DateTime<Utc>) -> Result<[f64; 3]> {
        let target = match body {
            Body::Sun => SUN_J2000,
            Body::Moon => MOON_J2000,
        };
        let state = self
            .translate(target, EARTH_J2000, epoch(at), None)
            .map_err(|e| Error::Ephemeris(format!("no {body:?} position at {at}: {e}")))?;
        let r = state.radius_km;
        Ok([r.x, r.y, r.z])
    }
}

/// Lazily loaded DE421 kernel: read from the cache path, downloaded on first need.
pub struct Ephemeris {
    path: PathBuf,
    url: String,
    almanac: OnceCell<Almanac>,
}

impl fmt::Debug for Ephemeris {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ephemeris")
            .field("path", &self.path)
            .field("url", &self.url)
            .field("loaded", &self.almanac.get().is_some())
            .finish()
    }
}

impl Ephemeris {
    pub fn new(path: PathBuf, url: impl Into<String>) -> Self {
        Self { path, url: url.into(), almanac: OnceCell::new() }
    }

    /// DE421 cached in `data_dir`, fetched from JPL when missing.
    pub fn de421(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DE421_FILENAME), DE421_URL)
    }

    fn almanac(&self) -> Result<&Almanac> {
        if let Some(almanac) = self.almanac.get() {
            return Ok(almanac);
        }
        let almanac = self.load()?;
        Ok(self.almanac.get_or_init(|| almanac))
    }

    fn load(&self) -> Result<Almanac> {
        if !self.path.exists() {
            self.download()?;
        }
        let path = self
            .path
            .to_str()
            .ok_or_else(|| Error::Ephemeris(format!("non UTF-8 path {}", self.path.display())))?;

        let almanac = Almanac::new(path)
            .map_err(|e| Error::Ephemeris(format!("could not load {path}: {e}")))?;
        tracing::debug!("Loaded {path}");
        Ok(almanac)
    }

    fn download(&self) -> Result<()> {
        tracing::info!("Downloading ephemeris DE421 from {}", self.url);

        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| Error::Ephemeris(e.to_string()))?;
        let data = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| Error::Ephemeris(format!("download from {} failed: {e}", self.url)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = self.path.with_extension("part");
        let mut file = fs::File::create(&partial)?;
        file.write_all(&data)?;
        file.sync_all()?;
        fs::rename(&partial, &self.path)?;
        tracing::debug!("Saved {}", self.path.display());
        Ok(())
    }

    /// Moon−Sun difference of geocentric ecliptic longitude, in [0, 360).
    pub fn phase_angle(&self, at: DateTime<Utc>) -> Result<f64> {
        phase_of(self.almanac()?, at)
    }

    /// Whether the phase angle passes 180° in `(start, end]`.
    pub fn full_moon_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<bool> {
        full_moon_in(self.almanac()?, start, end)
    }
}

impl MoonPhases for Ephemeris {
    fn has_full_moon(&self, date: NaiveDate, timezone: Tz) -> Result<bool> {
        full_moon_on(self.almanac()?, date, timezone)
    }
}

fn phase_of(sky: &impl Sky, at: DateTime<Utc>) -> Result<f64> {
    let moon = ecliptic_longitude(sky.geocentric(Body::Moon, at)?);
    let sun = ecliptic_longitude(sky.geocentric(Body::Sun, at)?);
    Ok((moon - sun).rem_euclid(360.0))
}

fn full_moon_in(sky: &impl Sky, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<bool> {
    let first = phase_of(sky, start)?;
    // The phase angle only grows, about 12° a day, so one day never wraps twice.
    let advance = (phase_of(sky, end)? - first).rem_euclid(360.0);
    Ok(first < FULL_MOON && first + advance >= FULL_MOON)
}

fn full_moon_on(sky: &impl Sky, date: NaiveDate, timezone: Tz) -> Result<bool> {
    let start = local_midnight(date, timezone)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| Error::data(format!("no day after {date}")))?;
    let end = local_midnight(next, timezone)?;
    full_moon_in(sky, start, end)
}

/// Start of `date` in `timezone`, as UTC.
fn local_midnight(date: NaiveDate, timezone: Tz) -> Result<DateTime<Utc>> {
    // A DST change at midnight skips it; the day then starts an hour later.
    [0, 1]
        .into_iter()
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|local| timezone.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::data(format!("no local midnight on {date} in {timezone}")))
}

fn epoch(at: DateTime<Utc>) -> Epoch {
    let seconds = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) * 1e-9;
    Epoch::from_unix_seconds(seconds)
}

/// Longitude in degrees of an equatorial J2000 vector, on the J2000 ecliptic.
fn ecliptic_longitude([x, y, z]: [f64; 3]) -> f64 {
    let (sin_e, cos_e) = OBLIQUITY_J2000.to_radians().sin_cos();
    let ecliptic_y = y * cos_e + z * sin_e;
    ecliptic_y.atan2(x).to_degrees().rem_euclid(360.0)
}
