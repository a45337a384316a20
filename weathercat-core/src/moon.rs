use std::path::Path;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::Result;

pub const FULL_MOON_GLYPH: &str = "🌕";

/// Source of full-moon dates for the report.
pub trait MoonPhases {
    /// Whether a full moon occurs during `date`, midnight to midnight in `timezone`.
    fn has_full_moon(&self, date: NaiveDate, timezone: Tz) -> Result<bool>;
}

/// Stand-in used when moon phases are disabled or not compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMoon;

impl MoonPhases for NoMoon {
    fn has_full_moon(&self, _date: NaiveDate, _timezone: Tz) -> Result<bool> {
        Ok(false)
    }
}

/// The best available moon-phase source: DE421 cached under `data_dir` when the
/// `moon` feature is compiled in, [`NoMoon`] otherwise.
///
/// Nothing is read or downloaded until the first question is asked.
pub fn moon_phases(data_dir: &Path) -> Box<dyn MoonPhases + Send> {
    #[cfg(feature = "moon")]
    {
        Box::new(crate::ephemeris::Ephemeris::de421(data_dir))
    }
    #[cfg(not(feature = "moon"))]
    {
        tracing::debug!(dir = %data_dir.display(), "moon phases not compiled in");
        Box::new(NoMoon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_moon_is_always_false() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        for offset in 0..400 {
            let date = start + chrono::Duration::days(offset);
            for tz in [
                Tz::UTC,
                chrono_tz::Europe::Helsinki,
                chrono_tz::Pacific::Auckland,
            ] {
                assert!(!NoMoon.has_full_moon(date, tz).expect("never fails"));
            }
        }
    }

    #[test]
    fn capability_is_lazy() {
        // A directory that does not exist: construction must not touch it.
        let phases = moon_phases(Path::new("/nonexistent/weathercat"));
        drop(phases);
    }
}
