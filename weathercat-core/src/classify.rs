//! Lookup tables turning raw readings into glyphs and theme categories.

use unicode_width::UnicodeWidthStr;

use crate::error::{Error, Result};

/// Condition groups of the WMO weather interpretation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCategory {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherCategory {
    pub const ALL: [WeatherCategory; 7] = [
        WeatherCategory::Clear,
        WeatherCategory::PartlyCloudy,
        WeatherCategory::Overcast,
        WeatherCategory::Fog,
        WeatherCategory::Rain,
        WeatherCategory::Snow,
        WeatherCategory::Thunderstorm,
    ];

    pub fn glyph(self) -> &'static str {
        match self {
            WeatherCategory::Clear => "\u{2600}\u{FE0F}",
            WeatherCategory::PartlyCloudy => "\u{1F324}\u{FE0F}",
            WeatherCategory::Overcast => "\u{2601}\u{FE0F}",
            WeatherCategory::Fog => "\u{1F32B}\u{FE0F}",
            WeatherCategory::Rain => "\u{1F327}\u{FE0F}",
            WeatherCategory::Snow => "\u{2744}\u{FE0F}",
            WeatherCategory::Thunderstorm => "\u{26A1}",
        }
    }

    /// Glyph padded to two terminal cells.
    ///
    /// Emoji report a width of one or two depending on the presentation selector, so
    /// narrow ones get a trailing space to keep the symbol column aligned.
    pub fn symbol(self) -> String {
        let glyph = self.glyph();
        if glyph.width() < 2 {
            format!("{glyph} ")
        } else {
            glyph.to_string()
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCategory::Clear => "clear",
            WeatherCategory::PartlyCloudy => "partly_cloudy",
            WeatherCategory::Overcast => "overcast",
            WeatherCategory::Fog => "fog",
            WeatherCategory::Rain => "rain",
            WeatherCategory::Snow => "snow",
            WeatherCategory::Thunderstorm => "thunderstorm",
        }
    }
}

impl std::fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a WMO weather interpretation code to its glyph and category.
///
/// See <https://open-meteo.com/en/docs#weathervariables>.
pub fn classify(code: u8) -> Result<(&'static str, WeatherCategory)> {
    let category = match code {
        0 => WeatherCategory::Clear,
        1 | 2 => WeatherCategory::PartlyCloudy,
        3 => WeatherCategory::Overcast,
        45 | 48 => WeatherCategory::Fog,
        51 | 53 | 55 | 56 | 57 | 61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => WeatherCategory::Rain,
        71 | 73 | 75 | 77 | 85 | 86 => WeatherCategory::Snow,
        95 | 96 | 99 => WeatherCategory::Thunderstorm,
        other => return Err(Error::UnsupportedCode(other)),
    };
    Ok((category.glyph(), category))
}

/// Wind speed bands, after the Finnish Meteorological Institute's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindTier {
    Calm,
    Light,
    Moderate,
    Strong,
    Max,
}

impl WindTier {
    pub fn from_speed(speed_m_s: f64) -> Self {
        if speed_m_s < 3.5 {
            WindTier::Calm
        } else if speed_m_s < 7.5 {
            WindTier::Light
        } else if speed_m_s < 13.5 {
            WindTier::Moderate
        } else if speed_m_s < 20.5 {
            WindTier::Strong
        } else {
            WindTier::Max
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            WindTier::Calm => " ",
            WindTier::Light => "⣀",
            WindTier::Moderate => "⣤",
            WindTier::Strong => "⣶",
            WindTier::Max => "⣿",
        }
    }
}

/// Glyph for a wind speed in metres per second.
pub fn wind_glyph(speed_m_s: f64) -> &'static str {
    WindTier::from_speed(speed_m_s).glyph()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UvTier {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvTier {
    pub const ALL: [UvTier; 5] =
        [UvTier::Low, UvTier::Moderate, UvTier::High, UvTier::VeryHigh, UvTier::Extreme];
}

/// Tier of a UV index as displayed, i.e. after rounding.
pub fn uv_tier(index: f64) -> UvTier {
    let index = index.round();
    if index < 3.0 {
        UvTier::Low
    } else if index < 6.0 {
        UvTier::Moderate
    } else if index < 8.0 {
        UvTier::High
    } else if index < 11.0 {
        UvTier::VeryHigh
    } else {
        UvTier::Extreme
    }
}
