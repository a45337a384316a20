//! Temperature display and feels-like emphasis.
//!
//! Rounding is half away from zero (`f64::round`), so 2.5° shows as 3 and −2.5° as −3.

/// How the apparent temperature compares with the measured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Neutral,
    Warmer,
    Colder,
}

impl Emphasis {
    /// Warmer when it feels at least 2° warmer, colder when at least 5° colder.
    pub fn of(actual: f64, apparent: f64) -> Self {
        if apparent >= actual + 2.0 {
            Emphasis::Warmer
        } else if apparent <= actual - 5.0 {
            Emphasis::Colder
        } else {
            Emphasis::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    pub emphasis: Emphasis,
}

/// Rounded temperature with a true minus sign (U+2212) so columns line up.
pub fn format_temperature(value: f64) -> String {
    // as i64 so -0.4 doesn't show up as −0
    let rounded = value.round() as i64;
    if rounded < 0 {
        format!("\u{2212}{}", rounded.unsigned_abs())
    } else {
        rounded.to_string()
    }
}

pub fn annotate(actual: f64, apparent: f64) -> Annotated {
    Annotated {
        text: format_temperature(actual),
        emphasis: Emphasis::of(actual, apparent),
    }
}

/// Summarize a min/max pair as one annotated range, judged on the averages.
pub fn annotate_range(min: f64, max: f64, apparent_min: f64, apparent_max: f64) -> Annotated {
    let actual = (min + max) / 2.0;
    let apparent = (apparent_min + apparent_max) / 2.0;
    Annotated {
        text: format!("{}…{}", format_temperature(min), format_temperature(max)),
        emphasis: Emphasis::of(actual, apparent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_boundaries() {
        assert_eq!(annotate(0.0, 2.0).emphasis, Emphasis::Warmer);
        assert_eq!(annotate(0.0, 1.0).emphasis, Emphasis::Neutral);
        assert_eq!(annotate(0.0, -5.0).emphasis, Emphasis::Colder);
        assert_eq!(annotate(0.0, -4.0).emphasis, Emphasis::Neutral);
    }

    fn range_emphasis(min: f64, max: f64, apparent_min: f64, apparent_max: f64) -> Emphasis {
        annotate_range(min, max, apparent_min, apparent_max).emphasis
    }

    #[test]
    fn range_uses_averages() {
        assert_eq!(range_emphasis(0.0, 0.0, 2.0, 2.0), Emphasis::Warmer);
        assert_eq!(range_emphasis(0.0, 0.0, 1.0, 1.0), Emphasis::Neutral);
        assert_eq!(range_emphasis(0.0, 0.0, -5.0, -5.0), Emphasis::Colder);
        assert_eq!(range_emphasis(0.0, 0.0, -4.0, -4.0), Emphasis::Neutral);
        // Only the mean matters: one side far colder, the other slightly warmer.
        assert_eq!(range_emphasis(-2.0, 2.0, -8.0, 4.0), Emphasis::Neutral);
    }

    #[test]
    fn range_text() {
        assert_eq!(annotate_range(-3.4, 5.6, 0.0, 0.0).text, "−3…6");
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(format_temperature(2.5), "3");
        assert_eq!(format_temperature(2.49), "2");
        assert_eq!(format_temperature(-2.5), "\u{2212}3");
    }

    #[test]
    fn negative_zero_has_no_sign() {
        assert_eq!(format_temperature(-0.4), "0");
        assert_eq!(format_temperature(-0.0), "0");
    }

    #[test]
    fn minus_is_not_a_hyphen() {
        let text = annotate(-12.0, -12.0).text;
        assert_eq!(text, "−12");
        assert!(!text.contains('-'));
    }
}
