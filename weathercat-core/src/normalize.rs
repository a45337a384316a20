use crate::model::Forecast;

/// Highest code that is a sky-cover reading rather than a weather event.
const SKY_COVER_MAX: u8 = 3;

/// Replace calm daily codes with the rounded mean of the day's hourly codes.
///
/// The daily code is the most severe condition of the day, but codes 0..=3 (clear to
/// overcast) are not ordered by severity: one overcast hour would paint the whole day
/// grey. Days with an actual weather event pass through unchanged.
pub fn normalize(raw: &Forecast) -> Forecast {
    let mut result = raw.clone();
    for (day, code) in result.daily.weather_code.iter_mut().enumerate() {
        if *code > SKY_COVER_MAX {
            continue;
        }
        let hours = raw.day_codes(day);
        let mean = hours.iter().map(|&c| f64::from(c)).sum::<f64>() / hours.len() as f64;
        *code = mean.round() as u8;
    }
    result
}
