//! The terminal report: a 7-day forecast pane and a detail pane.

pub mod style;

use std::io::{self, Write};

use chrono::{Locale, NaiveDate};

use crate::classify::{classify, uv_tier, wind_glyph};
use crate::error::Result;
use crate::model::{Forecast, HOURS_PER_DAY};
use crate::moon::{FULL_MOON_GLYPH, MoonPhases};
use crate::temperature::{Annotated, annotate, annotate_range, format_temperature};
pub use style::{Line, Span, Tag, subscript, superscript};

pub const FORECAST_DAYS: usize = 7;
/// Terminals narrower than this get the stacked layout.
pub const WIDE_LAYOUT_MIN: u16 = 80;
/// Hours sampled for the temperature sparkline.
const SPARKLINE_HOURS: [usize; 5] = [2, 7, 12, 17, 22];
const RULER: &str = "00    06    12    18    24";
const NOW_MARKER: &str = "🐈";
const UV_LABEL: &str = "ᵁⱽ";
const CELSIUS: &str = "°C";

/// Inputs of a render that do not come from the forecast.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    /// Current hour in the forecast's timezone, marked on today's ruler.
    pub now_hour: u32,
    /// Locale for weekday names.
    pub locale: Locale,
}

/// One day of the forecast pane.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBlock {
    pub ruler: Line,
    /// 24 cells, one per hour: wind glyph on the condition color.
    pub strip: Line,
    pub weekday: Line,
    pub symbol: Line,
    pub min: Line,
    pub max: Line,
    pub uv: Line,
    pub moon: Line,
    pub sparkline: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub days: Vec<DayBlock>,
    pub details: Vec<Line>,
}

/// Build the report for a normalized forecast.
///
/// Fails on the first unsupported weather code or moon-phase error; nothing is
/// rendered partially.
pub fn render(
    forecast: &Forecast,
    label: &str,
    moon: &dyn MoonPhases,
    ctx: &RenderContext,
) -> Result<Report> {
    forecast.validate()?;
    let plain_ruler = subscript(RULER);
    let today_ruler = mark_hour(&plain_ruler, ctx.now_hour);

    let days = forecast.days().min(FORECAST_DAYS);
    let mut blocks = Vec::with_capacity(days);
    for day in 0..days {
        let ruler = if day == 0 { &today_ruler } else { &plain_ruler };
        blocks.push(render_day(forecast, day, ruler, moon, ctx)?);
    }

    Ok(Report {
        days: blocks,
        details: render_details(forecast, label, ctx)?,
    })
}

fn mark_hour(ruler: &str, hour: u32) -> String {
    let hour = (hour as usize).min(HOURS_PER_DAY - 1);
    ruler
        .chars()
        .take(hour)
        .chain(NOW_MARKER.chars())
        .chain(ruler.chars().skip(hour + 2))
        .collect()
}

fn render_day(
    forecast: &Forecast,
    day: usize,
    ruler: &str,
    moon: &dyn MoonPhases,
    ctx: &RenderContext,
) -> Result<DayBlock> {
    let hourly = &forecast.hourly;
    let daily = &forecast.daily;

    let mut strip = Line::new();
    for hour in 0..HOURS_PER_DAY {
        let i = Forecast::hour_index(day, hour);
        let (_, category) = classify(hourly.weather_code[i])?;
        strip = strip.push(wind_glyph(hourly.wind_speed[i]), Tag::Weather(category));
    }

    let date = daily.date[day];
    let (_, category) = classify(daily.weather_code[day])?;
    let min = annotate(
        daily.temperature_min[day],
        daily.apparent_temperature_min[day],
    );
    let max = annotate(
        daily.temperature_max[day],
        daily.apparent_temperature_max[day],
    );

    let uv = match daily.uv_index_max.as_ref().and_then(|uv| uv[day]) {
        Some(index) => Line::new()
            .plain(" ")
            .push(UV_LABEL, Tag::Dim)
            .push(subscript(&format_temperature(index)), Tag::Uv(uv_tier(index))),
        None => Line::new(),
    };

    let moon = if moon.has_full_moon(date, forecast.timezone)? {
        Line::new().plain(" ").plain(FULL_MOON_GLYPH)
    } else {
        Line::new()
    };

    let samples: Vec<String> = SPARKLINE_HOURS
        .iter()
        .map(|&hour| {
            let t = hourly.temperature[Forecast::hour_index(day, hour)];
            format!("{:>3}", format_temperature(t))
        })
        .collect();

    Ok(DayBlock {
        ruler: Line::new().plain(" ").push(ruler, Tag::Dim),
        strip,
        weekday: Line::new().push(weekday(date, ctx.locale), Tag::Dim).plain(" "),
        symbol: Line::new().plain(category.symbol()),
        min: Line::new().plain(" ").append(temperature(&min)).plain(" ").push("/", Tag::Dim),
        max: temperature(&max).plain(" ").push(CELSIUS, Tag::Dim),
        uv,
        moon,
        sparkline: Line::new().plain(superscript(&samples.join("  "))),
    })
}

fn weekday(date: NaiveDate, locale: Locale) -> String {
    date.format_localized("%a", locale).to_string()
}

fn temperature(annotated: &Annotated) -> Line {
    Line::new().push(annotated.text.clone(), annotated.emphasis.into())
}

fn render_details(forecast: &Forecast, label: &str, ctx: &RenderContext) -> Result<Vec<Line>> {
    let daily = &forecast.daily;
    let mut lines = Vec::new();

    let (primary, rest) = match label.rsplit_once(',') {
        Some((primary, rest)) => (primary, Some(rest.trim())),
        None => (label, None),
    };
    lines.push(Line::new().push(primary, Tag::Toponym));
    if let Some(rest) = rest.filter(|r| !r.is_empty()) {
        lines.push(Line::new().push(rest, Tag::ToponymDim));
    }
    lines.push(Line::new());

    let sun = format!(
        "☉  {}–{}",
        daily.sunrise[0].format("%H:%M"),
        daily.sunset[0].format("%H:%M")
    );
    let mut sun_line = Line::new().push(sun, Tag::Sun);
    if let Some(index) = daily.uv_index_clear_sky_max.as_ref().and_then(|uv| uv[0]) {
        sun_line = sun_line
            .plain("  ")
            .push(UV_LABEL, Tag::Dim)
            .push(superscript(&format_temperature(index)), Tag::Uv(uv_tier(index)));
    }
    lines.push(sun_line);

    let today = forecast
        .current
        .as_ref()
        .map_or(daily.date[0], |c| c.time.date());
    let today = superscript(&today.format("%Y-%m-%d").to_string());
    lines.push(Line::new().push(today, Tag::SunDim));
    lines.push(Line::new());

    match &forecast.current {
        Some(current) => {
            let (_, category) = classify(current.weather_code)?;
            let apparent = forecast.apparent_at(current.time).unwrap_or(current.temperature);
            let now = annotate(current.temperature, apparent);
            lines.push(
                Line::new()
                    .push(current.time.format("%H:%M").to_string(), Tag::Dim)
                    .plain("  ")
                    .plain(category.symbol())
                    .plain("  ")
                    .append(temperature(&now))
                    .plain(" ")
                    .push(CELSIUS, Tag::Dim),
            );
        }
        None => {
            let (_, category) = classify(daily.weather_code[0])?;
            let range = annotate_range(
                daily.temperature_min[0],
                daily.temperature_max[0],
                daily.apparent_temperature_min[0],
                daily.apparent_temperature_max[0],
            );
            lines.push(
                Line::new()
                    .push(weekday(daily.date[0], ctx.locale), Tag::Dim)
                    .plain("  ")
                    .plain(category.symbol())
                    .plain("  ")
                    .append(temperature(&range))
                    .plain(" ")
                    .push(CELSIUS, Tag::Dim),
            );
        }
    }

    Ok(lines)
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// Columns of the day row: strip, weekday, symbol, min, max, UV, moon.
const DAY_COLUMNS: [Align; 7] =
    [Align::Left, Align::Left, Align::Left, Align::Right, Align::Right, Align::Left, Align::Left];

impl Report {
    /// The forecast pane as equally wide lines: ruler, day row and sparkline per day.
    pub fn forecast_pane(&self) -> Vec<Line> {
        let mut rows: Vec<Vec<Line>> = Vec::with_capacity(self.days.len() * 3);
        for day in &self.days {
            rows.push(vec![day.ruler.clone()]);
            rows.push(vec![
                Line::new().plain("  ").append(day.strip.clone()),
                day.weekday.clone(),
                day.symbol.clone(),
                day.min.clone(),
                day.max.clone(),
                day.uv.clone(),
                day.moon.clone(),
            ]);
            rows.push(vec![Line::new().plain("  ").append(day.sparkline.clone())]);
        }
        grid(&DAY_COLUMNS, rows)
    }

    /// Lay both panes out for a terminal `width` columns wide.
    pub fn layout(&self, width: u16) -> Vec<Line> {
        let width = usize::from(width);
        let forecast = self.forecast_pane();
        let details_width = self.details.iter().map(Line::width).max().unwrap_or(0);

        if width < usize::from(WIDE_LAYOUT_MIN) {
            let align = width.max(details_width);
            let mut lines: Vec<Line> =
                self.details.iter().map(|l| l.clone().pad_left(align)).collect();
            lines.push(Line::new());
            lines.extend(forecast);
            return lines;
        }

        let forecast_width = forecast.first().map_or(0, Line::width);
        let right = width.saturating_sub(forecast_width + 2).max(details_width);
        let rows = forecast.len().max(self.details.len());
        (0..rows)
            .map(|i| {
                let left = forecast.get(i).cloned().unwrap_or_default().pad_right(forecast_width);
                let detail = self.details.get(i).cloned().unwrap_or_default().pad_left(right);
                left.plain("  ").append(detail)
            })
            .collect()
    }

    pub fn write(&self, width: u16, color: bool, out: &mut impl Write) -> io::Result<()> {
        for line in self.layout(width) {
            writeln!(out, "{}", line.trim_end().paint(color))?;
        }
        Ok(())
    }

    /// Uncolored text, as written to a terminal `width` columns wide.
    pub fn to_plain_string(&self, width: u16) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write(width, false, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Pad cells into aligned columns separated by one space. Short rows fill the
/// leading columns only.
fn grid(aligns: &[Align], rows: Vec<Vec<Line>>) -> Vec<Line> {
    let mut widths = vec![0; aligns.len()];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    rows.into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            let mut line = Line::new();
            for (i, (align, width)) in aligns.iter().zip(&widths).enumerate() {
                if i > 0 {
                    line = line.plain(" ");
                }
                let cell = cells.next().unwrap_or_default();
                line = line.append(match align {
                    Align::Left => cell.pad_right(*width),
                    Align::Right => cell.pad_left(*width),
                });
            }
            line
        })
        .collect()
}

/// Render `forecast` and print it to stdout, colored when stdout is a terminal.
pub fn print(
    forecast: &Forecast,
    label: &str,
    moon: &dyn MoonPhases,
    ctx: &RenderContext,
    width: u16,
) -> anyhow::Result<()> {
    let report = render(forecast, label, moon, ctx)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let color = colored::control::SHOULD_COLORIZE.should_colorize();
    report.write(width, color, &mut out)?;
    Ok(())
}
