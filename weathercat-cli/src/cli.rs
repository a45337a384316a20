use std::ffi::OsString;

use anyhow::Context;
use chrono::{Timelike, Utc};
use clap::{Parser, Subcommand};
use inquire::Text;

use weathercat_core::{
    Config, DefaultLocation, ForecastProvider, Geocoder, Locator, MoonPhases, NoMoon, OpenMeteo,
    RenderContext, locale, moon_phases, normalize, render, resolve_location,
};

/// Used when the terminal size cannot be queried.
const DEFAULT_WIDTH: u16 = 80;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathercat", version, about = "Weather report in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Place name or coordinates, e.g. "Hölmölä" or "61.0, 24.4".
    /// Defaults to the configured location, then to autodetection.
    #[arg(allow_negative_numbers = true)]
    pub location: Vec<String>,

    /// Verbose logging on stderr.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Leave out full-moon markers (no ephemeris download).
    #[arg(long)]
    pub no_moon: bool,
}

/// Splits words such as `-45.3,` or `-45.3,-12.1` into numbers and commas.
///
/// clap takes a hyphenated word that is not a plain number for a cluster of short
/// flags, so signed coordinates glued to a comma would be rejected.
pub fn coordinate_words(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut words = Vec::new();
    for arg in args {
        match arg.to_str() {
            Some(word) if is_signed_number_start(word) && word.contains(',') => {
                for (i, part) in word.split(',').enumerate() {
                    if i > 0 {
                        words.push(OsString::from(","));
                    }
                    let part = part.trim();
                    if !part.is_empty() {
                        words.push(OsString::from(part));
                    }
                }
            }
            _ => words.push(arg),
        }
    }
    words
}

fn is_signed_number_start(word: &str) -> bool {
    word.strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit() || c == '.')
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the default location and locale interactively.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure) => configure().await,
            None => self.report().await,
        }
    }

    /// Space-joined positional words, if any.
    fn query(&self) -> Option<String> {
        (!self.location.is_empty()).then(|| self.location.join(" "))
    }

    async fn report(&self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let locale_name = locale::locale_name(config.locale.as_deref());
        tracing::debug!(?locale_name, "locale");

        let geocoder = Geocoder::new(locale::language_tag(locale_name.as_deref()))?;
        let location = resolve_location(
            &geocoder,
            &Locator::default(),
            self.query().as_deref(),
            config.default_location.as_ref(),
        )
        .await?;
        tracing::debug!(?location, "resolved location");

        let timezone = forecast_timezone(config.timezone.as_deref());
        tracing::debug!(?timezone, "forecast timezone");
        let provider = OpenMeteo::new(timezone)?;
        let forecast = normalize(&provider.forecast_for(&location).await?);

        let moon: Box<dyn MoonPhases + Send> = if self.no_moon {
            Box::new(NoMoon)
        } else {
            moon_phases(&Config::data_dir()?)
        };

        let width = crossterm::terminal::size()
            .map(|(w, _)| w)
            .unwrap_or(DEFAULT_WIDTH);
        let ctx = RenderContext {
            now_hour: Utc::now().with_timezone(&forecast.timezone).hour(),
            locale: locale::chrono_locale(locale_name.as_deref()),
        };
        let label = location.label();

        // The ephemeris may be fetched with a blocking client on first use.
        tokio::task::spawn_blocking(move || {
            render::print(&forecast, &label, moon.as_ref(), &ctx, width)
        })
        .await
        .context("Rendering task failed")?
    }
}

/// The configured zone, else this computer's, so report times follow the user's clock.
fn forecast_timezone(configured: Option<&str>) -> Option<String> {
    configured.map(str::to_string).or_else(|| {
        iana_time_zone::get_timezone()
            .inspect_err(|e| tracing::debug!("host timezone unknown: {e}"))
            .ok()
    })
}

async fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let query = Text::new("Default location:")
        .with_help_message("Place name or coordinates; leave empty to autodetect")
        .prompt()?;
    let locale_input = Text::new("Locale:")
        .with_default(config.locale.as_deref().unwrap_or(""))
        .with_help_message("e.g. fi_FI.UTF-8; leave empty to follow the environment")
        .prompt()?;

    let locale_input = locale_input.trim();
    config.locale = (!locale_input.is_empty()).then(|| locale_input.to_string());

    let query = query.trim();
    config.default_location = if query.is_empty() {
        None
    } else {
        let locale_name = locale::locale_name(config.locale.as_deref());
        let language = locale::language_tag(locale_name.as_deref());
        let location = Geocoder::new(language)?.resolve(query).await?;
        println!("Default location: {}", location.label());
        Some(DefaultLocation::from(&location))
    };

    config.save()?;
    println!(
        "Configuration saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
