//! Locale selection for weekday names and geocoder results.

use chrono::Locale;

const ENV_VARS: [&str; 3] = ["LC_ALL", "LC_TIME", "LANG"];
const DEFAULT_LANGUAGE: &str = "en";

/// The configured locale, else the first usable one from the environment.
pub fn locale_name(configured: Option<&str>) -> Option<String> {
    locale_name_with(configured, |var| std::env::var(var).ok())
}

fn locale_name_with(
    configured: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(ENV_VARS.iter().filter_map(|var| lookup(var)))
        .find(|name| is_usable(name))
}

fn is_usable(name: &str) -> bool {
    let base = base_name(name);
    !base.is_empty() && base != "C" && base != "POSIX"
}

/// `fi_FI.UTF-8@euro` → `fi_FI`.
fn base_name(name: &str) -> &str {
    let name = name.trim();
    let end = name.find(['.', '@']).unwrap_or(name.len());
    &name[..end]
}

/// The `chrono` locale for `name`, POSIX when unknown.
pub fn chrono_locale(name: Option<&str>) -> Locale {
    let Some(name) = name else {
        return Locale::POSIX;
    };
    Locale::try_from(base_name(name)).unwrap_or_else(|_| {
        tracing::debug!(locale = name, "no locale data, falling back to POSIX");
        Locale::POSIX
    })
}

/// BCP 47 style language tag for HTTP `Accept-Language`, e.g. `fi-FI`.
pub fn language_tag(name: Option<&str>) -> String {
    match name.map(base_name).filter(|base| is_usable(base)) {
        Some(base) => base.replace('_', "-"),
        None => DEFAULT_LANGUAGE.to_string(),
    }
}
