//! Styled text fragments and the terminal palette.

use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

use crate::classify::{UvTier, WeatherCategory};
use crate::temperature::Emphasis;

/// Semantic style of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Plain,
    Dim,
    Toponym,
    ToponymDim,
    Sun,
    SunDim,
    Weather(WeatherCategory),
    Warmer,
    Colder,
    Uv(UvTier),
}

impl From<Emphasis> for Tag {
    fn from(emphasis: Emphasis) -> Self {
        match emphasis {
            Emphasis::Neutral => Tag::Plain,
            Emphasis::Warmer => Tag::Warmer,
            Emphasis::Colder => Tag::Colder,
        }
    }
}

impl Tag {
    fn apply(self, text: &str) -> ColoredString {
        match self {
            Tag::Plain => text.normal(),
            Tag::Dim => text.dimmed(),
            Tag::Toponym => text.magenta(),
            Tag::ToponymDim => text.magenta().dimmed(),
            Tag::Sun => text.yellow(),
            Tag::SunDim => text.yellow().dimmed(),
            Tag::Weather(category) => match category {
                WeatherCategory::Clear => text.bright_black().reversed(),
                WeatherCategory::PartlyCloudy => text.white().dimmed().reversed(),
                WeatherCategory::Overcast => text.white().reversed(),
                WeatherCategory::Fog => text.bright_green().reversed(),
                WeatherCategory::Rain => text.bright_blue().reversed(),
                WeatherCategory::Snow => text.cyan().reversed(),
                WeatherCategory::Thunderstorm => text.bright_magenta().reversed(),
            },
            Tag::Warmer => text.bright_red(),
            Tag::Colder => text.bright_cyan(),
            Tag::Uv(tier) => match tier {
                UvTier::Low => text.bright_green(),
                UvTier::Moderate => text.bright_yellow(),
                UvTier::High => text.bright_red(),
                UvTier::VeryHigh => text.red(),
                UvTier::Extreme => text.magenta(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tag: Tag,
}

impl Span {
    pub fn new(text: impl Into<String>, tag: Tag) -> Self {
        Self { text: text.into(), tag }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tag::Plain)
    }

    pub fn paint(&self, color: bool) -> String {
        if color && self.tag != Tag::Plain {
            self.tag.apply(&self.text).to_string()
        } else {
            self.text.clone()
        }
    }
}

/// A row of spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, text: impl Into<String>, tag: Tag) -> Self {
        self.spans.push(Span::new(text, tag));
        self
    }

    pub fn plain(self, text: impl Into<String>) -> Self {
        self.push(text, Tag::Plain)
    }

    pub fn append(mut self, other: Line) -> Self {
        self.spans.extend(other.spans);
        self
    }

    /// Display width in terminal cells.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.width()).sum()
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn pad_left(self, width: usize) -> Self {
        let missing = width.saturating_sub(self.width());
        if missing == 0 {
            return self;
        }
        Line::new().plain(" ".repeat(missing)).append(self)
    }

    pub fn pad_right(self, width: usize) -> Self {
        let missing = width.saturating_sub(self.width());
        if missing == 0 {
            return self;
        }
        self.plain(" ".repeat(missing))
    }

    /// Drop unstyled trailing whitespace; colored cells are kept.
    pub fn trim_end(mut self) -> Self {
        while let Some(last) = self.spans.last_mut() {
            if last.tag != Tag::Plain {
                break;
            }
            let trimmed = last.text.trim_end().len();
            if trimmed == 0 {
                self.spans.pop();
            } else {
                last.text.truncate(trimmed);
                break;
            }
        }
        self
    }

    pub fn paint(&self, color: bool) -> String {
        self.spans.iter().map(|s| s.paint(color)).collect()
    }
}

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
const SUBSCRIPT_DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

/// Superscript digits and signs; other characters pass through.
pub fn superscript(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '+' => '⁺',
            '-' | '\u{2212}' => '⁻',
            '0'..='9' => SUPERSCRIPT_DIGITS[digit(c)],
            other => other,
        })
        .collect()
}

/// Subscript digits and signs; other characters pass through.
pub fn subscript(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '+' => '₊',
            '-' | '\u{2212}' => '₋',
            '0'..='9' => SUBSCRIPT_DIGITS[digit(c)],
            other => other,
        })
        .collect()
}

fn digit(c: char) -> usize {
    c as usize - '0' as usize
}
