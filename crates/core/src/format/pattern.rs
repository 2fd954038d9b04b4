//! Built-in formatters on top of chrono strftime patterns
//!
//! Output is locale-neutral (English words, ISO-like dates); the locale is
//! carried along so callers and the cache can tell instances apart.
//!
//! Recognized options:
//!
//! | Kind | Option | Values |
//! |------|--------|--------|
//! | date/time | `pattern` | strftime pattern, overrides the styles |
//! | date/time | `dateStyle`, `timeStyle` | `short`, `medium`, `long`, `full` |
//! | date/time | `hour12` | boolean |
//! | date/time | `timeZone` | IANA name, defaults to the instant's zone |
//! | relative time | `numeric` | `always` (default), `auto` |
//! | number | `minimumFractionDigits`, `maximumFractionDigits` | 0 to 20 |
//! | number | `useGrouping` | boolean, default true |
//! | plural rules | `type` | `cardinal` (default), `ordinal` |

use std::fmt::Write as _;
use std::sync::Arc;

use atemporal_domain::TimeUnit;
use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;

use super::ports::{Formatter, FormatterProvider, SharedFormatter};
use super::{FormatOptions, FormatValue, FormatterKind, OptionValue};
use crate::errors::{FormatError, FormatResult};

const DEFAULT_PATTERN: &str = "%Y-%m-%d %H:%M:%S";
const MAX_FRACTION_DIGITS: i64 = 20;

/// Provider of the built-in formatters
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternFormatterProvider;

impl FormatterProvider for PatternFormatterProvider {
    fn create(
        &self,
        kind: FormatterKind,
        locale: &str,
        options: &FormatOptions,
    ) -> FormatResult<SharedFormatter> {
        let locale = locale.to_string();
        Ok(match kind {
            FormatterKind::DateTime => Arc::new(DateTimeFormatter::new(locale, options)?),
            FormatterKind::RelativeTime => Arc::new(RelativeTimeFormatter::new(locale, options)?),
            FormatterKind::Number => Arc::new(NumberFormatter::new(locale, options)?),
            FormatterKind::PluralRules => Arc::new(PluralRulesFormatter::new(locale, options)?),
        })
    }
}

fn invalid_option(name: &str, value: Option<&OptionValue>) -> FormatError {
    FormatError::InvalidOption {
        name: name.to_string(),
        value: value.map(ToString::to_string).unwrap_or_default(),
    }
}

fn unsupported(kind: FormatterKind, value: &FormatValue) -> FormatError {
    FormatError::UnsupportedValue { kind, value: value.kind_name() }
}

/// Look up a string option restricted to `allowed`
fn choice<'a>(
    options: &'a FormatOptions,
    name: &str,
    allowed: &[&str],
) -> FormatResult<Option<&'a str>> {
    match options.get(name) {
        None => Ok(None),
        Some(OptionValue::Str(value)) if allowed.contains(&value.as_str()) => Ok(Some(value.as_str())),
        other => Err(invalid_option(name, other)),
    }
}

#[derive(Debug)]
struct DateTimeFormatter {
    locale: String,
    pattern: String,
    zone: Option<Tz>,
}

impl DateTimeFormatter {
    fn new(locale: String, options: &FormatOptions) -> FormatResult<Self> {
        const STYLES: &[&str] = &["short", "medium", "long", "full"];

        let hour12 = options.get_bool("hour12").unwrap_or(false);
        let pattern = match options.get_str("pattern") {
            Some(pattern) => pattern.to_string(),
            None => {
                let date = choice(options, "dateStyle", STYLES)?.map(date_pattern);
                let time = choice(options, "timeStyle", STYLES)?.map(|style| time_pattern(style, hour12));
                match (date, time) {
                    (Some(date), Some(time)) => format!("{date} {time}"),
                    (Some(date), None) => date.to_string(),
                    (None, Some(time)) => time,
                    (None, None) => DEFAULT_PATTERN.to_string(),
                }
            }
        };

        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(invalid_option("pattern", Some(&OptionValue::Str(pattern))));
        }

        let zone = match options.get("timeZone") {
            None => None,
            Some(OptionValue::Str(name)) => {
                Some(name.parse::<Tz>().map_err(|_| invalid_option("timeZone", options.get("timeZone")))?)
            }
            other => return Err(invalid_option("timeZone", other)),
        };

        Ok(Self { locale, pattern, zone })
    }
}

fn date_pattern(style: &str) -> &'static str {
    match style {
        "short" => "%Y-%m-%d",
        "medium" => "%b %-d, %Y",
        "long" => "%B %-d, %Y",
        _ => "%A, %B %-d, %Y",
    }
}

fn time_pattern(style: &str, hour12: bool) -> String {
    let clock = if hour12 { "%-I:%M" } else { "%H:%M" };
    let mut pattern = clock.to_string();
    if style != "short" {
        pattern.push_str(":%S");
    }
    if hour12 {
        pattern.push_str(" %p");
    }
    if matches!(style, "long" | "full") {
        pattern.push_str(" %Z");
    }
    pattern
}

impl Formatter for DateTimeFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::DateTime
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn format(&self, value: &FormatValue) -> FormatResult<String> {
        let FormatValue::Instant(instant) = value else {
            return Err(unsupported(self.kind(), value));
        };
        let instant = self.zone.map_or(*instant, |zone| instant.with_zone(zone));
        let datetime = instant.to_datetime()?;

        let mut out = String::with_capacity(self.pattern.len() + 16);
        write!(out, "{}", datetime.format(&self.pattern))
            .map_err(|_| invalid_option("pattern", Some(&OptionValue::Str(self.pattern.clone()))))?;
        Ok(out)
    }
}

#[derive(Debug)]
struct RelativeTimeFormatter {
    locale: String,
    auto: bool,
}

impl RelativeTimeFormatter {
    fn new(locale: String, options: &FormatOptions) -> FormatResult<Self> {
        let auto = choice(options, "numeric", &["always", "auto"])? == Some("auto");
        Ok(Self { locale, auto })
    }

    fn phrase(&self, value: i64, unit: TimeUnit) -> String {
        if self.auto {
            match (value, unit) {
                (-1, TimeUnit::Day) => return "yesterday".to_string(),
                (0, TimeUnit::Day) => return "today".to_string(),
                (1, TimeUnit::Day) => return "tomorrow".to_string(),
                (0, unit) if unit <= TimeUnit::Second => return "now".to_string(),
                (-1, unit) => return format!("last {unit}"),
                (0, unit) => return format!("this {unit}"),
                (1, unit) => return format!("next {unit}"),
                _ => {}
            }
        }

        let count = value.unsigned_abs();
        let plural = if count == 1 { "" } else { "s" };
        if value < 0 {
            format!("{count} {unit}{plural} ago")
        } else {
            format!("in {count} {unit}{plural}")
        }
    }
}

impl Formatter for RelativeTimeFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::RelativeTime
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn format(&self, value: &FormatValue) -> FormatResult<String> {
        match value {
            FormatValue::Relative { value, unit } => Ok(self.phrase(*value, *unit)),
            other => Err(unsupported(self.kind(), other)),
        }
    }
}

#[derive(Debug)]
struct NumberFormatter {
    locale: String,
    min_fraction: usize,
    max_fraction: usize,
    grouping: bool,
}

impl NumberFormatter {
    fn new(locale: String, options: &FormatOptions) -> FormatResult<Self> {
        let digits = |name: &str, default: i64| -> FormatResult<usize> {
            match options.get(name) {
                None => Ok(default as usize),
                Some(OptionValue::Int(value)) if (0..=MAX_FRACTION_DIGITS).contains(value) => {
                    Ok(*value as usize)
                }
                other => Err(invalid_option(name, other)),
            }
        };
        let min_fraction = digits("minimumFractionDigits", 0)?;
        let max_fraction = digits("maximumFractionDigits", 3)?.max(min_fraction);
        let grouping = match options.get("useGrouping") {
            None => true,
            Some(OptionValue::Bool(value)) => *value,
            other => return Err(invalid_option("useGrouping", other)),
        };
        Ok(Self { locale, min_fraction, max_fraction, grouping })
    }

    fn render(&self, value: f64) -> String {
        let mut digits = format!("{:.*}", self.max_fraction, value.abs());
        if let Some(dot) = digits.find('.') {
            let keep = dot + 1 + self.min_fraction;
            let trimmed = digits.trim_end_matches('0').len().max(keep);
            digits.truncate(if trimmed == dot + 1 { dot } else { trimmed });
        }

        let (integer, fraction) = digits.split_at(digits.find('.').unwrap_or(digits.len()));
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if value < 0.0 && digits.bytes().any(|b| matches!(b, b'1'..=b'9')) {
            out.push('-');
        }
        for (i, ch) in integer.chars().enumerate() {
            if self.grouping && i > 0 && (integer.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out.push_str(fraction);
        out
    }
}

impl Formatter for NumberFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::Number
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn format(&self, value: &FormatValue) -> FormatResult<String> {
        match value {
            FormatValue::Number(number) if number.is_finite() => Ok(self.render(*number)),
            FormatValue::Number(_) => {
                Err(FormatError::UnsupportedValue { kind: self.kind(), value: "non-finite number" })
            }
            other => Err(unsupported(self.kind(), other)),
        }
    }
}

#[derive(Debug)]
struct PluralRulesFormatter {
    locale: String,
    ordinal: bool,
}

impl PluralRulesFormatter {
    fn new(locale: String, options: &FormatOptions) -> FormatResult<Self> {
        let ordinal = choice(options, "type", &["cardinal", "ordinal"])? == Some("ordinal");
        Ok(Self { locale, ordinal })
    }

    fn category(&self, value: f64) -> &'static str {
        let integral = value.fract() == 0.0;
        if !self.ordinal {
            return if integral && value.abs() == 1.0 { "one" } else { "other" };
        }
        if !integral {
            return "other";
        }
        let n = value.abs() as u64;
        match (n % 10, n % 100) {
            (1, tens) if tens != 11 => "one",
            (2, tens) if tens != 12 => "two",
            (3, tens) if tens != 13 => "few",
            _ => "other",
        }
    }
}

impl Formatter for PluralRulesFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::PluralRules
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn format(&self, value: &FormatValue) -> FormatResult<String> {
        match value {
            FormatValue::Number(number) => Ok(self.category(*number).to_string()),
            other => Err(unsupported(self.kind(), other)),
        }
    }
}
