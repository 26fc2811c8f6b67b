//! Typed field values.
//!
//! FileMaker sends every value as text. The layout metadata declares what the
//! text means, and the datasource node declares how dates and times are
//! written. [`FieldValue::parse`] applies both, falling back to plain text when
//! a value does not match its declared type.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// Result type declared by a field definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Time,
    Timestamp,
    Container,
}

impl FieldType {
    /// Map the `result` attribute of a field definition. Unknown values are
    /// treated as text.
    pub fn from_result(result: &str) -> Self {
        match result {
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "time" => FieldType::Time,
            "timestamp" => FieldType::Timestamp,
            "container" => FieldType::Container,
            _ => FieldType::Text,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Time => write!(f, "time"),
            FieldType::Timestamp => write!(f, "timestamp"),
            FieldType::Container => write!(f, "container"),
        }
    }
}

/// Date and time patterns in FileMaker notation, e.g. `MM/dd/yyyy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeFormats {
    pub date: String,
    pub time: String,
    pub timestamp: String,
}

pub const DEFAULT_DATE_FORMAT: &str = "MM/dd/yyyy";
pub const DEFAULT_TIME_FORMAT: &str = "HH:mm:ss";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "MM/dd/yyyy HH:mm:ss";

impl Default for DateTimeFormats {
    fn default() -> Self {
        Self {
            date: DEFAULT_DATE_FORMAT.to_string(),
            time: DEFAULT_TIME_FORMAT.to_string(),
            timestamp: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl DateTimeFormats {
    /// Build formats from optional datasource attributes.
    pub fn from_attributes(date: Option<&str>, time: Option<&str>, timestamp: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            date: date.map(str::to_string).unwrap_or(defaults.date),
            time: time.map(str::to_string).unwrap_or(defaults.time),
            timestamp: timestamp.map(str::to_string).unwrap_or(defaults.timestamp),
        }
    }
}

/// Translate a FileMaker pattern into a chrono format string.
fn to_chrono(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        let directive = match c {
            'y' if run >= 4 => Some("%Y"),
            'y' => Some("%y"),
            'M' if run >= 4 => Some("%B"),
            'M' if run == 3 => Some("%b"),
            'M' => Some("%m"),
            'd' => Some("%d"),
            'H' => Some("%H"),
            'h' => Some("%I"),
            'm' => Some("%M"),
            's' => Some("%S"),
            'a' => Some("%p"),
            _ => None,
        };
        match directive {
            Some(directive) => out.push_str(directive),
            None => {
                for _ in 0..run {
                    if c == '%' {
                        out.push_str("%%");
                    } else {
                        out.push(c);
                    }
                }
            }
        }
        i += run;
    }
    out
}

/// The content of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Container reference path, kept verbatim.
    ContainerRef(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Parse `raw` according to the declared type.
    ///
    /// Empty input is always `Text("")`. Values that do not parse as their
    /// declared type are kept as `Text(raw)`.
    pub fn parse(raw: &str, field_type: FieldType, formats: &DateTimeFormats) -> Self {
        if raw.is_empty() {
            return FieldValue::default();
        }
        let trimmed = raw.trim();
        let parsed = match field_type {
            FieldType::Text => None,
            FieldType::Number => parse_number(trimmed).map(FieldValue::Number),
            FieldType::Date => NaiveDate::parse_from_str(trimmed, &to_chrono(&formats.date))
                .ok()
                .map(FieldValue::Date),
            FieldType::Time => NaiveTime::parse_from_str(trimmed, &to_chrono(&formats.time))
                .ok()
                .map(FieldValue::Time),
            FieldType::Timestamp => {
                NaiveDateTime::parse_from_str(trimmed, &to_chrono(&formats.timestamp))
                    .ok()
                    .map(FieldValue::Timestamp)
            }
            FieldType::Container => Some(FieldValue::ContainerRef(raw.to_string())),
        };
        parsed.unwrap_or_else(|| FieldValue::Text(raw.to_string()))
    }

    /// Render the value as text using the given formats.
    pub fn render(&self, formats: &DateTimeFormats) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::ContainerRef(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => {
                let pattern = to_chrono(&formats.date);
                formatted(d.format(&pattern), d)
            }
            FieldValue::Time(t) => {
                let pattern = to_chrono(&formats.time);
                formatted(t.format(&pattern), t)
            }
            FieldValue::Timestamp(ts) => {
                let pattern = to_chrono(&formats.timestamp);
                formatted(ts.format(&pattern), ts)
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

/// Write `value`, or chrono's own rendering of `fallback` when the pattern
/// asks for something the value does not have (an hour on a date).
fn formatted(value: impl fmt::Display, fallback: &impl fmt::Display) -> String {
    let mut out = String::new();
    match write!(out, "{value}") {
        Ok(()) => out,
        Err(_) => fallback.to_string(),
    }
}

fn parse_number(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .or_else(|| Decimal::from_str(&normalize_separators(text)?).ok())
}

/// Rewrite locale-formatted numbers such as `1,234.50`, `1.234,50` or `12,5`
/// as plain decimal text.
///
/// The separator that appears last is the decimal one. A lone comma is a
/// decimal comma. Grouping separators must be followed by three digits.
fn normalize_separators(text: &str) -> Option<String> {
    let (group, decimal) = match (text.rfind(','), text.rfind('.')) {
        (Some(comma), Some(dot)) if comma < dot => (',', Some('.')),
        (Some(_), Some(_)) => ('.', Some(',')),
        (Some(_), None) if text.matches(',').count() == 1 => ('.', Some(',')),
        (Some(_), None) => (',', None),
        (None, Some(_)) => ('.', None),
        (None, None) => return None,
    };
    let (integer, fraction) = match decimal {
        Some(sep) => text.rsplit_once(sep)?,
        None => (text, ""),
    };

    let mut groups = integer.split(group);
    let mut out = groups.next()?.to_string();
    for g in groups {
        if g.len() != 3 {
            return None;
        }
        out.push_str(g);
    }
    if decimal.is_some() {
        out.push('.');
        out.push_str(fraction);
    }
    Some(out)
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&DateTimeFormats::default()))
    }
}
