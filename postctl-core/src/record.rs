//! Typed view over a decoded record file
//!
//! The store keeps the full metadata mapping next to the typed fields so that
//! rewriting a file never drops keys it does not know about.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::frontmatter::FrontmatterError;

pub const LAYOUT_KEY: &str = "layout";
pub const TITLE_KEY: &str = "title";
pub const DATE_KEY: &str = "date";
pub const CATEGORIES_KEY: &str = "categories";

/// Layout written into every newly created record
pub const DEFAULT_LAYOUT: &str = "post";

/// One content file: identifier, typed front matter and body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Filename, e.g. `2024-01-15-hello-world.md`
    pub identifier: String,
    pub title: String,
    /// Publication date; undated records list after dated ones
    pub date: Option<DateTime<FixedOffset>>,
    pub categories: Vec<String>,
    pub layout: Option<String>,
    pub body: String,
    /// Full front matter as stored, unknown keys included
    #[serde(skip)]
    pub metadata: Mapping,
}

impl Record {
    /// Build a record from a decoded metadata mapping and body.
    ///
    /// `title` is required. `date` and `categories` are optional; a single
    /// category string becomes a one-element list.
    pub fn from_parts(
        identifier: impl Into<String>,
        metadata: Mapping,
        body: String,
    ) -> Result<Self, FrontmatterError> {
        let title = match metadata.get(TITLE_KEY) {
            None | Some(Value::Null) => return Err(FrontmatterError::MissingField(TITLE_KEY)),
            Some(value) => scalar_to_string(value).ok_or_else(|| FrontmatterError::InvalidField {
                field: TITLE_KEY,
                reason: "expected a string".to_string(),
            })?,
        };

        let date = match metadata.get(DATE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(parse_date(raw).ok_or_else(|| {
                FrontmatterError::InvalidField {
                    field: DATE_KEY,
                    reason: format!("unrecognised timestamp '{raw}'"),
                }
            })?),
            Some(_) => {
                return Err(FrontmatterError::InvalidField {
                    field: DATE_KEY,
                    reason: "expected a timestamp string".to_string(),
                })
            }
        };

        let categories = parse_categories(metadata.get(CATEGORIES_KEY))?;
        let layout = metadata
            .get(LAYOUT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            identifier: identifier.into(),
            title,
            date,
            categories,
            layout,
            body,
            metadata,
        })
    }

    /// First `max_len` characters of the body on a single line
    pub fn preview(&self, max_len: usize) -> String {
        let flattened: String = self
            .body
            .trim()
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();

        if flattened.chars().count() > max_len {
            let cut: String = flattened.chars().take(max_len).collect();
            format!("{}...", cut.trim_end())
        } else {
            flattened
        }
    }
}

/// Timestamp format written into new records
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse a front matter timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff] +HH:MM` (with `Z` for UTC),
/// naive date-times (taken as UTC) and bare dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date);
    }

    let zoned = match raw.strip_suffix(" Z").or_else(|| raw.strip_suffix(" UTC")) {
        Some(rest) => format!("{rest} +00:00"),
        None => raw.to_string(),
    };
    for format in ["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f %z"] {
        if let Ok(date) = DateTime::parse_from_str(&zoned, format) {
            return Some(date);
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_categories(value: Option<&Value>) -> Result<Vec<String>, FrontmatterError> {
    let invalid = || FrontmatterError::InvalidField {
        field: CATEGORIES_KEY,
        reason: "expected a string or a list of strings".to_string(),
    };

    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| scalar_to_string(item).ok_or_else(invalid))
            .collect(),
        Some(other) => {
            let single = scalar_to_string(other).ok_or_else(invalid)?;
            if single.trim().is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![single])
            }
        }
    }
}
