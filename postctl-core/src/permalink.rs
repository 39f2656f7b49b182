//! Public URL computation for records

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::slug::identifier_stem;

/// `YYYY-MM-DD-<slug>` on the identifier stem
static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})-(.+)$").expect("invalid identifier regex")
});

/// URL scheme used when presenting records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermalinkStyle {
    /// `/{categories}/{slug}/`
    Simple,
    /// `/{categories}/{slug}.html`
    SimpleExt,
    /// `/{categories}/{year}/{month}/{day}/{slug}/`
    #[default]
    Pretty,
    /// `/{categories}/{year}/{month}/{day}/{slug}.html`
    PrettyExt,
}

impl PermalinkStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::SimpleExt => "simple_ext",
            Self::Pretty => "pretty",
            Self::PrettyExt => "pretty_ext",
        }
    }

    /// Case-insensitive; anything unrecognised is `Pretty`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" => Self::Simple,
            "simple_ext" => Self::SimpleExt,
            "pretty_ext" => Self::PrettyExt,
            _ => Self::Pretty,
        }
    }

    fn is_dated(self) -> bool {
        matches!(self, Self::Pretty | Self::PrettyExt)
    }

    fn has_extension(self) -> bool {
        matches!(self, Self::SimpleExt | Self::PrettyExt)
    }
}

impl FromStr for PermalinkStyle {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for PermalinkStyle {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<PermalinkStyle> for String {
    fn from(style: PermalinkStyle) -> Self {
        style.as_str().to_string()
    }
}

impl fmt::Display for PermalinkStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the public URL of a record
pub fn resolve(record: &Record, style: PermalinkStyle) -> String {
    resolve_parts(&record.identifier, record.date.as_ref(), &record.categories, style)
}

/// Resolve from the individual fields a permalink depends on.
///
/// Identifiers that do not start with `YYYY-MM-DD-` resolve to `/<stem>/`
/// whatever the style.
pub fn resolve_parts(
    identifier: &str,
    date: Option<&DateTime<FixedOffset>>,
    categories: &[String],
    style: PermalinkStyle,
) -> String {
    let stem = identifier_stem(identifier);
    let Some(caps) = IDENT_RE.captures(stem) else {
        return format!("/{stem}/");
    };

    let slug = &caps[4];
    let categories_path: String = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!("{c}/"))
        .collect();

    let mut url = format!("/{categories_path}");
    if style.is_dated() {
        let (year, month, day) = match date {
            Some(date) => (
                date.format("%Y").to_string(),
                date.format("%m").to_string(),
                date.format("%d").to_string(),
            ),
            None => (caps[1].to_string(), caps[2].to_string(), caps[3].to_string()),
        };
        url.push_str(&format!("{year}/{month}/{day}/"));
    }
    url.push_str(slug);

    if style.has_extension() {
        url.push_str(".html");
    } else {
        url.push('/');
    }

    url
}
