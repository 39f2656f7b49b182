//! YAML front matter splitting, decoding and encoding
//!
//! Record files carry a metadata block fenced by `---` lines:
//! ```markdown
//! ---
//! layout: post
//! title: Example
//! date: 2024-01-15T10:30:00+00:00
//! ---
//! Content here
//! ```
//!
//! Only the first two delimiter lines are significant. Anything after the
//! closing delimiter is the body and is returned verbatim, including any
//! further `---` lines.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

const FRONTMATTER_DELIMITER: &str = "---";

/// Front matter parsing/writing errors
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("no front matter found - file must start with ---")]
    NoFrontmatter,

    #[error("unclosed front matter - missing second ---")]
    Unclosed,

    #[error("file is not valid UTF-8")]
    InvalidEncoding,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter is not a key/value mapping")]
    NotAMapping,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == FRONTMATTER_DELIMITER
}

/// Split raw file content into (yaml, body) slices.
///
/// Blank lines before the opening delimiter are ignored; any other leading
/// content means there is no front matter.
pub fn split(raw: &str) -> Result<(&str, &str), FrontmatterError> {
    let mut offset = 0;
    let mut yaml_start: Option<usize> = None;

    for line in raw.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        match yaml_start {
            None if is_delimiter(line) => yaml_start = Some(offset),
            None if line.trim().is_empty() => {}
            None => return Err(FrontmatterError::NoFrontmatter),
            Some(start) if is_delimiter(line) => {
                return Ok((&raw[start..line_start], &raw[offset..]));
            }
            Some(_) => {}
        }
    }

    match yaml_start {
        None => Err(FrontmatterError::NoFrontmatter),
        Some(_) => Err(FrontmatterError::Unclosed),
    }
}

/// Decode a raw record file into its metadata mapping and body
pub fn decode(raw: &str) -> Result<(Mapping, String), FrontmatterError> {
    let (yaml, body) = split(raw)?;

    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(metadata) => Ok((metadata, body.to_string())),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Encode a metadata mapping and body into raw file content.
///
/// Trailing whitespace of the whole document is trimmed.
pub fn encode(metadata: &Mapping, body: &str) -> Result<String, FrontmatterError> {
    let yaml = serde_yaml::to_string(metadata)?;
    let raw = format!(
        "{FRONTMATTER_DELIMITER}\n{}\n{FRONTMATTER_DELIMITER}\n{body}",
        yaml.trim_end()
    );

    Ok(raw.trim_end().to_string())
}
