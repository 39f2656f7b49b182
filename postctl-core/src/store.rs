//! Record store - one front-matter file per record in a single directory
//!
//! Identifiers are filenames (`2024-01-15-hello-world.md`). Writes go through
//! a temp file and a rename, so a reader never sees a half-written record.
//! There is no locking: concurrent updates to the same record race and the
//! last rename wins.

use std::path::Path;
use std::sync::Arc;

use serde_yaml::{Mapping, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CmsConfig;
use crate::error::{Error, Result};
use crate::files::{ensure_dir, publish_unique, write_atomic};
use crate::frontmatter::{self, FrontmatterError};
use crate::permalink;
use crate::record::{
    format_date, Record, DATE_KEY, DEFAULT_LAYOUT, LAYOUT_KEY, TITLE_KEY,
};
use crate::slug::{derive_identifier, split_extension, RECORD_EXTENSION};

/// Result of a best-effort directory scan
#[derive(Debug, Default)]
pub struct Listing {
    /// Decoded records, newest first
    pub records: Vec<Record>,
    /// Files that could not be read or decoded
    pub skipped: Vec<SkippedFile>,
}

/// A record file left out of a listing, with the reason
#[derive(Debug)]
pub struct SkippedFile {
    pub identifier: String,
    pub error: Error,
}

/// Partial update; `None` and blank values leave the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl RecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// CRUD over the configured content directory
#[derive(Clone)]
pub struct RecordStore {
    config: CmsConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Store stamping dates with the system clock
    pub fn new(config: CmsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CmsConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Scan the content directory, keeping every record that decodes.
    ///
    /// Hidden files and files without the `.md` extension are ignored. A
    /// missing directory is an empty listing.
    pub async fn scan(&self) -> Result<Listing> {
        let dir = &self.config.content_dir;
        debug!(dir = %dir.display(), "scanning records");

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Listing::default()),
            Err(e) => return Err(Error::storage(dir, e)),
        };

        let mut listing = Listing::default();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage(dir, e))?
        {
            let Some(identifier) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_record_name(&identifier) {
                continue;
            }
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(true) {
                continue;
            }

            match self.load(&identifier).await {
                Ok(record) => listing.records.push(record),
                Err(error) => {
                    warn!(identifier = %identifier, error = %error, "skipping record");
                    listing.skipped.push(SkippedFile { identifier, error });
                }
            }
        }

        listing.records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.identifier.cmp(&a.identifier))
        });

        debug!(
            records = listing.records.len(),
            skipped = listing.skipped.len(),
            "scan complete"
        );
        Ok(listing)
    }

    /// All decodable records, newest first
    pub async fn list_all(&self) -> Result<Vec<Record>> {
        Ok(self.scan().await?.records)
    }

    /// Load one record by identifier
    pub async fn get(&self, identifier: &str) -> Result<Record> {
        validate_identifier(identifier)?;
        self.load(identifier).await
    }

    /// Create a record stamped with the clock's current time.
    ///
    /// If the derived identifier is taken, `-2`, `-3`, ... is appended to its
    /// stem until a free name is found. The file only appears once its full
    /// content is on disk.
    pub async fn create(&self, title: &str, body: &str) -> Result<Record> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::validation("title", "must not be blank"));
        }

        let now = self.clock.now();
        let base = derive_identifier(title, now.date_naive());

        let mut metadata = Mapping::new();
        metadata.insert(LAYOUT_KEY.into(), DEFAULT_LAYOUT.into());
        metadata.insert(TITLE_KEY.into(), title.into());
        metadata.insert(DATE_KEY.into(), format_date(&now).into());
        let raw = frontmatter::encode(&metadata, body)
            .map_err(|e| Error::malformed(base.as_str(), e))?;

        let dir = &self.config.content_dir;
        ensure_dir(dir).await?;
        let identifier = publish_unique(dir, &base, raw.as_bytes()).await?;

        info!(identifier = %identifier, "created record");
        decode_record(&identifier, &raw)
    }

    /// Apply a partial update. The identifier, date and any unknown front
    /// matter keys are kept as they are.
    pub async fn update(&self, identifier: &str, update: RecordUpdate) -> Result<Record> {
        let existing = self.get(identifier).await?;

        let mut metadata = existing.metadata;
        if let Some(title) = non_blank(update.title.as_deref()) {
            metadata.insert(TITLE_KEY.into(), Value::from(title.trim()));
        }
        let body = non_blank(update.body.as_deref()).unwrap_or(&existing.body);

        let raw = frontmatter::encode(&metadata, body)
            .map_err(|e| Error::malformed(identifier, e))?;
        write_atomic(&self.config.record_path(identifier), raw.as_bytes()).await?;

        info!(identifier = %identifier, "updated record");
        decode_record(identifier, &raw)
    }

    /// Remove a record file
    pub async fn delete(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        let path = self.config.record_path(identifier);

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(identifier = %identifier, "deleted record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(identifier)),
            Err(e) => Err(Error::storage(path, e)),
        }
    }

    /// Public URL of a record under the configured style
    pub fn permalink(&self, record: &Record) -> String {
        permalink::resolve(record, self.config.permalink_style)
    }

    async fn load(&self, identifier: &str) -> Result<Record> {
        let path = self.config.record_path(identifier);
        let bytes = read_record_file(&path, identifier).await?;
        let raw = String::from_utf8(bytes)
            .map_err(|_| Error::malformed(identifier, FrontmatterError::InvalidEncoding))?;

        decode_record(identifier, &raw)
    }
}

async fn read_record_file(path: &Path, identifier: &str) -> Result<Vec<u8>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(identifier)),
        Err(e) => Err(Error::storage(path, e)),
    }
}

fn decode_record(identifier: &str, raw: &str) -> Result<Record> {
    let (metadata, body) =
        frontmatter::decode(raw).map_err(|e| Error::malformed(identifier, e))?;
    Record::from_parts(identifier, metadata, body).map_err(|e| Error::malformed(identifier, e))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_record_name(name: &str) -> bool {
    !name.starts_with('.') && split_extension(name).1 == Some(RECORD_EXTENSION)
}

/// Identifiers must be plain `.md` file names inside the content directory
fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.contains(['/', '\\']) {
        return Err(Error::validation(
            "identifier",
            format!("'{identifier}' must not contain path separators"),
        ));
    }
    if !is_record_name(identifier) {
        return Err(Error::validation(
            "identifier",
            format!("'{identifier}' is not a .{RECORD_EXTENSION} file name"),
        ));
    }
    Ok(())
}
