//! Asset uploads - binary files stored under a timestamped name

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::CmsConfig;
use crate::error::{Error, Result};
use crate::files::{ensure_dir, publish_unique};
use crate::slug::{slugify, split_extension};

const FALLBACK_STEM: &str = "upload";

/// A stored upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Generated name, e.g. `20240115-103000-photo.jpg`
    pub filename: String,
    pub path: PathBuf,
    /// Root-relative URL, e.g. `/images/uploads/20240115-103000-photo.jpg`
    pub url: String,
}

/// Writes uploads into the configured asset directory
#[derive(Clone)]
pub struct AssetUploader {
    config: CmsConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AssetUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetUploader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AssetUploader {
    pub fn new(config: CmsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CmsConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Store `bytes` and return where they landed.
    ///
    /// Existing files are never overwritten; a clash within the same second
    /// gets a `-2`, `-3`, ... suffix.
    pub async fn upload(&self, original_filename: &str, bytes: &[u8]) -> Result<Asset> {
        if bytes.is_empty() {
            return Err(Error::validation("file", "no payload supplied"));
        }

        let dir = &self.config.assets_dir;
        ensure_dir(dir).await?;

        let base = asset_filename(original_filename, &self.clock.now());
        let filename = publish_unique(dir, &base, bytes).await?;
        let path = self.config.asset_path(&filename);

        info!(filename = %filename, size = bytes.len(), "stored asset");
        Ok(Asset {
            url: self.config.asset_url(&filename),
            filename,
            path,
        })
    }
}

/// `YYYYMMDD-HHMMSS-<slug>.<ext>` for an uploaded file name.
///
/// Only the last path component is used. The stem goes through `slugify`
/// and the extension is lowercased and reduced to ASCII alphanumerics.
pub fn asset_filename(original_filename: &str, at: &DateTime<FixedOffset>) -> String {
    let name = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let (stem, ext) = split_extension(name);

    let slug = slugify(stem.trim_start_matches('.'));
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { FALLBACK_STEM } else { slug };

    let ext: String = ext
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let stamp = at.format("%Y%m%d-%H%M%S");
    if ext.is_empty() {
        format!("{stamp}-{slug}")
    } else {
        format!("{stamp}-{slug}.{ext}")
    }
}
