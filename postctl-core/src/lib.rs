//! postctl-core - a file-backed post store
//!
//! A directory of markdown files with YAML front matter treated as a record
//! store: list, get, create, update and delete records, compute permalinks
//! in one of four URL styles, and store uploaded assets.
//!
//! ```no_run
//! use postctl_core::{CmsConfig, RecordStore};
//!
//! # async fn demo() -> postctl_core::Result<()> {
//! let store = RecordStore::new(CmsConfig::load_or_default(None)?);
//! let record = store.create("Hello, World!", "First post").await?;
//! println!("{}", store.permalink(&record));
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod clock;
pub mod config;
pub mod error;
mod files;
pub mod frontmatter;
pub mod permalink;
pub mod record;
pub mod slug;
pub mod store;

pub use assets::{Asset, AssetUploader};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CmsConfig;
pub use error::{Error, Result};
pub use frontmatter::FrontmatterError;
pub use permalink::PermalinkStyle;
pub use record::Record;
pub use store::{Listing, RecordStore, RecordUpdate, SkippedFile};
