//! Store configuration - paths, URL prefix and permalink style
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `~/.postctl/config.toml` (or an explicit path)
//! 3. Environment variables:
//!    - `POSTCTL_CONTENT_DIR`: record directory (default: `src/_posts`)
//!    - `POSTCTL_ASSETS_DIR`: upload directory (default: `src/images/uploads`)
//!    - `POSTCTL_ASSETS_URL`: public prefix for uploads (default: `/images/uploads`)
//!    - `POSTCTL_PERMALINK_STYLE`: `simple`, `simple_ext`, `pretty` or `pretty_ext`
//!
//! Hosts apply their own overrides (CLI flags) on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::permalink::PermalinkStyle;

pub const ENV_CONTENT_DIR: &str = "POSTCTL_CONTENT_DIR";
pub const ENV_ASSETS_DIR: &str = "POSTCTL_ASSETS_DIR";
pub const ENV_ASSETS_URL: &str = "POSTCTL_ASSETS_URL";
pub const ENV_PERMALINK_STYLE: &str = "POSTCTL_PERMALINK_STYLE";

/// Configuration shared by the record store and the asset uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// Directory holding one `.md` file per record
    pub content_dir: PathBuf,
    /// Directory uploads are written to
    pub assets_dir: PathBuf,
    /// Root-relative URL prefix for uploaded assets
    pub assets_url: String,
    pub permalink_style: PermalinkStyle,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("src/_posts"),
            assets_dir: PathBuf::from("src/images/uploads"),
            assets_url: "/images/uploads".to_string(),
            permalink_style: PermalinkStyle::default(),
        }
    }
}

impl CmsConfig {
    /// Config rooted at a site directory (for testing and embedding)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            content_dir: root.join("_posts"),
            assets_dir: root.join("images").join("uploads"),
            ..Self::default()
        }
    }

    /// Apply `POSTCTL_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; blank values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_CONTENT_DIR) {
            self.content_dir = expand_home(&dir);
        }
        if let Some(dir) = get(ENV_ASSETS_DIR) {
            self.assets_dir = expand_home(&dir);
        }
        if let Some(url) = get(ENV_ASSETS_URL) {
            self.assets_url = url;
        }
        if let Some(style) = get(ENV_PERMALINK_STYLE) {
            self.permalink_style = PermalinkStyle::parse(&style);
        }
    }

    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.content_dir = expand_home(&config.content_dir.to_string_lossy());
        config.assets_dir = expand_home(&config.assets_dir.to_string_lossy());
        Ok(config)
    }

    /// Load `path` (or the default path when it exists), then apply the
    /// environment. An explicit path that does not exist is an error; a
    /// missing default file is not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.is_file() {
                    Self::load(&default_path)?
                } else {
                    debug!(path = ?default_path, "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// `~/.postctl/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".postctl")
            .join("config.toml")
    }

    /// On-disk path of a record
    pub fn record_path(&self, identifier: &str) -> PathBuf {
        self.content_dir.join(identifier)
    }

    /// On-disk path of an uploaded asset
    pub fn asset_path(&self, filename: &str) -> PathBuf {
        self.assets_dir.join(filename)
    }

    /// Public URL of an uploaded asset: `<assets_url>/<filename>`
    pub fn asset_url(&self, filename: &str) -> String {
        let prefix = self.assets_url.trim().trim_end_matches('/');
        let prefix = prefix.trim_start_matches('/');
        if prefix.is_empty() {
            format!("/{filename}")
        } else {
            format!("/{prefix}/{filename}")
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(raw),
        },
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_site_layout() {
        let config = CmsConfig::default();
        assert_eq!(config.content_dir, PathBuf::from("src/_posts"));
        assert_eq!(config.assets_dir, PathBuf::from("src/images/uploads"));
        assert_eq!(config.asset_url("a.png"), "/images/uploads/a.png");
        assert_eq!(config.permalink_style, PermalinkStyle::Pretty);
    }

    #[test]
    fn paths_are_correct() {
        let config = CmsConfig::with_root("/test/site");
        assert_eq!(
            config.record_path("2024-01-15-hello.md"),
            PathBuf::from("/test/site/_posts/2024-01-15-hello.md")
        );
        assert_eq!(
            config.asset_path("x.png"),
            PathBuf::from("/test/site/images/uploads/x.png")
        );
    }

    #[test]
    fn asset_url_normalises_slashes() {
        let mut config = CmsConfig::default();
        config.assets_url = "media/".to_string();
        assert_eq!(config.asset_url("a.png"), "/media/a.png");

        config.assets_url = "/".to_string();
        assert_eq!(config.asset_url("a.png"), "/a.png");
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            (ENV_CONTENT_DIR, "/srv/posts"),
            (ENV_ASSETS_URL, "/uploads"),
            (ENV_PERMALINK_STYLE, "SIMPLE"),
            (ENV_ASSETS_DIR, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = CmsConfig::default();
        config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.content_dir, PathBuf::from("/srv/posts"));
        assert_eq!(config.assets_dir, PathBuf::from("src/images/uploads"));
        assert_eq!(config.assets_url, "/uploads");
        assert_eq!(config.permalink_style, PermalinkStyle::Simple);
    }

    #[test]
    fn load_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "content_dir = \"/data/posts\"\npermalink_style = \"pretty_ext\"\n")
            .unwrap();

        let config = CmsConfig::load(&path).unwrap();
        assert_eq!(config.content_dir, PathBuf::from("/data/posts"));
        assert_eq!(config.permalink_style, PermalinkStyle::PrettyExt);
        assert_eq!(config.assets_url, "/images/uploads");
    }

    #[test]
    fn load_reports_config_errors() {
        let dir = TempDir::new().unwrap();

        let missing = CmsConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, Error::Config { .. }));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "content_dir = [").unwrap();
        let invalid = CmsConfig::load(&path).unwrap_err();
        assert!(matches!(invalid, Error::Config { .. }));
    }
}
