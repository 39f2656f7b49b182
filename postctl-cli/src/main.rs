//! postctl CLI - manage a directory of front-matter posts
//!
//! Thin host over `postctl-core`: loads configuration, installs tracing and
//! maps each subcommand onto one store operation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use postctl_core::{CmsConfig, PermalinkStyle};
use tracing::debug;

mod commands;
mod tracing_setup;

use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "postctl",
    author,
    version,
    about = "Manage markdown posts with YAML front matter",
    long_about = "List, read, create, update and delete posts stored as markdown files with \
                  YAML front matter, compute their permalinks and store uploaded assets."
)]
struct Cli {
    /// Config file (default: ~/.postctl/config.toml)
    #[arg(long, global = true, env = "POSTCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the post files
    #[arg(long, global = true)]
    content_dir: Option<PathBuf>,

    /// Directory uploads are written to
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    /// Permalink style: simple, simple_ext, pretty or pretty_ext
    #[arg(long, global = true)]
    permalink_style: Option<PermalinkStyle>,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List posts, newest first
    List(commands::ListArgs),
    /// Show one post
    Get(commands::GetArgs),
    /// Create a post dated now
    Create(commands::CreateArgs),
    /// Change a post's title and/or body
    Update(commands::UpdateArgs),
    /// Delete a post file
    Delete(commands::DeleteArgs),
    /// Print a post's permalink
    Permalink(commands::PermalinkArgs),
    /// Store a file under the asset directory
    Upload(commands::UploadArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
    /// Quiet mode - identifiers/URLs only
    Quiet,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }

    /// Defaults, then config file, then environment, then flags
    fn load_config(&self) -> Result<CmsConfig> {
        let mut config = CmsConfig::load_or_default(self.config.as_deref())
            .context("Failed to load postctl configuration")?;

        if let Some(dir) = &self.content_dir {
            config.content_dir = dir.clone();
        }
        if let Some(dir) = &self.assets_dir {
            config.assets_dir = dir.clone();
        }
        if let Some(style) = self.permalink_style {
            config.permalink_style = style;
        }

        debug!(?config, "resolved configuration");
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug }).ok();

    let config = cli.load_config()?;
    let output = cli.output_format();

    match cli.command {
        Commands::List(args) => commands::run_list(&config, args, output).await,
        Commands::Get(args) => commands::run_get(&config, args, output).await,
        Commands::Create(args) => commands::run_create(&config, args, output).await,
        Commands::Update(args) => commands::run_update(&config, args, output).await,
        Commands::Delete(args) => commands::run_delete(&config, args, output).await,
        Commands::Permalink(args) => commands::run_permalink(&config, args, output).await,
        Commands::Upload(args) => commands::run_upload(&config, args, output).await,
    }
}
