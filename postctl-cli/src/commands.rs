//! Subcommand arguments and handlers

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use postctl_core::{
    AssetUploader, CmsConfig, PermalinkStyle, Record, RecordStore, RecordUpdate,
};
use serde::Serialize;

use crate::OutputFormat;

const PREVIEW_LEN: usize = 72;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Max posts to show
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Also report files that could not be parsed
    #[arg(long)]
    pub show_skipped: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Post identifier (file name, e.g. 2024-01-15-hello-world.md)
    pub identifier: String,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Post title
    #[arg(long, short)]
    pub title: String,

    /// Post body
    #[arg(long, short, conflicts_with = "file")]
    pub body: Option<String>,

    /// Read the body from a file
    #[arg(long, short)]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Post identifier
    pub identifier: String,

    /// New title (blank keeps the current one)
    #[arg(long, short)]
    pub title: Option<String>,

    /// New body (blank keeps the current one)
    #[arg(long, short, conflicts_with = "file")]
    pub body: Option<String>,

    /// Read the new body from a file
    #[arg(long, short)]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Post identifier
    pub identifier: String,
}

#[derive(Parser, Debug)]
pub struct PermalinkArgs {
    /// Post identifier
    pub identifier: String,

    /// Style to resolve with (default: configured style)
    #[arg(long, short)]
    pub style: Option<PermalinkStyle>,
}

#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// File to upload
    pub path: PathBuf,

    /// Name to derive the stored file name from (default: the file's own name)
    #[arg(long)]
    pub name: Option<String>,
}

/// Record plus its resolved URL, for JSON output
#[derive(Serialize)]
struct RecordView<'a> {
    #[serde(flatten)]
    record: &'a Record,
    permalink: String,
}

#[derive(Serialize)]
struct SkippedView<'a> {
    identifier: &'a str,
    error: String,
}

fn view<'a>(store: &RecordStore, record: &'a Record) -> RecordView<'a> {
    RecordView {
        record,
        permalink: store.permalink(record),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_date(record: &Record) -> String {
    record
        .date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "(undated)".to_string())
}

async fn read_body(body: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (body, file) {
        (Some(body), _) => Ok(Some(body)),
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map(Some)
            .with_context(|| format!("Failed to read body from {}", path.display())),
        (None, None) => Ok(None),
    }
}

pub async fn run_list(config: &CmsConfig, args: ListArgs, output: OutputFormat) -> Result<()> {
    let store = RecordStore::new(config.clone());
    let mut listing = store.scan().await?;
    if let Some(limit) = args.limit {
        listing.records.truncate(limit);
    }

    match output {
        OutputFormat::Json => {
            let records: Vec<RecordView> = listing.records.iter().map(|r| view(&store, r)).collect();
            if args.show_skipped {
                let skipped: Vec<SkippedView> = listing
                    .skipped
                    .iter()
                    .map(|s| SkippedView {
                        identifier: &s.identifier,
                        error: s.error.to_string(),
                    })
                    .collect();
                print_json(&serde_json::json!({ "records": records, "skipped": skipped }))?;
            } else {
                print_json(&records)?;
            }
        }
        OutputFormat::Quiet => {
            for record in &listing.records {
                println!("{}", record.identifier);
            }
        }
        OutputFormat::Human => {
            if listing.records.is_empty() {
                println!("(no posts in {})", config.content_dir.display());
            }
            for record in &listing.records {
                println!("{}  {}", format_date(record), record.title);
                println!("    {}  {}", record.identifier, store.permalink(record));
                let preview = record.preview(PREVIEW_LEN);
                if !preview.is_empty() {
                    println!("    {preview}");
                }
            }
            if args.show_skipped {
                for skipped in &listing.skipped {
                    println!("! skipped {}: {}", skipped.identifier, skipped.error);
                }
            }
        }
    }

    Ok(())
}

pub async fn run_get(config: &CmsConfig, args: GetArgs, output: OutputFormat) -> Result<()> {
    let store = RecordStore::new(config.clone());
    let record = store.get(&args.identifier).await?;

    match output {
        OutputFormat::Json => print_json(&view(&store, &record))?,
        OutputFormat::Quiet => println!("{}", record.body),
        OutputFormat::Human => {
            println!("┌─ {}", record.title);
            println!("│  date:       {}", format_date(&record));
            if !record.categories.is_empty() {
                println!("│  categories: {}", record.categories.join(", "));
            }
            println!("│  permalink:  {}", store.permalink(&record));
            println!("└─ {}", record.identifier);
            println!();
            println!("{}", record.body);
        }
    }

    Ok(())
}

pub async fn run_create(config: &CmsConfig, args: CreateArgs, output: OutputFormat) -> Result<()> {
    let store = RecordStore::new(config.clone());
    let body = read_body(args.body, args.file).await?.unwrap_or_default();
    let record = store.create(&args.title, &body).await?;

    report_written(&store, &record, "Created", output)
}

pub async fn run_update(config: &CmsConfig, args: UpdateArgs, output: OutputFormat) -> Result<()> {
    let store = RecordStore::new(config.clone());
    let body = read_body(args.body, args.file).await?;
    if args.title.is_none() && body.is_none() {
        return Err(anyhow!("Nothing to update: pass --title, --body or --file"));
    }

    let update = RecordUpdate {
        title: args.title,
        body,
    };
    let record = store.update(&args.identifier, update).await?;

    report_written(&store, &record, "Updated", output)
}

fn report_written(
    store: &RecordStore,
    record: &Record,
    verb: &str,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(&view(store, record))?,
        OutputFormat::Quiet => println!("{}", record.identifier),
        OutputFormat::Human => {
            println!("✓ {verb} {}", record.identifier);
            println!("  {}", store.permalink(record));
        }
    }
    Ok(())
}

pub async fn run_delete(config: &CmsConfig, args: DeleteArgs, output: OutputFormat) -> Result<()> {
    let store = RecordStore::new(config.clone());
    store.delete(&args.identifier).await?;

    match output {
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "deleted": args.identifier }))?
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => println!("✓ Deleted {}", args.identifier),
    }
    Ok(())
}

pub async fn run_permalink(
    config: &CmsConfig,
    args: PermalinkArgs,
    output: OutputFormat,
) -> Result<()> {
    let store = RecordStore::new(config.clone());
    let record = store.get(&args.identifier).await?;
    let style = args.style.unwrap_or(config.permalink_style);
    let url = postctl_core::permalink::resolve(&record, style);

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "identifier": record.identifier,
            "style": style,
            "permalink": url,
        }))?,
        OutputFormat::Quiet | OutputFormat::Human => println!("{url}"),
    }
    Ok(())
}

pub async fn run_upload(config: &CmsConfig, args: UploadArgs, output: OutputFormat) -> Result<()> {
    let bytes = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let name = match args.name {
        Some(name) => name,
        None => args
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let uploader = AssetUploader::new(config.clone());
    let asset = uploader.upload(&name, &bytes).await?;

    match output {
        OutputFormat::Json => print_json(&asset)?,
        OutputFormat::Quiet => println!("{}", asset.url),
        OutputFormat::Human => {
            println!("✓ Stored {}", asset.path.display());
            println!("  {}", asset.url);
        }
    }
    Ok(())
}
