//! File-system helpers shared by the store and the uploader

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::slug::disambiguate;

/// Upper bound on `-N` suffixes tried before giving up
const MAX_ATTEMPTS: usize = 10_000;

/// Create `dir` (and parents) if missing
pub(crate) async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::storage(dir, e))
}

/// Replace `path` with `data` in one step.
///
/// Writes a hidden temp file next to the target, syncs it and renames it over
/// the target. Readers see either the old or the new content, never a mix.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = temp_path_for(path);

    if let Err(err) = write_and_sync(&tmp_path, data).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(Error::storage(&tmp_path, err));
    }

    if let Err(err) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(Error::storage(path, err));
    }

    Ok(())
}

async fn write_and_sync(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Publish `data` under the first free name among `base`, `base-2`,
/// `base-3`, ... in `dir` and return that name.
///
/// The content is written and synced to a hidden temp file first, then
/// hard-linked into place. Linking fails atomically when the name is taken,
/// so concurrent callers never share a name and readers never see the file
/// before it is complete.
pub(crate) async fn publish_unique(dir: &Path, base: &str, data: &[u8]) -> Result<String> {
    let tmp_path = temp_path_for(&dir.join(base));
    if let Err(err) = write_and_sync(&tmp_path, data).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(Error::storage(&tmp_path, err));
    }

    let published = link_first_free(dir, base, &tmp_path).await;
    let _ = fs::remove_file(&tmp_path).await;
    published
}

async fn link_first_free(dir: &Path, base: &str, tmp_path: &Path) -> Result<String> {
    for attempt in 1..=MAX_ATTEMPTS {
        let name = if attempt == 1 {
            base.to_string()
        } else {
            disambiguate(base, attempt)
        };
        let path = dir.join(&name);

        match fs::hard_link(tmp_path, &path).await {
            Ok(()) => return Ok(name),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(Error::storage(path, err)),
        }
    }

    Err(Error::storage(
        dir.join(base),
        std::io::Error::new(ErrorKind::AlreadyExists, "no free file name left"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_atomic_replaces_content_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn write_atomic_into_missing_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("a.md");

        let err = write_atomic(&path, b"x").await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[tokio::test]
    async fn publish_unique_suffixes_taken_names() {
        let dir = TempDir::new().unwrap();

        let first = publish_unique(dir.path(), "post.md", b"one").await.unwrap();
        let second = publish_unique(dir.path(), "post.md", b"two").await.unwrap();
        let third = publish_unique(dir.path(), "post.md", b"three").await.unwrap();

        assert_eq!(first, "post.md");
        assert_eq!(second, "post-2.md");
        assert_eq!(third, "post-3.md");
        assert_eq!(std::fs::read(dir.path().join("post.md")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join("post-2.md")).unwrap(), b"two");

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn publish_unique_never_exposes_empty_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let payload = vec![b'x'; 64 * 1024];

        let writers: Vec<_> = (0..16)
            .map(|_| {
                let root = root.clone();
                let payload = payload.clone();
                tokio::spawn(async move { publish_unique(&root, "race.md", &payload).await })
            })
            .collect();

        let watcher_root = root.clone();
        let watcher = tokio::spawn(async move {
            let mut short_reads = 0;
            for _ in 0..200 {
                for entry in std::fs::read_dir(&watcher_root).unwrap().flatten() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.starts_with('.') {
                        continue;
                    }
                    if let Ok(bytes) = std::fs::read(entry.path()) {
                        if bytes.len() != 64 * 1024 {
                            short_reads += 1;
                        }
                    }
                }
                tokio::task::yield_now().await;
            }
            short_reads
        });

        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        assert_eq!(watcher.await.unwrap(), 0);
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 16);
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
