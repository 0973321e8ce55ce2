//! Inspection of the local file system.

use std::io;

use async_stream::stream;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tokio::fs;

/// The kind of a local path, symlinks being followed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Regular { size: u64, mtime: DateTime<Utc> },
    Directory,
    Special,
}

/// Stat `path`, following symlinks.
/// Returns `Ok(None)` if nothing exists at `path`, including dangling symlinks.
pub async fn stat(path: &Utf8Path) -> colabme::Result<Option<Kind>> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let kind = if metadata.is_file() {
        Kind::Regular {
            size: metadata.len(),
            mtime: colabme::mtime(&metadata)?,
        }
    } else if metadata.is_dir() {
        Kind::Directory
    } else {
        Kind::Special
    };
    Ok(Some(kind))
}

/// The immediate children of the directory `dir`.
/// Entries whose path is not UTF-8 are yielded as errors and listing goes on.
/// A failure to read the directory is yielded as an error that ends the stream.
pub fn dir_entries(dir: &Utf8Path) -> impl Stream<Item = colabme::Result<Utf8PathBuf>> + Send + '_ {
    log::trace!("listing entries of {dir}");
    stream! {
        match fs::read_dir(dir).await {
            Err(err) => {
                yield Err(colabme::Error::from(err));
            }
            Ok(mut read_dir) => loop {
                match read_dir.next_entry().await {
                    Ok(None) => break,
                    Ok(Some(direntry)) => {
                        yield Utf8PathBuf::try_from(direntry.path()).map_err(colabme::Error::from);
                    }
                    Err(err) => {
                        yield Err(colabme::Error::from(err));
                        break;
                    }
                }
            },
        }
    }
}

/// The children of `dir`, sorted by name, along with the errors met while listing them.
pub async fn sorted_dir_entries(dir: &Utf8Path) -> (Vec<Utf8PathBuf>, Vec<colabme::Error>) {
    let mut children = Vec::new();
    let mut errors = Vec::new();
    let entries = dir_entries(dir);
    tokio::pin!(entries);
    while let Some(entry) = entries.next().await {
        match entry {
            Ok(path) => children.push(path),
            Err(err) => errors.push(err),
        }
    }
    children.sort();
    (children, errors)
}
