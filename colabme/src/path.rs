//! Canonical path helpers.
//!
//! Tracked and ignored entries are keyed by canonical absolute paths.
//! Inputs are canonicalized once, when they enter a public operation, and
//! only the canonical form is stored and compared afterwards.
use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::{PathError, Result};

/// Canonicalize a path that must exist on the local file system.
pub fn canonicalize(path: &Utf8Path) -> Result<Utf8PathBuf> {
    match path.canonicalize_utf8() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(PathError::NotFound(path.to_owned()).into())
        }
        Err(err) => Err(PathError::Illegal(path.to_owned(), Some(err.to_string())).into()),
    }
}

/// Resolve a path to the key under which it is (or would be) recorded.
///
/// Existing paths are canonicalized. Paths that vanished from the file system
/// are made absolute and normalized lexically, with their closest existing
/// parent canonicalized, so that removed files can still be looked up.
pub fn resolve(path: &Utf8Path) -> Result<Utf8PathBuf> {
    match canonicalize(path) {
        Ok(path) => Ok(path),
        Err(crate::Error::Path(PathError::NotFound(_))) => {
            let normalized = normalize(&absolute(path)?)?;
            match (normalized.parent(), normalized.file_name()) {
                (Some(parent), Some(name)) => match resolve(parent) {
                    Ok(parent) => Ok(parent.join(name)),
                    Err(_) => Ok(normalized),
                },
                _ => Ok(normalized),
            }
        }
        Err(err) => Err(err),
    }
}

/// Join a relative path onto the current working directory.
pub fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)?;
    Ok(cwd.join(path))
}

/// Lexically remove `.` and `..` components of an absolute path.
pub fn normalize(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.is_relative() {
        return Err(PathError::Illegal(
            path.to_owned(),
            Some("Expected an absolute path".to_string()),
        )
        .into());
    }
    let mut normalized = Utf8PathBuf::new();
    for comp in path.components() {
        match comp {
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::Normal(_) => {
                normalized.push(comp)
            }
            Utf8Component::CurDir => (),
            Utf8Component::ParentDir => {
                if !normalized.pop() {
                    return Err(PathError::Illegal(
                        path.to_owned(),
                        Some("Path can't be normalized".to_string()),
                    )
                    .into());
                }
            }
        }
    }
    Ok(normalized)
}
