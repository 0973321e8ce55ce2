//! Locations module

use camino::{Utf8Path, Utf8PathBuf};

pub const TRACKER_DIR: &str = ".colabme";
pub const TRACKER_FILE: &str = "colabme.json";

/// The tracker directory of a project rooted at `base`
pub fn tracker_dir(base: &Utf8Path) -> Utf8PathBuf {
    base.join(TRACKER_DIR)
}

/// The snapshot file of a project rooted at `base`
pub fn tracker_file(base: &Utf8Path) -> Utf8PathBuf {
    tracker_dir(base).join(TRACKER_FILE)
}

/// Locations relative to the current working directory
pub mod cwd {
    use camino::Utf8PathBuf;

    pub fn base_dir() -> anyhow::Result<Utf8PathBuf> {
        let dir = std::env::current_dir()?;
        Ok(Utf8PathBuf::try_from(dir)?)
    }

    pub fn tracker_dir() -> anyhow::Result<Utf8PathBuf> {
        Ok(super::tracker_dir(&base_dir()?))
    }

    pub fn tracker_file() -> anyhow::Result<Utf8PathBuf> {
        Ok(super::tracker_file(&base_dir()?))
    }
}
