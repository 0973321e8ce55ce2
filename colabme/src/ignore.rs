use camino::{Utf8Path, Utf8PathBuf};

use crate::{path, RecordStore, Result};

impl RecordStore {
    /// Exclude `paths` from all future reconciliation.
    /// Paths already ignored are not added twice.
    /// Returns the canonical paths that were added.
    pub fn ignore_paths<I, P>(&mut self, paths: I) -> Result<Vec<Utf8PathBuf>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let mut added = Vec::new();
        for p in paths {
            let p = path::resolve(p.as_ref())?;
            if self.is_ignored(&p) {
                log::info!("{p} is already ignored");
                continue;
            }
            log::info!("ignoring {p}");
            self.ignored_mut().push(p.clone());
            added.push(p);
        }
        Ok(added)
    }

    /// Remove `paths` from the ignored paths.
    /// Returns the number of paths removed.
    pub fn unignore_paths<I, P>(&mut self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let paths = paths
            .into_iter()
            .map(|p| path::resolve(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let ignored = self.ignored_mut();
        let before = ignored.len();
        ignored.retain(|p| !paths.contains(p));
        Ok(before - ignored.len())
    }

    pub fn unignore_all(&mut self) {
        self.ignored_mut().clear();
    }
}
