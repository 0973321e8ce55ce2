use camino::{Utf8Path, Utf8PathBuf};
use colabme::PathError;

use crate::{
    gateway::Gateway,
    report::Report,
    session::{Session, Summary},
};

impl<'a, G, R> Session<'a, G, R>
where
    G: Gateway,
    R: Report,
{
    /// Delete the remote copies of `paths` and stop tracking them.
    ///
    /// Entries located in a removed folder are untracked along with it.
    pub async fn remove<I, P>(&mut self, paths: I) -> Summary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let paths: Vec<Utf8PathBuf> = paths.into_iter().map(|p| p.as_ref().to_owned()).collect();
        let total = paths.len();
        let mut summary = Summary::default();
        for (i, p) in paths.iter().enumerate() {
            match colabme::path::resolve(p) {
                Ok(path) => self.remove_path(&path, &mut summary).await,
                Err(err) => {
                    self.report.error(&err.to_string());
                    summary.failed += 1;
                }
            }
            self.report.progress(i + 1, total, p);
        }
        summary
    }

    /// Remove every tracked entry.
    pub async fn remove_all(&mut self) -> Summary {
        let paths: Vec<Utf8PathBuf> = self
            .store
            .entries()
            .iter()
            .map(|e| e.path().to_owned())
            .collect();
        let total = paths.len();
        let mut summary = Summary::default();
        for (i, path) in paths.iter().enumerate() {
            // may have gone with its parent folder
            if self.store.contains(path) {
                self.remove_path(path, &mut summary).await;
            }
            self.report.progress(i + 1, total, path);
        }
        summary
    }

    async fn remove_path(&mut self, path: &Utf8Path, summary: &mut Summary) {
        let Some(entry) = self.store.entry(path) else {
            self.report
                .warn(&PathError::NotTracked(path.to_owned()).to_string());
            summary.skipped += 1;
            return;
        };
        let Some(id) = entry.remote_id().map(ToOwned::to_owned) else {
            self.report
                .warn(&PathError::NotUploaded(path.to_owned()).to_string());
            summary.skipped += 1;
            return;
        };

        if let Err(err) = self.gateway.delete(&id).await {
            self.report
                .error(&format!("Error deleting {path} (ID: {id}): {err}"));
            summary.failed += 1;
            return;
        }
        self.report.info(&format!("Deleted {path} (ID: {id})"));

        self.store.remove(path);
        for child in self.store.remove_children(&id) {
            self.report
                .info(&format!("Untracked {} along with {path}", child.path()));
        }
        summary.deleted += 1;
    }
}
