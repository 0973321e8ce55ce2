use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use colabme::{id::IdBuf, PathError, TrackedEntry};
use futures::future::BoxFuture;

use crate::{
    gateway::Gateway,
    local::{self, Kind},
    report::Report,
    session::{Session, Summary},
};

impl<'a, G, R> Session<'a, G, R>
where
    G: Gateway,
    R: Report,
{
    /// Upload what is new or modified among `paths`, recursing into directories.
    ///
    /// Top level entries are placed in the remote folder `parent_id`.
    pub async fn reconcile<I, P>(&mut self, paths: I, parent_id: Option<IdBuf>) -> Summary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let paths: Vec<Utf8PathBuf> = paths.into_iter().map(|p| p.as_ref().to_owned()).collect();
        let total = paths.len();
        let mut summary = Summary::default();
        for (i, p) in paths.iter().enumerate() {
            let mut visiting = Vec::new();
            self.reconcile_path(p.clone(), parent_id.clone(), &mut visiting, &mut summary)
                .await;
            self.report.progress(i + 1, total, p);
        }
        summary
    }

    /// Upload again the tracked files that were modified since their last upload.
    ///
    /// Directories are not walked, so new files are not discovered.
    pub async fn update_all(&mut self) -> Summary {
        let paths: Vec<Utf8PathBuf> = self
            .store
            .entries()
            .iter()
            .map(|e| e.path().to_owned())
            .collect();
        let total = paths.len();
        let mut summary = Summary::default();
        for (i, path) in paths.iter().enumerate() {
            self.update_path(path, &mut summary).await;
            self.report.progress(i + 1, total, path);
        }
        summary
    }

    /// `visiting` holds the directories being walked, from the top level input
    /// down to the parent of `path`.
    fn reconcile_path<'s>(
        &'s mut self,
        path: Utf8PathBuf,
        parent_id: Option<IdBuf>,
        visiting: &'s mut Vec<Utf8PathBuf>,
        summary: &'s mut Summary,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            let kind = match local::stat(&path).await {
                Ok(Some(kind)) => kind,
                Ok(None) => {
                    self.report.warn(&PathError::NotFound(path).to_string());
                    summary.skipped += 1;
                    return;
                }
                Err(err) => {
                    self.report.error(&format!("Could not access {path}: {err}"));
                    summary.failed += 1;
                    return;
                }
            };
            let path = match colabme::path::canonicalize(&path) {
                Ok(path) => path,
                Err(err) => {
                    self.report.error(&err.to_string());
                    summary.failed += 1;
                    return;
                }
            };

            if kind == Kind::Directory && visiting.contains(&path) {
                self.report.warn(&format!(
                    "{path} is a symbolic link to one of its parent directories"
                ));
                summary.skipped += 1;
                return;
            }

            let mut entry = self
                .store
                .entry(&path)
                .cloned()
                .unwrap_or_else(|| TrackedEntry::new(path.clone()));
            entry.set_parent_id(parent_id);

            if self.store.is_ignored(&path) || self.is_excluded(&path) {
                self.report.info(&format!("{path} is ignored"));
                summary.skipped += 1;
                return;
            }

            match kind {
                Kind::Regular { mtime, .. } if entry.needs_upload(mtime) => {
                    self.upload_file(entry, mtime, summary).await;
                }
                Kind::Regular { .. } => {
                    self.report.info(&format!("{path} is up to date"));
                    self.store.upsert(entry);
                    summary.unchanged += 1;
                }
                Kind::Directory => {
                    let dir_id = match entry.remote_id().map(ToOwned::to_owned) {
                        Some(id) => {
                            self.store.upsert(entry);
                            id
                        }
                        None => match self.create_dir(entry, summary).await {
                            Some(id) => id,
                            None => return,
                        },
                    };
                    let (children, errors) = local::sorted_dir_entries(&path).await;
                    for err in errors {
                        self.report.error(&format!("Could not list {path}: {err}"));
                        summary.failed += 1;
                    }
                    visiting.push(path);
                    for child in children {
                        self.reconcile_path(child, Some(dir_id.clone()), visiting, summary)
                            .await;
                    }
                    visiting.pop();
                }
                Kind::Special => {
                    self.report.warn(&PathError::Unsupported(path).to_string());
                    summary.skipped += 1;
                }
            }
        })
    }

    async fn update_path(&mut self, path: &Utf8Path, summary: &mut Summary) {
        let Some(entry) = self.store.entry(path).cloned() else {
            return;
        };
        if self.store.is_ignored(path) || self.is_excluded(path) {
            summary.skipped += 1;
            return;
        }
        match local::stat(path).await {
            Ok(Some(Kind::Regular { mtime, .. })) if entry.is_stale(mtime) => {
                self.upload_file(entry, mtime, summary).await;
            }
            Ok(Some(Kind::Regular { .. })) => summary.unchanged += 1,
            Ok(Some(Kind::Directory)) => (),
            Ok(Some(Kind::Special)) => {
                self.report.warn(&PathError::Unsupported(path.to_owned()).to_string());
                summary.skipped += 1;
            }
            Ok(None) => {
                self.report.warn(&PathError::NotFound(path.to_owned()).to_string());
                summary.skipped += 1;
            }
            Err(err) => {
                self.report.error(&format!("Could not access {path}: {err}"));
                summary.failed += 1;
            }
        }
    }

    /// Delete-then-recreate the remote copy of the file of `entry`
    async fn upload_file(
        &mut self,
        mut entry: TrackedEntry,
        mtime: DateTime<Utc>,
        summary: &mut Summary,
    ) {
        let path = entry.path().to_owned();
        if let Some(id) = entry.remote_id() {
            self.report.info(&format!(
                "{path} is already tracked. Deleting it from the remote to update it."
            ));
            if let Err(err) = self.gateway.delete(id).await {
                self.report
                    .error(&format!("Error deleting {path} (ID: {id}): {err}"));
                summary.failed += 1;
                return;
            }
        }
        match self.gateway.create_file(entry.parent_id(), &path).await {
            Ok(id) => {
                self.report
                    .info(&format!("Uploaded file: {path} with ID: {id}."));
                entry.mark_uploaded(id, mtime);
                self.store.upsert(entry);
                summary.uploaded += 1;
            }
            Err(err) => {
                self.report
                    .error(&format!("Error uploading file {path}: {err}"));
                summary.failed += 1;
            }
        }
    }

    async fn create_dir(&mut self, mut entry: TrackedEntry, summary: &mut Summary) -> Option<IdBuf> {
        let path = entry.path().to_owned();
        let name = path.file_name().unwrap_or(path.as_str());
        match self.gateway.mkdir(entry.parent_id(), name).await {
            Ok(id) => {
                self.report
                    .info(&format!("Created folder {path} with ID: {id}"));
                entry.mark_created(id.clone());
                self.store.upsert(entry);
                summary.created += 1;
                Some(id)
            }
            Err(err) => {
                self.report
                    .error(&format!("Error creating folder {path}: {err}"));
                summary.failed += 1;
                None
            }
        }
    }
}
