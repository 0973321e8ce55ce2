use std::time::SystemTime;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use colabme::{id::IdBuf, RecordStore, TrackedEntry};
use colabme_engine::{Session, Summary};

use crate::{
    stubs::{remote::Stub, report::Recorder},
    utils,
};

/// A local dataset, a remote stub and the store tracking them
pub struct Harness {
    pub root: Utf8PathBuf,
    pub remote: Stub,
    pub report: Recorder,
    pub store: RecordStore,
}

impl Harness {
    pub fn path(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel)
    }

    pub fn session(&mut self) -> Session<'_, Stub, Recorder> {
        Session::new(&mut self.store, &self.remote, &self.report)
    }

    pub async fn reconcile(&mut self, rels: &[&str]) -> Summary {
        let paths: Vec<Utf8PathBuf> = rels.iter().map(|rel| self.path(rel)).collect();
        self.session().reconcile(paths, None).await
    }

    pub async fn update_all(&mut self) -> Summary {
        self.session().update_all().await
    }

    pub async fn remove(&mut self, rels: &[&str]) -> Summary {
        let paths: Vec<Utf8PathBuf> = rels.iter().map(|rel| self.path(rel)).collect();
        self.session().remove(paths).await
    }

    pub async fn remove_all(&mut self) -> Summary {
        self.session().remove_all().await
    }

    pub fn entry(&self, rel: &str) -> Option<&TrackedEntry> {
        self.store.entry(&self.path(rel))
    }

    pub fn remote_id(&self, rel: &str) -> IdBuf {
        self.entry(rel)
            .and_then(|e| e.remote_id())
            .map(|id| id.to_id_buf())
            .unwrap_or_else(|| panic!("{rel} is not uploaded"))
    }

    /// Modification time of a local file, as the engine reads it
    pub fn mtime(&self, rel: &str) -> DateTime<Utc> {
        let metadata = std::fs::metadata(self.path(rel)).unwrap();
        colabme::mtime(&metadata).unwrap()
    }

    /// Set the modification time of a local file to now
    pub fn touch(&self, rel: &str) {
        utils::set_mtime(&self.path(rel), SystemTime::now());
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.root).unwrap();
    }
}
