//! The record store: tracked entries, ignored paths and configuration,
//! persisted as a JSON snapshot between invocations.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    id::{Id, IdBuf},
    Error, Result,
};

/// A local path tracked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    path: Utf8PathBuf,
    remote_id: Option<IdBuf>,
    last_synced: Option<DateTime<Utc>>,
    parent_id: Option<IdBuf>,
}

impl TrackedEntry {
    /// A new entry that was never uploaded.
    /// `path` must be canonical.
    pub fn new(path: Utf8PathBuf) -> Self {
        debug_assert!(path.is_absolute());
        TrackedEntry {
            path,
            remote_id: None,
            last_synced: None,
            parent_id: None,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn remote_id(&self) -> Option<&Id> {
        self.remote_id.as_deref()
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    pub fn parent_id(&self) -> Option<&Id> {
        self.parent_id.as_deref()
    }

    pub fn set_parent_id(&mut self, parent_id: Option<IdBuf>) {
        self.parent_id = parent_id;
    }

    pub fn is_uploaded(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Whether the uploaded content is older than the local file modified at `mtime`.
    /// An uploaded entry with no recorded sync time is stale.
    pub fn is_stale(&self, mtime: DateTime<Utc>) -> bool {
        self.is_uploaded() && self.last_synced.map_or(true, |synced| mtime > synced)
    }

    /// Whether the file modified at `mtime` must be (re-)uploaded.
    pub fn needs_upload(&self, mtime: DateTime<Utc>) -> bool {
        !self.is_uploaded() || self.is_stale(mtime)
    }

    /// Record a successful file upload.
    pub fn mark_uploaded(&mut self, remote_id: IdBuf, mtime: DateTime<Utc>) {
        self.remote_id = Some(remote_id);
        self.last_synced = Some(mtime);
    }

    /// Record a successful folder creation.
    pub fn mark_created(&mut self, remote_id: IdBuf) {
        self.remote_id = Some(remote_id);
    }
}

/// Access to the remote storage, as recorded by `colabme setup`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub service_account_file: Option<Utf8PathBuf>,
    pub parent_id: Option<IdBuf>,
}

/// A validated [`Configuration`]
#[derive(Debug, Clone, Copy)]
pub struct Remote<'a> {
    pub service_account_file: &'a Utf8Path,
    pub root_id: &'a Id,
}

impl Configuration {
    /// Check that the configuration allows remote operations.
    pub fn remote(&self) -> Result<Remote<'_>> {
        let Some(service_account_file) = self.service_account_file.as_deref() else {
            crate::config_bail!(
                "No service account file provided. Please run colabme setup to provide a service account file."
            );
        };
        if !service_account_file.is_file() {
            crate::config_bail!(
                "Specified service account file {service_account_file} does not exist."
            );
        }
        let Some(root_id) = self.parent_id.as_deref() else {
            crate::config_bail!(
                "No parent folder ID provided. Please run colabme setup to provide one."
            );
        };
        Ok(Remote {
            service_account_file,
            root_id,
        })
    }
}

/// All that is known about the tracked files of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    entries: Vec<TrackedEntry>,
    ignored: Vec<Utf8PathBuf>,
    config: Configuration,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TrackedEntry] {
        &self.entries
    }

    pub fn entry(&self, path: &Utf8Path) -> Option<&TrackedEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.entry(path).is_some()
    }

    /// Insert `entry`, replacing in place any prior entry for the same path.
    pub fn upsert(&mut self, entry: TrackedEntry) {
        match self.entries.iter_mut().find(|e| e.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, path: &Utf8Path) -> Option<TrackedEntry> {
        let idx = self.entries.iter().position(|e| e.path == path)?;
        Some(self.entries.remove(idx))
    }

    /// Remove every entry directly contained in the remote folder `parent_id`.
    pub fn remove_children(&mut self, parent_id: &Id) -> Vec<TrackedEntry> {
        let (children, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.parent_id() == Some(parent_id));
        self.entries = kept;
        children
    }

    pub fn ignored(&self) -> &[Utf8PathBuf] {
        &self.ignored
    }

    pub fn is_ignored(&self, path: &Utf8Path) -> bool {
        self.ignored.iter().any(|p| p == path)
    }

    pub(crate) fn ignored_mut(&mut self) -> &mut Vec<Utf8PathBuf> {
        &mut self.ignored
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl RecordStore {
    /// Load the store from the snapshot at `path`, or create an empty one if there is none.
    pub async fn load(path: &Utf8Path) -> Result<Self> {
        if !path.is_file() {
            log::info!("Tracker file not found. Creating a new one at: {path}.");
            return Ok(Self::new());
        }
        let json = tokio::fs::read(path).await?;
        let json = String::from_utf8(json)?;
        let store = Self::from_json(&json)?;
        log::info!("Loaded tracker from: {path}.");
        Ok(store)
    }

    /// Write the snapshot to `path`, creating its folder if needed.
    /// The previous snapshot is replaced only once the new one is fully written.
    pub async fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::trace!("saved tracker to {path}");
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|err| Error::Other(format!("Malformed tracker file: {err}")))?;
        Ok(snapshot.into())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&Snapshot::from(self)).map_err(|err| Error::Other(err.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    #[serde(deserialize_with = "files_from_any")]
    files: Vec<FileRecord>,
    #[serde(default)]
    ignored_files: Vec<Utf8PathBuf>,
    #[serde(default)]
    service_account_file: Option<Utf8PathBuf>,
    #[serde(default)]
    parent_id: Option<IdBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    path: Utf8PathBuf,
    #[serde(default)]
    id: Option<IdBuf>,
    #[serde(default, with = "epoch_secs")]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    parent_id: Option<IdBuf>,
}

/// Early tracker files recorded `files` as a map from path to id.
#[derive(Deserialize)]
#[serde(untagged)]
enum FilesRepr {
    List(Vec<FileRecord>),
    Legacy(BTreeMap<Utf8PathBuf, Option<IdBuf>>),
}

fn files_from_any<'de, D>(deserializer: D) -> std::result::Result<Vec<FileRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FilesRepr::deserialize(deserializer)? {
        FilesRepr::List(files) => files,
        FilesRepr::Legacy(files) => files
            .into_iter()
            .map(|(path, id)| FileRecord {
                path,
                id,
                date: None,
                parent_id: None,
            })
            .collect(),
    })
}

impl From<Snapshot> for RecordStore {
    fn from(snapshot: Snapshot) -> Self {
        let entries = snapshot
            .files
            .into_iter()
            .map(|f| TrackedEntry {
                path: f.path,
                remote_id: f.id,
                last_synced: f.date,
                parent_id: f.parent_id,
            })
            .collect();
        RecordStore {
            entries,
            ignored: snapshot.ignored_files,
            config: Configuration {
                service_account_file: snapshot.service_account_file,
                parent_id: snapshot.parent_id,
            },
        }
    }
}

impl From<&RecordStore> for Snapshot {
    fn from(store: &RecordStore) -> Self {
        let files = store
            .entries
            .iter()
            .map(|e| FileRecord {
                path: e.path.clone(),
                id: e.remote_id.clone(),
                date: e.last_synced,
                parent_id: e.parent_id.clone(),
            })
            .collect();
        Snapshot {
            files,
            ignored_files: store.ignored.clone(),
            service_account_file: store.config.service_account_file.clone(),
            parent_id: store.config.parent_id.clone(),
        }
    }
}

/// `time` as it reads back from a snapshot.
///
/// Snapshots store float seconds, which can't hold every nanosecond value.
/// Converting a time read back this way again is lossless.
pub fn snapshot_time(time: DateTime<Utc>) -> DateTime<Utc> {
    epoch_secs::from_secs(epoch_secs::to_secs(time)).unwrap_or(time)
}

/// Timestamps as float seconds since the epoch.
mod epoch_secs {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_secs(time: DateTime<Utc>) -> f64 {
        time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9
    }

    /// The whole and fractional parts are converted apart, so that the
    /// nanoseconds are rounded once and `to_secs` gives back `secs` exactly.
    pub fn from_secs(secs: f64) -> Option<DateTime<Utc>> {
        if !secs.is_finite() {
            return None;
        }
        let whole = secs.floor();
        let mut whole_secs = whole as i64;
        let mut nanos = ((secs - whole) * 1e9).round() as u32;
        if nanos >= 1_000_000_000 {
            whole_secs += 1;
            nanos -= 1_000_000_000;
        }
        Utc.timestamp_opt(whole_secs, nanos).single()
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_f64(to_secs(*time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(secs) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        from_secs(secs)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}")))
    }
}
