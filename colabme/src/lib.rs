use chrono::{DateTime, Utc};

pub mod error;
pub mod id;
pub mod loc;
pub mod path;
pub mod record;

mod ignore;

pub use crate::error::{Error, PathError, Result};
pub use crate::record::{snapshot_time, Configuration, RecordStore, Remote, TrackedEntry};

/// Modification time of a local file, as recorded in the tracker.
///
/// The value is brought to the precision of the snapshot, so that it compares
/// equal to the recorded value of the same unchanged file.
pub fn mtime(metadata: &std::fs::Metadata) -> Result<DateTime<Utc>> {
    let mtime: DateTime<Utc> = metadata.modified()?.into();
    Ok(snapshot_time(mtime))
}
