use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use colabme::RecordStore;

use crate::{gateway::Gateway, report::Report};

/// Counts of what happened during an operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Files uploaded, for the first time or again
    pub uploaded: usize,
    /// Folders created
    pub created: usize,
    /// Remote objects deleted by a removal
    pub deleted: usize,
    /// Entries already up to date
    pub unchanged: usize,
    /// Paths skipped: ignored, missing, untracked...
    pub skipped: usize,
    /// Operations that failed
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} folders created, {} deleted, {} up to date, {} skipped, {} failed",
            self.uploaded, self.created, self.deleted, self.unchanged, self.skipped, self.failed
        )
    }
}

/// One reconciliation or removal run.
///
/// The session operates the remote storage through `gateway` and records
/// the outcome in `store`. Remote operations are issued one at a time.
/// Failures are reported through `report` and never abort the run; the
/// entries they concern are left untouched.
pub struct Session<'a, G, R> {
    pub(crate) store: &'a mut RecordStore,
    pub(crate) gateway: &'a G,
    pub(crate) report: &'a R,
    exclude: Vec<Utf8PathBuf>,
}

impl<'a, G, R> Session<'a, G, R>
where
    G: Gateway,
    R: Report,
{
    pub fn new(store: &'a mut RecordStore, gateway: &'a G, report: &'a R) -> Self {
        Session {
            store,
            gateway,
            report,
            exclude: Vec::new(),
        }
    }

    /// Never reconcile `path` nor anything below it.
    /// `path` must be canonical.
    pub fn exclude(mut self, path: Utf8PathBuf) -> Self {
        self.exclude.push(path);
        self
    }

    pub fn store(&self) -> &RecordStore {
        self.store
    }

    pub(crate) fn is_excluded(&self, path: &Utf8Path) -> bool {
        self.exclude.iter().any(|ex| path.starts_with(ex))
    }
}
