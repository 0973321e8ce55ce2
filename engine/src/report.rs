use camino::Utf8Path;
use log::Level;

/// Side channel through which a session reports what it is doing.
///
/// Reporting never influences the outcome of an operation.
pub trait Report: Send + Sync {
    fn message(&self, level: Level, msg: &str);

    /// `done` out of `total` input paths were processed, the last one being `path`.
    fn progress(&self, _done: usize, _total: usize, _path: &Utf8Path) {}

    fn info(&self, msg: &str) {
        self.message(Level::Info, msg)
    }

    fn warn(&self, msg: &str) {
        self.message(Level::Warn, msg)
    }

    fn error(&self, msg: &str) {
        self.message(Level::Error, msg)
    }
}

/// Forwards messages to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReport;

impl Report for LogReport {
    fn message(&self, level: Level, msg: &str) {
        log::log!(target: "colabme", level, "{msg}");
    }

    fn progress(&self, done: usize, total: usize, path: &Utf8Path) {
        log::debug!(target: "colabme", "[{done}/{total}] {path}");
    }
}

impl<R: Report + ?Sized> Report for &R {
    fn message(&self, level: Level, msg: &str) {
        (**self).message(level, msg)
    }

    fn progress(&self, done: usize, total: usize, path: &Utf8Path) {
        (**self).progress(done, total, path)
    }
}
