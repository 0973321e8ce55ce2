use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use camino::Utf8Path;
use colabme_engine::Report;
use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::Print,
    terminal::{Clear, ClearType},
    tty::IsTty,
};
use log::Level;

/// Reports messages to the log and draws a progress line on the terminal
#[derive(Debug)]
pub struct ConsoleReport {
    tty: bool,
    drawn: AtomicBool,
}

impl ConsoleReport {
    pub fn new() -> Self {
        Self {
            tty: io::stderr().is_tty(),
            drawn: AtomicBool::new(false),
        }
    }

    fn clear_line(&self) {
        if self.drawn.swap(false, Ordering::Relaxed) {
            let mut stderr = io::stderr();
            if let Err(err) = execute!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine)) {
                log::debug!("could not clear progress: {err}");
            }
        }
    }
}

impl Report for ConsoleReport {
    fn message(&self, level: Level, msg: &str) {
        self.clear_line();
        log::log!(target: "colabme", level, "{msg}");
    }

    fn progress(&self, done: usize, total: usize, path: &Utf8Path) {
        if !self.tty {
            log::debug!(target: "colabme", "[{done}/{total}] {path}");
            return;
        }
        self.clear_line();
        if done >= total {
            return;
        }
        let mut stderr = io::stderr();
        match execute!(stderr, Print(format!("[{done}/{total}] {path}"))) {
            Ok(()) => self.drawn.store(true, Ordering::Relaxed),
            Err(err) => log::debug!("could not draw progress: {err}"),
        }
    }
}
