//! Synchronization of local paths with a remote storage.
//!
//! A [`Session`] borrows the [`colabme::RecordStore`] of a project and drives
//! a [`gateway::Gateway`] to upload, update or delete what the store tracks.

pub mod gateway;
pub mod local;
pub mod oauth2;
pub mod report;

mod reconcile;
mod remove;
mod session;

pub use report::{LogReport, Report};
pub use session::{Session, Summary};
