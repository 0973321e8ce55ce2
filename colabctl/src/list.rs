use byte_unit::AdjustedByte;
use colabme::{RecordStore, TrackedEntry};
use colabme_engine::local::{self, Kind};

use crate::utils;

pub async fn main(store: &RecordStore) -> anyhow::Result<()> {
    if store.entries().is_empty() {
        println!("(no tracked file yet)");
    }
    for entry in store.entries() {
        let (status, size) = status(store, entry).await;
        let path = entry.path();
        let id = entry.remote_id().map(|id| id.as_str()).unwrap_or("-");
        match size {
            Some(size) => println!("{status:<8} {path}  {id}  {size:#.1}"),
            None => println!("{status:<8} {path}  {id}"),
        }
    }

    if !store.ignored().is_empty() {
        println!();
        println!("Ignored:");
        for path in store.ignored() {
            println!("  {path}");
        }
    }
    Ok(())
}

async fn status(store: &RecordStore, entry: &TrackedEntry) -> (&'static str, Option<AdjustedByte>) {
    if store.is_ignored(entry.path()) {
        return ("ignored", None);
    }
    match local::stat(entry.path()).await {
        Ok(Some(Kind::Regular { size, mtime })) => {
            let status = if entry.is_stale(mtime) {
                "stale"
            } else if entry.is_uploaded() {
                "uploaded"
            } else {
                "pending"
            };
            (status, Some(utils::adjusted_byte(size)))
        }
        Ok(Some(_)) if entry.is_uploaded() => ("uploaded", None),
        Ok(Some(_)) => ("pending", None),
        Ok(None) => ("missing", None),
        Err(err) => {
            log::warn!("Could not access {}: {err}", entry.path());
            ("missing", None)
        }
    }
}
