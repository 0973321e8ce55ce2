#![cfg(test)]

use std::sync::Once;

use colabme::RecordStore;

mod dataset;
mod harness;
mod utils;
mod stubs {
    pub mod remote;
    pub mod report;
}
mod tests;

use harness::Harness;

static LOG_INIT: Once = Once::new();

async fn harness() -> Harness {
    LOG_INIT.call_once(env_logger::init);

    let root = utils::temp_path(Some("colabme-local"), None);
    tokio::fs::create_dir(&root).await.unwrap();
    let root = root.canonicalize_utf8().unwrap();

    dataset::create_dataset(&root, dataset::DATASET).await;

    Harness {
        root,
        remote: stubs::remote::Stub::new().await,
        report: stubs::report::Recorder::default(),
        store: RecordStore::new(),
    }
}
