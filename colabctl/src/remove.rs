use camino::Utf8PathBuf;
use colabme::RecordStore;
use colabme_engine::{Report, Session};

use crate::{console::ConsoleReport, utils};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Files or directories to delete from the Drive
    files: Vec<Utf8PathBuf>,

    /// Delete every tracked file
    #[clap(long, short = 'a')]
    all: bool,
}

pub async fn main(args: Args, store: &mut RecordStore) -> anyhow::Result<()> {
    let (drive, _) = utils::connect(store).await?;
    let report = ConsoleReport::new();
    let mut session = Session::new(store, &drive, &report);

    let summary = if args.all {
        report.info("Removing all tracked files.");
        session.remove_all().await
    } else if !args.files.is_empty() {
        report.info("Removing specified files.");
        session.remove(&args.files).await
    } else {
        report.warn("No file specified. Use --all to remove every tracked file.");
        return Ok(());
    };
    log::info!("{summary}");

    Ok(())
}
