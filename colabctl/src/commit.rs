use camino::Utf8PathBuf;
use colabme::{loc, RecordStore};
use colabme_engine::{local, Report, Session};

use crate::{console::ConsoleReport, utils};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Files or directories to upload
    files: Vec<Utf8PathBuf>,

    /// Upload again the tracked files modified since their last upload
    #[clap(long, short = 'u')]
    update: bool,

    /// Upload everything in the current directory
    #[clap(long, short = 'a')]
    all: bool,
}

pub async fn main(args: Args, store: &mut RecordStore) -> anyhow::Result<()> {
    let (drive, root_id) = utils::connect(store).await?;
    let report = ConsoleReport::new();
    let mut session = Session::new(store, &drive, &report).exclude(utils::tracker_dir()?);

    if args.update {
        report.info("Updating all tracked files.");
        let summary = session.update_all().await;
        log::info!("{summary}");
    }

    if !args.files.is_empty() {
        report.info("Uploading specified files.");
        let summary = session.reconcile(&args.files, Some(root_id.clone())).await;
        log::info!("{summary}");
    }

    if args.all {
        report.info("Uploading all files in the current directory.");
        let cwd = loc::cwd::base_dir()?;
        let (entries, errors) = local::sorted_dir_entries(&cwd).await;
        for err in errors {
            report.error(&format!("Could not list {cwd}: {err}"));
        }
        let summary = session.reconcile(entries, Some(root_id)).await;
        log::info!("{summary}");
    }

    Ok(())
}
