use camino::Utf8PathBuf;
use colabme::RecordStore;

#[derive(clap::Args, Debug)]
pub struct IgnoreArgs {
    /// Files or directories to exclude from upload
    files: Vec<Utf8PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct UnignoreArgs {
    /// Files or directories to allow again
    files: Vec<Utf8PathBuf>,

    /// Clear the ignored list
    #[clap(long, short = 'a')]
    all: bool,
}

pub fn ignore(args: IgnoreArgs, store: &mut RecordStore) -> anyhow::Result<()> {
    if args.files.is_empty() {
        return Ok(());
    }
    let added = store.ignore_paths(&args.files)?;
    log::info!("Ignoring {} new path(s).", added.len());
    Ok(())
}

pub fn unignore(args: UnignoreArgs, store: &mut RecordStore) -> anyhow::Result<()> {
    if !args.files.is_empty() {
        let removed = store.unignore_paths(&args.files)?;
        log::info!("Unignored {removed} path(s).");
    }
    if args.all {
        log::info!("Unignoring all files.");
        store.unignore_all();
    }
    Ok(())
}
