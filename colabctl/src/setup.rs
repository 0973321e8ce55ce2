use camino::Utf8PathBuf;
use colabme::{id::IdBuf, loc, RecordStore};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Google service account key file
    #[clap(long, short = 's')]
    service: Option<Utf8PathBuf>,

    /// ID of the Drive folder to upload to
    #[clap(long, short = 'p')]
    parent: Option<String>,
}

pub async fn main(args: Args, store: &mut RecordStore) -> anyhow::Result<()> {
    let dir = loc::cwd::tracker_dir()?;
    if !dir.is_dir() {
        log::info!("Creating .colabme directory in the current working directory: {dir}.");
        tokio::fs::create_dir_all(&dir).await?;
    }

    if let Some(service) = args.service {
        let service = colabme::path::absolute(&service)?;
        if !service.is_file() {
            log::warn!("{service} does not exist yet.");
        }
        log::info!("Service account file set to: {service}.");
        store.config_mut().service_account_file = Some(service);
    }

    if let Some(parent) = args.parent {
        log::info!("Parent ID set to: {parent}.");
        store.config_mut().parent_id = Some(IdBuf::from(parent));
    }

    Ok(())
}
