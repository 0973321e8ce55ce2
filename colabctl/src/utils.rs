use byte_unit::AdjustedByte;
use camino::Utf8PathBuf;
use colabme::{id::IdBuf, loc, RecordStore};
use colabme_engine::{
    gateway::gdrive::GoogleDrive,
    oauth2::{AccountKey, ServiceAccount},
};

pub type Drive = GoogleDrive<ServiceAccount>;

/// Connect to the Drive configured in `store`.
/// Returns the gateway and the id of the folder to upload to.
pub async fn connect(store: &RecordStore) -> anyhow::Result<(Drive, IdBuf)> {
    let remote = store.config().remote()?;
    log::info!(
        "Loading service from file: {}.",
        remote.service_account_file
    );
    let key = AccountKey::load_from_file(remote.service_account_file).await?;
    let client = reqwest::Client::builder().build()?;
    let auth = ServiceAccount::new(key, Some(client.clone()));
    let drive = GoogleDrive::new(auth, client).await?;
    Ok((drive, remote.root_id.to_id_buf()))
}

/// The tracker directory of the working directory, which is never uploaded
pub fn tracker_dir() -> anyhow::Result<Utf8PathBuf> {
    let dir = loc::cwd::tracker_dir()?;
    Ok(colabme::path::resolve(&dir)?)
}

pub fn adjusted_byte(val: u64) -> AdjustedByte {
    use byte_unit::{Byte, UnitType};

    let byte = Byte::from(val);
    byte.get_appropriate_unit(UnitType::Binary)
}
