//! Capabilities of the remote storage.
//!
//! Remote objects and folders are addressed by opaque [`Id`]s. A `None`
//! parent designates the root of the storage.

use camino::Utf8Path;
use colabme::id::{Id, IdBuf};
use futures::Future;

pub mod gdrive;

/// A trait to create folders
pub trait MkDir {
    /// Creates a folder named `name` in `parent_id` and returns its id.
    fn mkdir(
        &self,
        parent_id: Option<&Id>,
        name: &str,
    ) -> impl Future<Output = colabme::Result<IdBuf>> + Send;
}

/// A trait to upload files
pub trait CreateFile {
    /// Uploads the local file at `path` into `parent_id` and returns the id of the new object.
    /// The file content is streamed. On failure, no id is returned and
    /// nothing is to be considered created.
    fn create_file(
        &self,
        parent_id: Option<&Id>,
        path: &Utf8Path,
    ) -> impl Future<Output = colabme::Result<IdBuf>> + Send;
}

/// A trait to delete files or folders
pub trait Delete {
    /// Deletes the file or folder `id`, with all its content.
    /// Deleting an id that doesn't exist is not an error.
    fn delete(&self, id: &Id) -> impl Future<Output = colabme::Result<()>> + Send;
}

/// A trait for id-based remote storage
pub trait Gateway: MkDir + CreateFile + Delete + Send + Sync {}
