use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};

pub fn temp_path(prefix: Option<&str>, ext: Option<&str>) -> Utf8PathBuf {
    use rand::{distributions::Alphanumeric, Rng};

    let mut filename = String::new();
    if let Some(prefix) = prefix {
        filename.push_str(prefix);
        filename.push('-');
    }
    let rnd: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    filename.push_str(&rnd);
    if let Some(ext) = ext {
        filename.push('.');
        filename.push_str(ext);
    }
    let mut p = std::env::temp_dir();
    p.push(filename);
    p.try_into().unwrap()
}

/// Set the modification time of the file at `path`
pub fn set_mtime(path: &Utf8Path, mtime: SystemTime) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}
