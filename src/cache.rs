//! Whole-store snapshots on disk.
//!
//! A snapshot is taken right after the merge pass and read back verbatim to
//! skip detection and merging on later runs. There is no version check: a
//! snapshot stays valid until the caller removes it.

use crate::error::Error;
use crate::store::TrackStore;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads a snapshot. Any failure, including a corrupt file, is a miss.
pub fn load<P: AsRef<Path>>(path: P) -> Option<TrackStore> {
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), %err, "track cache miss");
            return None;
        }
    };

    let store: TrackStore = match serde_json::from_reader(BufReader::new(file)) {
        Ok(store) => store,
        Err(err) => {
            warn!(path = %path.display(), %err, "unreadable track cache, ignoring it");
            return None;
        }
    };

    if !store.is_consistent() {
        warn!(path = %path.display(), "track cache categories disagree on frame count, ignoring it");
        return None;
    }

    info!(path = %path.display(), frames = store.len(), "loaded tracks from cache");
    Some(store)
}

/// Writes a snapshot next to `path` and moves it into place.
pub fn save<P: AsRef<Path>>(path: P, store: &TrackStore) -> Result<(), Error> {
    let path = path.as_ref();

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, store)?;
        writer.flush()?;
    }

    fs::rename(&tmp, path)?;
    info!(path = %path.display(), frames = store.len(), "saved tracks to cache");

    Ok(())
}
