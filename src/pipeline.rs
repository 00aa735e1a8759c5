use crate::cache;
use crate::detection::ClassCorrection;
use crate::detector::{detect_frames, DetectorConfig, ObjectDetector};
use crate::error::Error;
use crate::interpolate::interpolate_ball;
use crate::merge::MergeEngine;
use crate::store::TrackStore;
use crate::track::Category;
use crate::Tracking;

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the post-merge snapshot lives and whether an existing one may be reused.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub path: PathBuf,
    pub read: bool,
}

impl CachePolicy {
    pub fn new<P: Into<PathBuf>>(path: P, read: bool) -> Self {
        Self {
            path: path.into(),
            read,
        }
    }
}

/// Detection, class correction and identity merge over a whole video.
pub struct Pipeline<D, T> {
    detector: D,
    merge: MergeEngine<T>,
    correction: ClassCorrection,
    config: DetectorConfig,
}

impl<D, T: Tracking> Pipeline<D, T> {
    pub fn new(detector: D, tracker: T, correction: ClassCorrection, config: DetectorConfig) -> Self {
        Self {
            detector,
            merge: MergeEngine::new(tracker),
            correction,
            config,
        }
    }

    /// Tracks of every frame, as they stand right after the merge pass.
    ///
    /// A usable snapshot under `cache` short-circuits detection and merging.
    /// A freshly computed store is saved there; failing to save only logs.
    /// Any frame failing detection, correction or merge fails the whole run.
    /// The tracker is stateful, so a pipeline computes tracks for one video only.
    pub fn object_tracks<I>(&mut self, frames: &[I], cache: Option<&CachePolicy>) -> Result<TrackStore, Error>
    where
        D: ObjectDetector<I>,
    {
        if let Some(store) = cache.filter(|c| c.read).and_then(|c| load_matching(&c.path, frames.len())) {
            return Ok(store);
        }

        let detections = detect_frames(&mut self.detector, frames, &self.config)?;
        let mut store = TrackStore::new(frames.len());

        for (index, frame) in detections.iter().enumerate() {
            let records = self.correction.normalize(frame)?;
            self.merge.merge(&mut store, index, &records)?;
        }

        info!(frames = store.len(), "merged tracks");

        if let Some(policy) = cache {
            if let Err(err) = cache::save(&policy.path, &store) {
                warn!(path = %policy.path.display(), %err, "failed to save track cache");
            }
        }

        Ok(store)
    }
}

fn load_matching(path: &Path, frame_count: usize) -> Option<TrackStore> {
    let store = cache::load(path)?;

    if store.len() != frame_count {
        warn!(
            path = %path.display(),
            cached = store.len(),
            frames = frame_count,
            "track cache holds a different frame count, ignoring it"
        );
        return None;
    }

    Some(store)
}

/// Fills ball gaps, then derives positions for every category.
pub fn prepare_tracks(store: &mut TrackStore) -> Result<(), Error> {
    let ball = interpolate_ball(store.ball());
    store.replace_ball(ball)?;
    store.add_positions();

    for category in Category::ALL {
        debug!(category = category.name(), records = store.iter(category).count(), "prepared tracks");
    }

    Ok(())
}
