pub mod bbox;
pub mod cache;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod frame;
pub mod interpolate;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod possession;
pub mod render;
pub mod store;
pub mod tracker;

mod track;

pub use detection::{ClassCorrection, ClassMap, DetectionRecord, DetectorFrame, RawDetection};
pub use frame::Frame;
pub use store::{FrameEntry, FrameTracks, TrackStore, BALL_ID};
pub use track::{Category, Color, TrackRecord, TrackedObject};

use error::Error;

/// Multi-object tracker assigning persistent identities to detections.
///
/// Implementations keep their own motion state, so `update` must be called
/// exactly once per frame, in frame order. Every returned item echoes one
/// input detection together with its identity; identities are positive.
pub trait Tracking {
    fn update(&mut self, detections: &[DetectionRecord]) -> Result<Vec<TrackedObject>, Error>;
}

impl<T: Tracking + ?Sized> Tracking for Box<T> {
    #[inline]
    fn update(&mut self, detections: &[DetectionRecord]) -> Result<Vec<TrackedObject>, Error> {
        (**self).update(detections)
    }
}
