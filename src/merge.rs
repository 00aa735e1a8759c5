use crate::detection::{DetectionRecord, BALL, PLAYER, REFEREE};
use crate::error::Error;
use crate::store::{FrameEntry, TrackStore, BALL_ID};
use crate::track::TrackRecord;
use crate::Tracking;

use tracing::{debug, warn};

/// Reconciles per-frame detections with the identities of a [`Tracking`] implementation.
pub struct MergeEngine<T> {
    tracker: T,
    next_frame: usize,
}

impl<T: Tracking> MergeEngine<T> {
    pub fn new(tracker: T) -> Self {
        Self {
            tracker,
            next_frame: 0,
        }
    }

    /// Index the next call to [`MergeEngine::merge`] must carry.
    #[inline]
    pub fn next_frame(&self) -> usize {
        self.next_frame
    }

    /// Fills frame `frame_index` of `store` from its normalized detections.
    ///
    /// Players and referees take their identity from the tracker. The ball
    /// bypasses the tracker and is stored under [`BALL_ID`]; with several ball
    /// detections in one frame the last one wins. Nothing is written when the
    /// tracker fails or returns malformed output.
    pub fn merge(
        &mut self,
        store: &mut TrackStore,
        frame_index: usize,
        detections: &[DetectionRecord],
    ) -> Result<(), Error> {
        if frame_index != self.next_frame {
            return Err(Error::FrameOrder {
                expected: self.next_frame,
                got: frame_index,
            });
        }

        if frame_index >= store.len() {
            return Err(Error::FrameOutOfRange {
                index: frame_index,
                len: store.len(),
            });
        }

        let tracked = self.tracker.update(detections)?;
        self.next_frame += 1;

        if tracked.len() > detections.len() {
            return Err(Error::MalformedTracks(format!(
                "{} tracks for {} detections",
                tracked.len(),
                detections.len()
            )));
        }

        let mut entry = FrameEntry::default();

        for item in &tracked {
            if item.track_id == 0 {
                return Err(Error::MalformedTracks(format!(
                    "identity 0 assigned to a `{}`",
                    item.class
                )));
            }

            if !item.bbox.is_finite() {
                return Err(Error::MalformedTracks(format!(
                    "non-finite bbox for track {}",
                    item.track_id
                )));
            }

            if item.class == PLAYER {
                entry.players.insert(item.track_id, TrackRecord::new(item.bbox));
            } else if item.class == REFEREE {
                entry.referees.insert(item.track_id, TrackRecord::new(item.bbox));
            }
        }

        let mut balls = 0;
        for det in detections.iter().filter(|d| d.is(BALL)) {
            if !det.bbox.is_finite() {
                return Err(Error::MalformedTracks(format!(
                    "non-finite ball bbox in frame {}",
                    frame_index
                )));
            }

            entry.ball.insert(BALL_ID, TrackRecord::new(det.bbox));
            balls += 1;
        }

        if balls > 1 {
            warn!(frame = frame_index, count = balls, "several balls detected, keeping the last one");
        }

        debug!(
            frame = frame_index,
            players = entry.players.len(),
            referees = entry.referees.len(),
            ball = !entry.ball.is_empty(),
            "merged frame"
        );

        store.commit_frame(frame_index, entry)
    }
}
