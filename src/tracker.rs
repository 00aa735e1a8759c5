use crate::bbox::{BBox, Ltrb};
use crate::detection::DetectionRecord;
use crate::error::Error;
use crate::track::TrackedObject;
use crate::Tracking;

use munkres::{solve_assignment, WeightMatrix};

/// Cost of a pair that must never be matched.
const UNMATCHABLE: f64 = 100000.0;

#[derive(Debug, Clone, Copy)]
pub struct IouTrackerConfig {
    pub iou_threshold: f32,
    pub max_age: u32,
}

impl Default for IouTrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_age: 30,
        }
    }
}

#[derive(Debug)]
struct Participant {
    id: u32,
    class: String,
    bbox: BBox<Ltrb>,
    time_since_update: u32,
}

/// IoU association between consecutive frames.
///
/// A stand-in for a full motion-model tracker: detections and live tracks of
/// the same class are matched by an optimal `1 - IoU` assignment, anything
/// left unmatched opens a new identity.
#[derive(Debug)]
pub struct IouTracker {
    config: IouTrackerConfig,
    participants: Vec<Participant>,
    next_id: u32,
}

impl IouTracker {
    pub fn new(config: IouTrackerConfig) -> Self {
        Self {
            config,
            participants: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of live tracks.
    #[inline]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for IouTracker {
    fn default() -> Self {
        Self::new(IouTrackerConfig::default())
    }
}

impl IouTracker {
    /// Live track index for every detection, solved as one assignment problem.
    ///
    /// Pairs of different classes or with IoU under the threshold are never
    /// matched, so the solver maximises the number of kept identities.
    fn assign(&self, detections: &[DetectionRecord]) -> Result<Vec<Option<usize>>, Error> {
        let mut assigned = vec![None; detections.len()];

        if self.participants.is_empty() || detections.is_empty() {
            return Ok(assigned);
        }

        let objs = &self.participants;
        let n = objs.len().max(detections.len());
        let threshold = self.config.iou_threshold;

        let cost = |r: usize, c: usize| -> f64 {
            if r < objs.len() && c < detections.len() && objs[r].class == detections[c].class {
                let iou = objs[r].bbox.iou(&detections[c].bbox);
                if iou.is_finite() && iou >= threshold {
                    return 1.0 - iou as f64;
                }
            }

            UNMATCHABLE
        };

        let mut mat = WeightMatrix::from_fn(n, |(r, c)| cost(r, c));
        let positions = solve_assignment(&mut mat).map_err(|err| Error::Tracker(format!("{:?}", err)))?;

        for pos in positions {
            if pos.row < objs.len() && pos.column < detections.len() && cost(pos.row, pos.column) < UNMATCHABLE {
                assigned[pos.column] = Some(pos.row);
            }
        }

        Ok(assigned)
    }
}

impl Tracking for IouTracker {
    fn update(&mut self, detections: &[DetectionRecord]) -> Result<Vec<TrackedObject>, Error> {
        let assigned = self.assign(detections)?;

        for p in self.participants.iter_mut() {
            p.time_since_update += 1;
        }

        let mut tracked = Vec::with_capacity(detections.len());
        for (det, slot) in detections.iter().zip(assigned) {
            let track_id = match slot {
                Some(pi) => {
                    let p = &mut self.participants[pi];
                    p.bbox = det.bbox;
                    p.time_since_update = 0;
                    p.id
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.participants.push(Participant {
                        id,
                        class: det.class.clone(),
                        bbox: det.bbox,
                        time_since_update: 0,
                    });
                    id
                }
            };

            tracked.push(TrackedObject {
                track_id,
                class: det.class.clone(),
                bbox: det.bbox,
            });
        }

        let max_age = self.config.max_age;
        self.participants.retain(|p| p.time_since_update <= max_age);

        Ok(tracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BALL, PLAYER};

    fn det(class: &str, x: f32) -> DetectionRecord {
        DetectionRecord {
            bbox: BBox::ltrb(x, 10.0, x + 40.0, 90.0),
            class_id: 0,
            class: class.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn identity_follows_overlapping_box() {
        let mut tracker = IouTracker::default();

        let first = tracker.update(&[det(PLAYER, 10.0), det(PLAYER, 300.0)]).unwrap();
        let second = tracker.update(&[det(PLAYER, 305.0), det(PLAYER, 12.0)]).unwrap();

        assert_eq!(first[0].track_id, second[1].track_id);
        assert_eq!(first[1].track_id, second[0].track_id);
        assert_ne!(first[0].track_id, first[1].track_id);
    }

    #[test]
    fn classes_never_share_identity() {
        let mut tracker = IouTracker::default();

        let first = tracker.update(&[det(PLAYER, 10.0)]).unwrap();
        let second = tracker.update(&[det(BALL, 10.0)]).unwrap();

        assert_ne!(first[0].track_id, second[0].track_id);
    }

    #[test]
    fn stale_tracks_expire() {
        let mut tracker = IouTracker::new(IouTrackerConfig {
            iou_threshold: 0.3,
            max_age: 1,
        });

        let first = tracker.update(&[det(PLAYER, 10.0)]).unwrap();
        tracker.update(&[]).unwrap();
        tracker.update(&[]).unwrap();
        assert!(tracker.is_empty());

        let again = tracker.update(&[det(PLAYER, 10.0)]).unwrap();
        assert_ne!(first[0].track_id, again[0].track_id);
    }

    #[test]
    fn assignment_keeps_both_identities() {
        let mut tracker = IouTracker::default();
        let wide = |x1: f32, x2: f32| DetectionRecord {
            bbox: BBox::ltrb(x1, 0.0, x2, 100.0),
            class_id: 0,
            class: PLAYER.to_string(),
            confidence: 0.9,
        };

        let first = tracker.update(&[wide(0.0, 100.0), wide(50.0, 150.0)]).unwrap();
        let second = tracker.update(&[wide(10.0, 110.0), wide(-40.0, 60.0)]).unwrap();

        assert_eq!(first.iter().map(|t| t.track_id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(second.iter().map(|t| t.track_id).collect::<Vec<_>>(), [2, 1]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn identities_are_positive() {
        let mut tracker = IouTracker::default();
        let tracked = tracker.update(&[det(PLAYER, 0.0)]).unwrap();

        assert!(tracked[0].track_id > 0);
    }
}
