use pitchtrack::bbox::BBox;
use pitchtrack::detection::{BALL, GOALKEEPER, PLAYER, REFEREE};
use pitchtrack::detector::{DetectorConfig, ReplayDetector};
use pitchtrack::error::Error;
use pitchtrack::pipeline::{prepare_tracks, CachePolicy, Pipeline};
use pitchtrack::tracker::{IouTracker, IouTrackerConfig};
use pitchtrack::{
    ClassCorrection, ClassMap, DetectionRecord, DetectorFrame, RawDetection, TrackedObject, Tracking, BALL_ID,
};

/// Hands out one fixed identity per class, like a tracker following a single object of each.
struct FixedIds;

impl Tracking for FixedIds {
    fn update(&mut self, detections: &[DetectionRecord]) -> Result<Vec<TrackedObject>, Error> {
        Ok(detections
            .iter()
            .filter_map(|d| {
                let track_id = match d.class.as_str() {
                    PLAYER => 7,
                    REFEREE => 3,
                    _ => return None,
                };

                Some(TrackedObject {
                    track_id,
                    class: d.class.clone(),
                    bbox: d.bbox,
                })
            })
            .collect())
    }
}

fn names() -> ClassMap {
    ClassMap::new([(0, BALL), (1, GOALKEEPER), (2, PLAYER), (3, REFEREE)])
}

fn det(class_id: u32, ltrb: [f32; 4]) -> RawDetection {
    RawDetection {
        bbox: BBox::assigned(&ltrb),
        class_id,
        confidence: 0.9,
    }
}

fn frame(detections: Vec<RawDetection>) -> DetectorFrame {
    DetectorFrame {
        detections,
        names: names(),
    }
}

fn three_frames() -> Vec<DetectorFrame> {
    vec![
        frame(vec![det(2, [10.0, 10.0, 50.0, 90.0]), det(0, [20.0, 20.0, 30.0, 30.0])]),
        frame(vec![det(2, [12.0, 10.0, 52.0, 90.0])]),
        frame(vec![det(0, [25.0, 25.0, 35.0, 35.0])]),
    ]
}

fn pipeline(frames: Vec<DetectorFrame>) -> Pipeline<ReplayDetector, FixedIds> {
    Pipeline::new(
        ReplayDetector::new(frames),
        FixedIds,
        ClassCorrection::default(),
        DetectorConfig::default(),
    )
}

#[test]
fn test_tracks_and_ball_gap() {
    let mut pipeline = pipeline(three_frames());
    let mut store = pipeline.object_tracks(&[(), (), ()], None).unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.players()[0][&7].bbox, BBox::ltrb(10.0, 10.0, 50.0, 90.0));
    assert_eq!(store.players()[1][&7].bbox, BBox::ltrb(12.0, 10.0, 52.0, 90.0));
    assert!(store.players()[2].is_empty());
    assert!(store.ball()[1].is_empty());

    prepare_tracks(&mut store).unwrap();

    let ball = &store.ball()[1][&BALL_ID];
    assert_eq!(ball.bbox, BBox::ltrb(22.5, 22.5, 32.5, 32.5));
    let center = ball.position.unwrap();
    assert_eq!((center.x, center.y), (27.5, 27.5));

    let foot = store.players()[0][&7].position.unwrap();
    assert_eq!((foot.x, foot.y), (30.0, 90.0));

    assert_eq!(store.players().len(), 3);
    assert_eq!(store.referees().len(), 3);
    assert_eq!(store.ball().len(), 3);
}

#[test]
fn test_goalkeeper_tracked_as_player() {
    let mut pipeline = pipeline(vec![frame(vec![det(1, [0.0, 0.0, 10.0, 30.0])])]);
    let store = pipeline.object_tracks(&[()], None).unwrap();

    assert_eq!(store.players()[0].len(), 1);
    assert!(store.players()[0].contains_key(&7));
}

#[test]
fn test_unknown_class_fails_run() {
    let mut pipeline = pipeline(vec![frame(vec![det(9, [0.0, 0.0, 10.0, 30.0])])]);

    assert!(matches!(
        pipeline.object_tracks(&[()], None),
        Err(Error::UnknownClass(9))
    ));
}

#[test]
fn test_cache_skips_detection() {
    let dir = tempfile::tempdir().unwrap();
    let policy = CachePolicy::new(dir.path().join("stubs").join("tracks.json"), true);

    let first = pipeline(three_frames())
        .object_tracks(&[(), (), ()], Some(&policy))
        .unwrap();
    assert!(policy.path.exists());

    // Nothing left to replay: only a cache hit can succeed.
    let second = pipeline(vec![])
        .object_tracks(&[(), (), ()], Some(&policy))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_cache_ignored_on_frame_count_or_read_flag() {
    let dir = tempfile::tempdir().unwrap();
    let policy = CachePolicy::new(dir.path().join("tracks.json"), true);

    pipeline(three_frames())
        .object_tracks(&[(), (), ()], Some(&policy))
        .unwrap();

    assert!(matches!(
        pipeline(vec![]).object_tracks(&[(), (), (), ()], Some(&policy)),
        Err(Error::DetectorMismatch { .. })
    ));

    let no_read = CachePolicy::new(policy.path.clone(), false);
    assert!(matches!(
        pipeline(vec![]).object_tracks(&[(), (), ()], Some(&no_read)),
        Err(Error::DetectorMismatch { .. })
    ));
}

#[test]
fn test_iou_tracker_keeps_identity() {
    let mut pipeline = Pipeline::new(
        ReplayDetector::new(three_frames()),
        IouTracker::new(IouTrackerConfig::default()),
        ClassCorrection::default(),
        DetectorConfig::default(),
    );

    let store = pipeline.object_tracks(&[(), (), ()], None).unwrap();

    let first: Vec<_> = store.players()[0].keys().copied().collect();
    let second: Vec<_> = store.players()[1].keys().copied().collect();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_ne!(first[0], 0);
}
