use crate::detection::DetectorFrame;
use crate::error::Error;

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info};

/// Object detection model producing raw per-frame detections.
///
/// Detections below `confidence_threshold` are expected to be dropped by the
/// implementation. Exactly one [`DetectorFrame`] must be returned per input.
pub trait ObjectDetector<I> {
    fn detect(&mut self, batch: &[I], confidence_threshold: f32) -> Result<Vec<DetectorFrame>, Error>;
}

impl<I, D: ObjectDetector<I> + ?Sized> ObjectDetector<I> for Box<D> {
    #[inline]
    fn detect(&mut self, batch: &[I], confidence_threshold: f32) -> Result<Vec<DetectorFrame>, Error> {
        (**self).detect(batch, confidence_threshold)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub confidence_threshold: f32,
    pub batch_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.1,
            batch_size: 20,
        }
    }
}

/// Runs the detector over `frames` in chunks of `config.batch_size`.
pub fn detect_frames<I, D>(detector: &mut D, frames: &[I], config: &DetectorConfig) -> Result<Vec<DetectorFrame>, Error>
where
    D: ObjectDetector<I> + ?Sized,
{
    let mut detections = Vec::with_capacity(frames.len());

    for batch in frames.chunks(config.batch_size.max(1)) {
        let result = detector.detect(batch, config.confidence_threshold)?;

        if result.len() != batch.len() {
            return Err(Error::DetectorMismatch {
                expected: batch.len(),
                got: result.len(),
            });
        }

        detections.extend(result);
        debug!(done = detections.len(), total = frames.len(), "detected batch");
    }

    Ok(detections)
}

/// Replays detections dumped earlier, one JSON encoded [`DetectorFrame`] per line.
///
/// The frames handed to [`ObjectDetector::detect`] are ignored; only their
/// count matters.
#[derive(Debug, Default)]
pub struct ReplayDetector {
    frames: VecDeque<DetectorFrame>,
}

impl ReplayDetector {
    pub fn new<I: IntoIterator<Item = DetectorFrame>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut frames = VecDeque::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            frames.push_back(serde_json::from_str(line)?);
        }

        Ok(Self { frames })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path.as_ref())?;
        let detector = Self::from_reader(std::io::BufReader::new(file))?;
        info!(path = %path.as_ref().display(), frames = detector.len(), "loaded detection dump");

        Ok(detector)
    }

    /// Frames not replayed yet.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<I> ObjectDetector<I> for ReplayDetector {
    fn detect(&mut self, batch: &[I], confidence_threshold: f32) -> Result<Vec<DetectorFrame>, Error> {
        if batch.len() > self.frames.len() {
            return Err(Error::DetectorMismatch {
                expected: batch.len(),
                got: self.frames.len(),
            });
        }

        Ok(self
            .frames
            .drain(..batch.len())
            .map(|mut frame| {
                frame
                    .detections
                    .retain(|d| d.confidence >= confidence_threshold);
                frame
            })
            .collect())
    }
}
