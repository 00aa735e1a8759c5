use crate::bbox::{BBox, Ltrb};
use crate::error::Error;

use serde_derive::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const PLAYER: &str = "player";
pub const GOALKEEPER: &str = "goalkeeper";
pub const REFEREE: &str = "referee";
pub const BALL: &str = "ball";

/// Class index to label mapping reported by the detector for one frame.
///
/// The mapping is not stable across frames or model versions and is always
/// consulted fresh.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ClassMap(BTreeMap<u32, String>);

impl ClassMap {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self(names.into_iter().map(|(k, v)| (k, v.into())).collect())
    }

    #[inline]
    pub fn label(&self, class_id: u32) -> Option<&str> {
        self.0.get(&class_id).map(String::as_str)
    }

    /// Label to index. When a label appears twice the highest index wins.
    pub fn inverse(&self) -> HashMap<&str, u32> {
        self.0.iter().map(|(k, v)| (v.as_str(), *k)).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw detector output, class given as an index into the frame's [`ClassMap`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "c")]
    pub class_id: u32,
    #[serde(rename = "p")]
    pub confidence: f32,
}

/// Everything the detector reports for a single frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DetectorFrame {
    pub detections: Vec<RawDetection>,
    pub names: ClassMap,
}

impl DetectorFrame {
    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &RawDetection> {
        self.detections.iter()
    }
}

/// A detection with its class resolved to a label.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub bbox: BBox<Ltrb>,
    pub class_id: u32,
    pub class: String,
    pub confidence: f32,
}

impl DetectionRecord {
    #[inline]
    pub fn is(&self, label: &str) -> bool {
        self.class == label
    }
}

/// Folds classes the detector confuses into their canonical class.
///
/// The detector keeps swapping `goalkeeper` and `player`, so by default the
/// former is rewritten into the latter.
#[derive(Debug, Clone)]
pub struct ClassCorrection {
    aliases: HashMap<String, String>,
}

impl Default for ClassCorrection {
    fn default() -> Self {
        Self::new([(GOALKEEPER, PLAYER)])
    }
}

impl ClassCorrection {
    pub fn new<I, A, C>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect(),
        }
    }

    /// Canonical label for `label`, or `label` itself when it has no alias.
    pub fn canonical<'a>(&'a self, label: &'a str) -> &'a str {
        self.aliases.get(label).map(String::as_str).unwrap_or(label)
    }

    /// Rewrites aliased class ids in place and returns how many were changed.
    ///
    /// Either every rewrite is applied or, on error, none is.
    pub fn correct(&self, frame: &mut DetectorFrame) -> Result<usize, Error> {
        let inverse = frame.names.inverse();
        let mut rewrites = Vec::new();

        for (idx, det) in frame.detections.iter().enumerate() {
            let label = frame
                .names
                .label(det.class_id)
                .ok_or(Error::UnknownClass(det.class_id))?;

            let canonical = self.canonical(label);
            if canonical != label {
                let class_id = *inverse
                    .get(canonical)
                    .ok_or_else(|| Error::MissingClass(canonical.to_string()))?;

                if class_id != det.class_id {
                    rewrites.push((idx, class_id));
                }
            }
        }

        for &(idx, class_id) in &rewrites {
            frame.detections[idx].class_id = class_id;
        }

        Ok(rewrites.len())
    }

    /// Class-corrected, label-resolved detections of one frame.
    pub fn normalize(&self, frame: &DetectorFrame) -> Result<Vec<DetectionRecord>, Error> {
        let mut frame = frame.clone();
        self.correct(&mut frame)?;

        frame
            .detections
            .iter()
            .map(|det| {
                let class = frame
                    .names
                    .label(det.class_id)
                    .ok_or(Error::UnknownClass(det.class_id))?;

                Ok(DetectionRecord {
                    bbox: det.bbox,
                    class_id: det.class_id,
                    class: class.to_string(),
                    confidence: det.confidence,
                })
            })
            .collect()
    }
}
