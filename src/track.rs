use crate::bbox::{BBox, Ltrb};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// RGB color.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);
    pub const RED: Color = Color([255, 0, 0]);
    pub const GREEN: Color = Color([0, 255, 0]);
    pub const YELLOW: Color = Color([255, 255, 0]);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

/// The three object categories kept by the track store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Players,
    Referees,
    Ball,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Players, Category::Referees, Category::Ball];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Players => "players",
            Category::Referees => "referees",
            Category::Ball => "ball",
        }
    }

    /// Reference point of an object of this category: feet for people, center for the ball.
    #[inline]
    pub fn anchor(&self, bbox: &BBox<Ltrb>) -> na::Point2<f32> {
        match self {
            Category::Ball => bbox.center(),
            Category::Players | Category::Referees => bbox.foot(),
        }
    }
}

/// Everything known about one object in one frame.
///
/// `position` is derived from `bbox` and may be recomputed at any time.
/// `team`, `team_color` and `has_ball` are written by external collaborators
/// after the merge pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub bbox: BBox<Ltrb>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<na::Point2<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_color: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_ball: Option<bool>,
}

impl TrackRecord {
    pub fn new(bbox: BBox<Ltrb>) -> Self {
        Self {
            bbox,
            position: None,
            team: None,
            team_color: None,
            has_ball: None,
        }
    }

    #[inline]
    pub fn holds_ball(&self) -> bool {
        self.has_ball.unwrap_or(false)
    }
}

/// One detection echoed back by a [`crate::Tracking`] implementation with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub track_id: u32,
    pub class: String,
    pub bbox: BBox<Ltrb>,
}
