use crate::error::Error;
use crate::track::{Category, TrackRecord};

use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity under which the ball is stored in every frame.
pub const BALL_ID: u32 = 1;

/// Identity to record mapping of one category in one frame.
pub type FrameTracks = BTreeMap<u32, TrackRecord>;

/// New content for all three categories of one frame, committed at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameEntry {
    pub players: FrameTracks,
    pub referees: FrameTracks,
    pub ball: FrameTracks,
}

/// Per-category, per-frame tracks of a whole video.
///
/// The three sequences always hold one (possibly empty) mapping per frame;
/// their length is fixed when the store is created.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrackStore {
    players: Vec<FrameTracks>,
    referees: Vec<FrameTracks>,
    ball: Vec<FrameTracks>,
}

impl TrackStore {
    pub fn new(frame_count: usize) -> Self {
        Self {
            players: vec![FrameTracks::new(); frame_count],
            referees: vec![FrameTracks::new(); frame_count],
            ball: vec![FrameTracks::new(); frame_count],
        }
    }

    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// `false` for a deserialized snapshot whose categories disagree on the frame count.
    pub fn is_consistent(&self) -> bool {
        self.players.len() == self.referees.len() && self.players.len() == self.ball.len()
    }

    #[inline]
    pub fn players(&self) -> &[FrameTracks] {
        &self.players
    }

    #[inline]
    pub fn referees(&self) -> &[FrameTracks] {
        &self.referees
    }

    #[inline]
    pub fn ball(&self) -> &[FrameTracks] {
        &self.ball
    }

    #[inline]
    pub fn category(&self, category: Category) -> &[FrameTracks] {
        match category {
            Category::Players => &self.players,
            Category::Referees => &self.referees,
            Category::Ball => &self.ball,
        }
    }

    #[inline]
    fn category_mut(&mut self, category: Category) -> &mut [FrameTracks] {
        match category {
            Category::Players => &mut self.players,
            Category::Referees => &mut self.referees,
            Category::Ball => &mut self.ball,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), Error> {
        if index < self.len() {
            Ok(())
        } else {
            Err(Error::FrameOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    pub fn frame(&self, category: Category, index: usize) -> Option<&FrameTracks> {
        self.category(category).get(index)
    }

    pub fn get(&self, category: Category, index: usize, track_id: u32) -> Option<&TrackRecord> {
        self.frame(category, index)?.get(&track_id)
    }

    /// Inserts or overwrites a single record.
    pub fn insert(
        &mut self,
        category: Category,
        index: usize,
        track_id: u32,
        record: TrackRecord,
    ) -> Result<Option<TrackRecord>, Error> {
        self.check_index(index)?;

        Ok(self.category_mut(category)[index].insert(track_id, record))
    }

    /// Writes a frame's records, overwriting existing identities and keeping
    /// the rest of the frame as is.
    pub fn commit_frame(&mut self, index: usize, entry: FrameEntry) -> Result<(), Error> {
        self.check_index(index)?;

        self.players[index].extend(entry.players);
        self.referees[index].extend(entry.referees);
        self.ball[index].extend(entry.ball);

        Ok(())
    }

    /// Swaps the ball sequence for one of the same length.
    pub fn replace_ball(&mut self, ball: Vec<FrameTracks>) -> Result<(), Error> {
        if ball.len() != self.len() {
            return Err(Error::InconsistentStore);
        }

        self.ball = ball;
        Ok(())
    }

    /// Derives `position` of every record from its bbox.
    pub fn add_positions(&mut self) {
        for category in Category::ALL {
            for frame in self.category_mut(category) {
                for record in frame.values_mut() {
                    record.position = Some(category.anchor(&record.bbox));
                }
            }
        }
    }

    pub fn iter(&self, category: Category) -> impl Iterator<Item = (usize, u32, &TrackRecord)> {
        self.category(category)
            .iter()
            .enumerate()
            .flat_map(|(idx, frame)| frame.iter().map(move |(id, rec)| (idx, *id, rec)))
    }
}
