use crate::store::TrackStore;

use serde_derive::{Deserialize, Serialize};

pub type TeamId = u8;

pub const TEAM_A: TeamId = 1;
pub const TEAM_B: TeamId = 2;

/// Per-frame team in control of the ball, appended once per processed frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct PossessionLog {
    labels: Vec<Option<TeamId>>,
}

impl PossessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(frames: usize) -> Self {
        Self {
            labels: Vec::with_capacity(frames),
        }
    }

    /// Derives labels from the `has_ball` and `team` attributes of player records.
    ///
    /// A frame where nobody holds the ball keeps the previous frame's label.
    pub fn from_tracks(store: &TrackStore) -> Self {
        let mut log = Self::with_capacity(store.len());
        let mut current = None;

        for frame in store.players() {
            if let Some(team) = frame
                .values()
                .filter(|r| r.holds_ball())
                .find_map(|r| r.team)
            {
                current = Some(team);
            }

            log.push(current);
        }

        log
    }

    #[inline]
    pub fn push(&mut self, team: Option<TeamId>) {
        self.labels.push(team);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn get(&self, frame: usize) -> Option<TeamId> {
        self.labels.get(frame).copied().flatten()
    }

    #[inline]
    pub fn labels(&self) -> &[Option<TeamId>] {
        &self.labels
    }

    /// Share of frames `0..=upto_frame` each team controlled the ball, as
    /// fractions of the frames where one of the two teams had it.
    ///
    /// Returns `(0.0, 0.0)` while neither team has had the ball.
    pub fn percentage(&self, upto_frame: usize) -> (f32, f32) {
        let end = upto_frame.saturating_add(1).min(self.labels.len());

        let (mut a, mut b) = (0usize, 0usize);
        for label in &self.labels[..end] {
            match *label {
                Some(TEAM_A) => a += 1,
                Some(TEAM_B) => b += 1,
                _ => (),
            }
        }

        let total = a + b;
        if total == 0 {
            return (0.0, 0.0);
        }

        (
            (a as f64 / total as f64) as f32,
            (b as f64 / total as f64) as f32,
        )
    }
}

impl FromIterator<Option<TeamId>> for PossessionLog {
    fn from_iter<I: IntoIterator<Item = Option<TeamId>>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::track::{Category, TrackRecord};

    #[test]
    fn prefix_window() {
        let log: PossessionLog = [Some(1), Some(1), Some(2), None, Some(2), Some(2)]
            .into_iter()
            .collect();

        assert_eq!(log.percentage(0), (1.0, 0.0));
        assert_eq!(log.percentage(2), (2.0 / 3.0, 1.0 / 3.0));
        assert_eq!(log.percentage(3), log.percentage(2));
        assert_eq!(log.percentage(5), (0.4, 0.6));
    }

    #[test]
    fn shares_sum_to_one() {
        let log: PossessionLog = [None, Some(2), Some(1), Some(1), Some(2), Some(1), Some(1)]
            .into_iter()
            .collect();

        for k in 1..log.len() {
            let (a, b) = log.percentage(k);
            assert!((a + b - 1.0).abs() < 1e-6, "frame {}: {} + {}", k, a, b);
        }
    }

    #[test]
    fn nobody_in_control_is_neutral() {
        let log: PossessionLog = [None, None].into_iter().collect();

        assert_eq!(log.percentage(1), (0.0, 0.0));
        assert_eq!(PossessionLog::new().percentage(10), (0.0, 0.0));
    }

    #[test]
    fn window_up_to_usize_max() {
        let log: PossessionLog = [Some(1), Some(2), Some(1), Some(1)].into_iter().collect();

        assert_eq!(log.percentage(usize::MAX), (0.75, 0.25));
    }

    #[test]
    fn window_past_end_is_clamped() {
        let log: PossessionLog = [Some(2)].into_iter().collect();

        assert_eq!(log.percentage(99), (0.0, 1.0));
    }

    #[test]
    fn derived_from_ball_holders() {
        let mut store = TrackStore::new(4);
        let mut holder = TrackRecord::new(BBox::ltrb(0.0, 0.0, 1.0, 1.0));
        holder.has_ball = Some(true);
        holder.team = Some(TEAM_B);

        store.insert(Category::Players, 1, 5, holder.clone()).unwrap();
        store
            .insert(Category::Players, 2, 6, TrackRecord::new(BBox::ltrb(0.0, 0.0, 1.0, 1.0)))
            .unwrap();
        holder.team = Some(TEAM_A);
        store.insert(Category::Players, 3, 8, holder).unwrap();

        let log = PossessionLog::from_tracks(&store);

        assert_eq!(log.labels(), [None, Some(TEAM_B), Some(TEAM_B), Some(TEAM_A)]);
    }
}
