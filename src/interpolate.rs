use crate::bbox::BBox;
use crate::store::{FrameTracks, BALL_ID};
use crate::track::TrackRecord;

use ndarray::prelude::*;
use tracing::debug;

/// Fills frames without a ball detection.
///
/// The four bbox coordinates are treated as independent series. Interior
/// gaps are linearly interpolated between their nearest valid neighbours,
/// trailing gaps hold the last valid value, and only then are leading gaps
/// back-filled from the first valid sample. The result has a ball in every
/// frame as soon as one frame had one; a sequence without any ball stays
/// empty. Only the bbox survives, other record fields are dropped.
pub fn interpolate_ball(ball: &[FrameTracks]) -> Vec<FrameTracks> {
    let mut series = Array2::<f64>::from_elem((ball.len(), 4), f64::NAN);

    for (mut row, frame) in series.outer_iter_mut().zip(ball) {
        if let Some(record) = frame.get(&BALL_ID) {
            for (dst, src) in row.iter_mut().zip(record.bbox.as_slice()) {
                *dst = *src as f64;
            }
        }
    }

    let missing = series.column(0).iter().filter(|v| v.is_nan()).count();

    for mut column in series.columns_mut() {
        interpolate_forward(column.view_mut());
        backfill(column.view_mut());
    }

    debug!(frames = ball.len(), filled = missing, "interpolated ball positions");

    series
        .outer_iter()
        .map(|row| {
            let mut frame = FrameTracks::new();

            if row.iter().all(|v| !v.is_nan()) {
                let bbox = [row[0] as f32, row[1] as f32, row[2] as f32, row[3] as f32];
                frame.insert(BALL_ID, TrackRecord::new(BBox::assigned(&bbox)));
            }

            frame
        })
        .collect()
}

fn interpolate_forward(mut values: ArrayViewMut1<'_, f64>) {
    let mut prev: Option<usize> = None;

    for idx in 0..values.len() {
        if values[idx].is_nan() {
            continue;
        }

        if let Some(p) = prev {
            let (from, to) = (values[p], values[idx]);
            let span = (idx - p) as f64;

            for gap in p + 1..idx {
                values[gap] = from + (to - from) * (gap - p) as f64 / span;
            }
        }

        prev = Some(idx);
    }

    if let Some(p) = prev {
        let last = values[p];
        for gap in p + 1..values.len() {
            values[gap] = last;
        }
    }
}

fn backfill(mut values: ArrayViewMut1<'_, f64>) {
    let mut next = f64::NAN;

    for idx in (0..values.len()).rev() {
        if values[idx].is_nan() {
            values[idx] = next;
        } else {
            next = values[idx];
        }
    }
}
