//! Track overlay drawing.
//!
//! Markers are first laid out as backend-neutral [`Primitive`]s and then
//! rasterized by a [`Canvas`]. Rendering never touches the caller's frame:
//! [`render_frame`] draws onto a copy.

mod raster;

#[cfg(feature = "opencv")]
mod mat;

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;
use crate::possession::PossessionLog;
use crate::store::{FrameTracks, TrackStore};
use crate::track::Color;

use nalgebra as na;
use serde_derive::Deserialize;
use tracing::debug;

/// Angular span of the identity arc, degrees clockwise from the +x axis.
pub const ARC_START: f32 = -45.0;
pub const ARC_END: f32 = 235.0;

const ARC_THICKNESS: i32 = 2;
const PLATE_WIDTH: i32 = 40;
const PLATE_HEIGHT: i32 = 20;
const PLATE_OFFSET: i32 = 15;
const TRIANGLE_HALF_WIDTH: i32 = 10;
const TRIANGLE_HEIGHT: i32 = 20;

/// Pixel rectangle, right and bottom edges exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Outline of part of an axis-aligned ellipse; angles in degrees,
    /// clockwise from +x since the image y axis points down.
    Arc {
        center: na::Point2<i32>,
        axes: (i32, i32),
        start_angle: f32,
        end_angle: f32,
        color: Color,
        thickness: i32,
    },
    FilledRect {
        rect: PixelRect,
        color: Color,
    },
    Polygon {
        points: Vec<na::Point2<i32>>,
        fill: Color,
        outline: Option<(Color, i32)>,
    },
    /// Text anchored at the left end of its baseline. `scale` 1.0 is a roughly
    /// 30 px tall font.
    Text {
        origin: na::Point2<i32>,
        text: String,
        scale: f32,
        color: Color,
        thickness: i32,
    },
    /// Rectangle blended over the frame with weight `alpha`.
    Overlay {
        rect: PixelRect,
        color: Color,
        alpha: f32,
    },
}

/// A drawing surface.
pub trait Canvas {
    fn draw(&mut self, primitive: &Primitive) -> Result<(), Error>;

    /// An independent copy of the surface.
    fn duplicate(&self) -> Result<Self, Error>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelStyle {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub alpha: f32,
    pub color: Color,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            left: 1350,
            top: 850,
            right: 1900,
            bottom: 970,
            alpha: 0.4,
            color: Color::WHITE,
        }
    }
}

impl PanelStyle {
    #[inline]
    pub fn rect(&self) -> PixelRect {
        PixelRect {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Used for players without a `team_color`.
    pub player_color: Color,
    pub referee_color: Color,
    pub ball_color: Color,
    /// Triangle over the player holding the ball.
    pub possession_color: Color,
    pub panel: PanelStyle,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            player_color: Color::RED,
            referee_color: Color::YELLOW,
            ball_color: Color::GREEN,
            possession_color: Color::RED,
            panel: PanelStyle::default(),
        }
    }
}

/// Open ring under the bbox, with the identity on a plate below it.
pub fn identity_marker(bbox: &BBox<Ltrb>, color: Color, track_id: Option<u32>) -> Vec<Primitive> {
    let y2 = bbox.bottom() as i32;
    let x_center = bbox.center().x as i32;
    let width = bbox.width();

    let mut primitives = vec![Primitive::Arc {
        center: na::Point2::new(x_center, y2),
        axes: (width as i32, (0.35 * width) as i32),
        start_angle: ARC_START,
        end_angle: ARC_END,
        color,
        thickness: ARC_THICKNESS,
    }];

    if let Some(track_id) = track_id {
        let rect = PixelRect {
            left: x_center - PLATE_WIDTH / 2,
            top: y2 - PLATE_HEIGHT / 2 + PLATE_OFFSET,
            right: x_center + PLATE_WIDTH / 2,
            bottom: y2 + PLATE_HEIGHT / 2 + PLATE_OFFSET,
        };

        let mut text_x = rect.left + 12;
        if track_id > 99 {
            text_x -= 10;
        }

        primitives.push(Primitive::FilledRect { rect, color });
        primitives.push(Primitive::Text {
            origin: na::Point2::new(text_x, rect.top + 15),
            text: track_id.to_string(),
            scale: 0.6,
            color: Color::BLACK,
            thickness: 2,
        });
    }

    primitives
}

/// Downward triangle whose tip touches the top-center of the bbox.
pub fn possession_marker(bbox: &BBox<Ltrb>, color: Color) -> Vec<Primitive> {
    let tip = bbox.top_center();
    let (x, y) = (tip.x as i32, tip.y as i32);

    vec![Primitive::Polygon {
        points: vec![
            na::Point2::new(x, y),
            na::Point2::new(x - TRIANGLE_HALF_WIDTH, y - TRIANGLE_HEIGHT),
            na::Point2::new(x + TRIANGLE_HALF_WIDTH, y - TRIANGLE_HEIGHT),
        ],
        fill: color,
        outline: Some((Color::BLACK, 2)),
    }]
}

/// Translucent panel with both teams' running ball control.
pub fn possession_panel(frame_index: usize, log: &PossessionLog, style: &PanelStyle) -> Vec<Primitive> {
    let (team_1, team_2) = log.percentage(frame_index);

    let line = |row: i32, team: u8, share: f32| Primitive::Text {
        origin: na::Point2::new(style.left + 50, style.top + 50 * row),
        text: format!("Team {} Ball Control: {:.2}%", team, share * 100.0),
        scale: 1.0,
        color: Color::BLACK,
        thickness: 3,
    };

    vec![
        Primitive::Overlay {
            rect: style.rect(),
            color: style.color,
            alpha: style.alpha,
        },
        line(1, 1, team_1),
        line(2, 2, team_2),
    ]
}

/// Every primitive of one annotated frame, in drawing order: players,
/// referees, ball, then the panel so that it is never covered.
pub fn frame_primitives(
    players: &FrameTracks,
    referees: &FrameTracks,
    ball: &FrameTracks,
    log: &PossessionLog,
    frame_index: usize,
    style: &RenderStyle,
) -> Vec<Primitive> {
    let mut primitives = Vec::new();

    for (track_id, player) in players {
        let color = player.team_color.unwrap_or(style.player_color);
        primitives.extend(identity_marker(&player.bbox, color, Some(*track_id)));

        if player.holds_ball() {
            primitives.extend(possession_marker(&player.bbox, style.possession_color));
        }
    }

    for referee in referees.values() {
        primitives.extend(identity_marker(&referee.bbox, style.referee_color, None));
    }

    for ball in ball.values() {
        primitives.extend(possession_marker(&ball.bbox, style.ball_color));
    }

    primitives.extend(possession_panel(frame_index, log, &style.panel));
    primitives
}

pub fn draw_all<C: Canvas + ?Sized>(canvas: &mut C, primitives: &[Primitive]) -> Result<(), Error> {
    for primitive in primitives {
        canvas.draw(primitive)?;
    }

    Ok(())
}

pub fn draw_identity_marker<C: Canvas + ?Sized>(
    canvas: &mut C,
    bbox: &BBox<Ltrb>,
    color: Color,
    track_id: Option<u32>,
) -> Result<(), Error> {
    draw_all(canvas, &identity_marker(bbox, color, track_id))
}

pub fn draw_possession_marker<C: Canvas + ?Sized>(
    canvas: &mut C,
    bbox: &BBox<Ltrb>,
    color: Color,
) -> Result<(), Error> {
    draw_all(canvas, &possession_marker(bbox, color))
}

pub fn draw_possession_panel<C: Canvas + ?Sized>(
    canvas: &mut C,
    frame_index: usize,
    log: &PossessionLog,
    style: &PanelStyle,
) -> Result<(), Error> {
    draw_all(canvas, &possession_panel(frame_index, log, style))
}

/// Annotated copy of `frame`.
pub fn render_frame<C: Canvas>(
    frame: &C,
    players: &FrameTracks,
    referees: &FrameTracks,
    ball: &FrameTracks,
    log: &PossessionLog,
    frame_index: usize,
    style: &RenderStyle,
) -> Result<C, Error> {
    let mut out = frame.duplicate()?;
    let primitives = frame_primitives(players, referees, ball, log, frame_index, style);
    draw_all(&mut out, &primitives)?;

    Ok(out)
}

/// Annotated copies of a whole frame sequence.
pub fn render_video<C: Canvas>(
    frames: &[C],
    store: &TrackStore,
    log: &PossessionLog,
    style: &RenderStyle,
) -> Result<Vec<C>, Error> {
    if frames.len() != store.len() {
        return Err(Error::FrameOutOfRange {
            index: frames.len().min(store.len()),
            len: store.len(),
        });
    }

    let mut output = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        output.push(render_frame(
            frame,
            &store.players()[index],
            &store.referees()[index],
            &store.ball()[index],
            log,
            index,
            style,
        )?);

        if (index + 1) % 100 == 0 {
            debug!(frames = index + 1, "rendered");
        }
    }

    Ok(output)
}
