use super::{Canvas, PixelRect, Primitive};
use crate::error::Error;
use crate::frame::Frame;
use crate::track::Color;

use ab_glyph::{Font, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use nalgebra as na;
use tracing::debug;

/// Pixel height of a text primitive with scale 1.0.
const TEXT_PX: f32 = 30.0;

#[inline]
fn rgb(color: Color) -> Rgb<u8> {
    Rgb(color.0)
}

fn arc(image: &mut RgbImage, center: na::Point2<i32>, axes: (i32, i32), span: (f32, f32), color: Color, thickness: i32) {
    let (start, end) = span;
    let steps = (end - start).abs().ceil().max(1.0) as usize;

    for offset in 0..thickness.max(1) {
        let a = (axes.0 + offset) as f32;
        let b = (axes.1 + offset) as f32;

        let point = |step: usize| {
            let angle = (start + (end - start) * step as f32 / steps as f32).to_radians();
            (
                center.x as f32 + a * angle.cos(),
                center.y as f32 + b * angle.sin(),
            )
        };

        let mut prev = point(0);
        for step in 1..=steps {
            let next = point(step);
            draw_line_segment_mut(image, prev, next, rgb(color));
            prev = next;
        }
    }
}

fn filled_rect(image: &mut RgbImage, rect: &PixelRect, color: Color) {
    if rect.width() <= 0 || rect.height() <= 0 {
        return;
    }

    draw_filled_rect_mut(
        image,
        Rect::at(rect.left, rect.top).of_size(rect.width() as u32, rect.height() as u32),
        rgb(color),
    );
}

fn polygon(image: &mut RgbImage, points: &[na::Point2<i32>], fill: Color, outline: Option<(Color, i32)>) {
    let mut vertices: Vec<Point<i32>> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
    vertices.dedup();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    if vertices.len() < 3 {
        return;
    }

    draw_polygon_mut(image, &vertices, rgb(fill));

    if let Some((color, _)) = outline {
        for (i, from) in vertices.iter().enumerate() {
            let to = vertices[(i + 1) % vertices.len()];
            draw_line_segment_mut(
                image,
                (from.x as f32, from.y as f32),
                (to.x as f32, to.y as f32),
                rgb(color),
            );
        }
    }
}

fn overlay(image: &mut RgbImage, rect: &PixelRect, color: Color, alpha: f32) {
    let (width, height) = image.dimensions();
    let alpha = alpha.clamp(0.0, 1.0);

    let x_range = rect.left.max(0) as u32..rect.right.clamp(0, width as i32) as u32;
    let y_range = rect.top.max(0) as u32..rect.bottom.clamp(0, height as i32) as u32;

    for y in y_range {
        for x in x_range.clone() {
            let pixel = image.get_pixel_mut(x, y);
            for (channel, over) in pixel.0.iter_mut().zip(color.0) {
                let blended = alpha * over as f32 + (1.0 - alpha) * *channel as f32;
                *channel = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

impl Canvas for Frame {
    fn draw(&mut self, primitive: &Primitive) -> Result<(), Error> {
        match primitive {
            Primitive::Arc {
                center,
                axes,
                start_angle,
                end_angle,
                color,
                thickness,
            } => arc(
                &mut self.image,
                *center,
                *axes,
                (*start_angle, *end_angle),
                *color,
                *thickness,
            ),

            Primitive::FilledRect { rect, color } => filled_rect(&mut self.image, rect, *color),

            Primitive::Polygon {
                points,
                fill,
                outline,
            } => polygon(&mut self.image, points, *fill, *outline),

            Primitive::Text {
                origin,
                text,
                scale,
                color,
                thickness,
            } => {
                let font = match self.font() {
                    Some(font) => font.clone(),
                    None => {
                        debug!(%text, "no font loaded, skipping text");
                        return Ok(());
                    }
                };

                let px = PxScale::from(scale * TEXT_PX);
                let top = origin.y - font.as_scaled(px).ascent().round() as i32;

                // emulate stroke weight by overdrawing with a one pixel shift
                for dx in 0..(*thickness).max(1).min(3) {
                    draw_text_mut(&mut self.image, rgb(*color), origin.x + dx, top, px, &font, text);
                }
            }

            Primitive::Overlay { rect, color, alpha } => overlay(&mut self.image, rect, *color, *alpha),
        }

        Ok(())
    }

    fn duplicate(&self) -> Result<Self, Error> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::possession::PossessionLog;
    use crate::render::{draw_identity_marker, draw_possession_marker, draw_possession_panel, render_frame, PanelStyle, RenderStyle};
    use crate::store::{FrameTracks, BALL_ID};
    use crate::track::TrackRecord;

    fn blank() -> Frame {
        Frame::new(RgbImage::from_pixel(200, 200, Rgb([100, 100, 100])))
    }

    fn any_in(frame: &Frame, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>, color: Rgb<u8>) -> bool {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .any(|(x, y)| *frame.image.get_pixel(x, y) == color)
    }

    #[test]
    fn ring_is_open_at_the_top() {
        let mut frame = blank();
        draw_identity_marker(&mut frame, &BBox::ltrb(60.0, 20.0, 100.0, 100.0), Color::RED, None).unwrap();

        let red = Rgb([255, 0, 0]);
        // bottom of the ring is drawn, top of the ring is the gap
        assert!(any_in(&frame, 77..84, 111..118, red));
        assert!(!any_in(&frame, 74..87, 83..90, red));
        // right end of the horizontal axis
        assert!(any_in(&frame, 117..124, 97..104, red));
    }

    #[test]
    fn triangle_is_filled_with_black_outline() {
        let mut frame = blank();
        draw_possession_marker(&mut frame, &BBox::ltrb(60.0, 100.0, 100.0, 150.0), Color::GREEN).unwrap();

        assert_eq!(frame.image.get_pixel(80, 88), &Rgb([0, 255, 0]));
        assert_eq!(frame.image.get_pixel(70, 80), &Rgb([0, 0, 0]));
        assert_eq!(frame.image.get_pixel(80, 120), &Rgb([100, 100, 100]));
    }

    #[test]
    fn panel_is_blended() {
        let mut frame = blank();
        let style = PanelStyle {
            left: 10,
            top: 10,
            right: 50,
            bottom: 30,
            alpha: 0.4,
            color: Color::WHITE,
        };

        draw_possession_panel(&mut frame, 0, &PossessionLog::new(), &style).unwrap();

        // 0.4 * 255 + 0.6 * 100
        assert_eq!(frame.image.get_pixel(20, 20), &Rgb([162, 162, 162]));
        assert_eq!(frame.image.get_pixel(5, 5), &Rgb([100, 100, 100]));
    }

    #[test]
    fn panel_outside_the_frame_is_clipped() {
        let mut frame = blank();

        draw_possession_panel(&mut frame, 0, &PossessionLog::new(), &PanelStyle::default()).unwrap();

        assert!(frame.image.pixels().all(|p| *p == Rgb([100, 100, 100])));
    }

    #[test]
    fn render_leaves_input_untouched() {
        let frame = blank();
        let mut players = FrameTracks::new();
        players.insert(7, TrackRecord::new(BBox::ltrb(60.0, 20.0, 100.0, 100.0)));
        let mut ball = FrameTracks::new();
        ball.insert(BALL_ID, TrackRecord::new(BBox::ltrb(150.0, 150.0, 160.0, 160.0)));

        let out = render_frame(
            &frame,
            &players,
            &FrameTracks::new(),
            &ball,
            &PossessionLog::new(),
            0,
            &RenderStyle::default(),
        )
        .unwrap();

        assert!(frame.image.pixels().all(|p| *p == Rgb([100, 100, 100])));
        assert_ne!(out.image, frame.image);
        assert_eq!(out.image.get_pixel(155, 140), &Rgb([0, 255, 0]));
    }
}
