use super::{Canvas, PixelRect, Primitive};
use crate::error::Error;
use crate::track::Color;

use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

// OpenCV frames are BGR
#[inline]
fn scalar(color: Color) -> Scalar {
    Scalar::new(color.b() as f64, color.g() as f64, color.r() as f64, 0.0)
}

#[inline]
fn rect(r: &PixelRect) -> Rect {
    Rect::new(r.left, r.top, r.width(), r.height())
}

impl Canvas for Mat {
    fn draw(&mut self, primitive: &Primitive) -> Result<(), Error> {
        match primitive {
            Primitive::Arc {
                center,
                axes,
                start_angle,
                end_angle,
                color,
                thickness,
            } => imgproc::ellipse(
                self,
                Point::new(center.x, center.y),
                Size::new(axes.0, axes.1),
                0.0,
                *start_angle as f64,
                *end_angle as f64,
                scalar(*color),
                *thickness,
                imgproc::LINE_4,
                0,
            )?,

            Primitive::FilledRect { rect: r, color } => imgproc::rectangle(
                self,
                rect(r),
                scalar(*color),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?,

            Primitive::Polygon {
                points,
                fill,
                outline,
            } => {
                let contour: Vector<Point> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
                imgproc::fill_convex_poly(self, &contour, scalar(*fill), imgproc::LINE_8, 0)?;

                if let Some((color, thickness)) = outline {
                    imgproc::polylines(
                        self,
                        &contour,
                        true,
                        scalar(*color),
                        *thickness,
                        imgproc::LINE_8,
                        0,
                    )?;
                }
            }

            Primitive::Text {
                origin,
                text,
                scale,
                color,
                thickness,
            } => imgproc::put_text(
                self,
                text,
                Point::new(origin.x, origin.y),
                imgproc::FONT_HERSHEY_SIMPLEX,
                *scale as f64,
                scalar(*color),
                *thickness,
                imgproc::LINE_8,
                false,
            )?,

            Primitive::Overlay {
                rect: r,
                color,
                alpha,
            } => {
                let base = self.try_clone()?;
                let mut overlay = self.try_clone()?;
                imgproc::rectangle(
                    &mut overlay,
                    rect(r),
                    scalar(*color),
                    imgproc::FILLED,
                    imgproc::LINE_8,
                    0,
                )?;

                let alpha = *alpha as f64;
                core::add_weighted(&overlay, alpha, &base, 1.0 - alpha, 0.0, self, -1)?;
            }
        }

        Ok(())
    }

    fn duplicate(&self) -> Result<Self, Error> {
        Ok(self.try_clone()?)
    }
}
