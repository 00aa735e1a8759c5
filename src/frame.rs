use crate::error::Error;

use ab_glyph::FontArc;
use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A video frame being annotated.
///
/// Text is only rendered when a font has been attached.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    font: Option<FontArc>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image, font: None }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    #[inline]
    pub fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }

    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[inline]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("dims", &self.dims())
            .field("font", &self.font.is_some())
            .finish()
    }
}

pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc, Error> {
    let bytes = std::fs::read(path.as_ref())?;

    FontArc::try_from_vec(bytes)
        .map_err(|err| Error::Font(format!("{}: {}", path.as_ref().display(), err)))
}

/// Loads every image of `dir` in file name order. All frames must share one size.
pub fn read_frames<P: AsRef<Path>>(dir: P) -> Result<Vec<RgbImage>, Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let image = image::open(path)?.to_rgb8();

        if let Some(first) = frames.first().map(RgbImage::dimensions) {
            if image.dimensions() != first {
                return Err(Error::FrameSize {
                    index,
                    expected: first,
                    got: image.dimensions(),
                });
            }
        }

        frames.push(image);
    }

    info!(dir = %dir.as_ref().display(), frames = frames.len(), "read frames");
    Ok(frames)
}

/// Writes frames as `frame_000000.png`, `frame_000001.png`, ...
pub fn save_frames<P: AsRef<Path>>(dir: P, frames: &[Frame]) -> Result<(), Error> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    for (index, frame) in frames.iter().enumerate() {
        frame
            .image
            .save(dir.join(format!("frame_{:06}.png", index)))?;
    }

    info!(dir = %dir.display(), frames = frames.len(), "saved frames");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn frames_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<Frame> = (0..3u8)
            .map(|v| Frame::new(RgbImage::from_pixel(4, 3, Rgb([v, v, v]))))
            .collect();

        save_frames(dir.path(), &frames).unwrap();
        let loaded = read_frames(dir.path()).unwrap();

        assert_eq!(loaded.len(), 3);
        for (v, image) in loaded.iter().enumerate() {
            assert_eq!(image.get_pixel(0, 0), &Rgb([v as u8; 3]));
        }
    }

    #[test]
    fn mixed_sizes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        RgbImage::new(5, 4).save(dir.path().join("b.png")).unwrap();

        assert!(matches!(
            read_frames(dir.path()),
            Err(Error::FrameSize { index: 1, .. })
        ));
    }

    #[test]
    fn unparsable_font_is_a_font_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert!(matches!(load_font(&path), Err(Error::Font(ref msg)) if msg.contains("broken.ttf")));
    }
}
