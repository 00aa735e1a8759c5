use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Image Error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Config Error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[cfg(feature = "opencv")]
    #[error("OpenCV Error: {0}")]
    OpenCvError(#[from] opencv::Error),

    #[error("Font Error: {0}")]
    Font(String),

    #[error("class id {0} is not present in the frame's class map")]
    UnknownClass(u32),

    #[error("class `{0}` is not present in the frame's class map")]
    MissingClass(String),

    #[error("tracker returned malformed output: {0}")]
    MalformedTracks(String),

    #[error("tracker failed: {0}")]
    Tracker(String),

    #[error("frame {index} is out of range, store holds {len} frames")]
    FrameOutOfRange { index: usize, len: usize },

    #[error("frame {got} submitted out of order, expected frame {expected}")]
    FrameOrder { expected: usize, got: usize },

    #[error("detector returned {got} frames for a batch of {expected}")]
    DetectorMismatch { expected: usize, got: usize },

    #[error("frame {index} is {got:?}, expected {expected:?}")]
    FrameSize {
        index: usize,
        expected: (u32, u32),
        got: (u32, u32),
    },

    #[error("track store categories have different lengths")]
    InconsistentStore,
}
