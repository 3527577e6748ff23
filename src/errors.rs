use std::path::PathBuf;

use thiserror::Error;

/// Structured error types for the sticker segmentation pipeline.
///
/// Each variant captures context specific to its error domain. The core
/// pipeline only ever produces `InvalidImage` and `InvalidSeed`; everything
/// touching the filesystem or the codecs surfaces as `Io`.
#[derive(Error, Debug)]
pub enum StickerError {
    /// The input buffer cannot be processed at all (zero-area or undecodable).
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    /// The flood fill seed lies outside the image, which would silently
    /// corrupt the mask if allowed through.
    #[error("flood fill seed ({x}, {y}) is outside the {width}x{height} image")]
    InvalidSeed {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Read/write/encode failure at the filesystem boundary.
    #[error("I/O error: {operation} failed for {path:?}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, StickerError>;

/// Convert bare I/O errors at the boundary.
///
/// Code that has context should construct `StickerError::Io` directly with
/// the specific path and operation; this fallback exists so `?` works in
/// glue code that has neither.
impl From<std::io::Error> for StickerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert image crate errors (decode/encode failures) to I/O errors.
impl From<image::ImageError> for StickerError {
    fn from(err: image::ImageError) -> Self {
        Self::Io {
            path: PathBuf::from("unknown"),
            operation: "image codec".to_string(),
            source: Box::new(err),
        }
    }
}
