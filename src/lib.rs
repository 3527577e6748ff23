pub mod config;
pub mod errors;
pub mod processor;
pub mod stickerops;

use image::{ImageBuffer, Pixel};

pub use config::{Config, Mode};
pub use errors::{Result, StickerError};
pub use processor::Processor;
pub use stickerops::background::{estimate_background, expand_margins, EstimatorParams};
pub use stickerops::mask::{BoundingBox, MaskState, SegmentationMask};
pub use stickerops::segment::{full_process, segment_subject, SegmenterParams};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
