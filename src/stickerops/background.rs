use image::{DynamicImage, Rgb, Rgba};
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::map_colors;

use crate::errors::{Result, StickerError};
use crate::stickerops::padding::expand_canvas;
use crate::Image;

/// Tunables for background estimation and margin expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorParams {
    /// Fraction of the shortest side used as the corner sample size.
    pub corner_fraction: f32,
    /// Fraction of the longest side used as the margin size.
    pub margin_fraction: f32,
    /// Gaussian blur applied before corner sampling, to suppress noise.
    pub blur_sigma: f32,
    /// Quantization step for the color histogram buckets.
    pub bucket_quantum: u8,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            corner_fraction: 0.05,
            margin_fraction: 0.10,
            blur_sigma: 2.0,
            bucket_quantum: 10,
        }
    }
}

/// Rounds a channel value up to the nearest multiple of `quantum`, clamped
/// to the largest multiple representable in a byte (250 for quantum 10).
pub(crate) fn quantize_channel(value: u8, quantum: u8) -> u8 {
    let quantum = u32::from(quantum);
    let bucket = u32::from(value).div_ceil(quantum) * quantum;
    let max_bucket = (255 / quantum) * quantum;
    bucket.min(max_bucket) as u8
}

/// Occurrence counts of quantized corner colors, stored as a dense array
/// indexed by the bucket triple rather than a hash map. First-seen sequence
/// numbers break count ties in favor of the earliest sampled bucket.
struct CornerHistogram {
    quantum: u8,
    side: usize,
    counts: Vec<u32>,
    first_seen: Vec<u32>,
    next_seq: u32,
}

impl CornerHistogram {
    fn new(quantum: u8) -> Self {
        let side = (255 / quantum as usize) + 1;
        Self {
            quantum,
            side,
            counts: vec![0; side * side * side],
            first_seen: vec![u32::MAX; side * side * side],
            next_seq: 0,
        }
    }

    fn bucket_index(&self, pixel: Rgb<u8>) -> usize {
        let Rgb([r, g, b]) = pixel;
        let q = usize::from(self.quantum);
        let (r, g, b) = (
            usize::from(quantize_channel(r, self.quantum)) / q,
            usize::from(quantize_channel(g, self.quantum)) / q,
            usize::from(quantize_channel(b, self.quantum)) / q,
        );
        (r * self.side + g) * self.side + b
    }

    fn record(&mut self, pixel: Rgb<u8>) {
        let idx = self.bucket_index(pixel);
        if self.counts[idx] == 0 {
            self.first_seen[idx] = self.next_seq;
            self.next_seq += 1;
        }
        self.counts[idx] += 1;
    }

    /// The mode of the histogram: highest count, ties broken by the bucket
    /// seen first in sample order.
    fn mode(&self) -> Option<Rgb<u8>> {
        let best = self
            .counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .max_by_key(|&(idx, &count)| (count, std::cmp::Reverse(self.first_seen[idx])))?
            .0;

        let quantum = usize::from(self.quantum);
        let b = (best % self.side) * quantum;
        let g = ((best / self.side) % self.side) * quantum;
        let r = (best / (self.side * self.side)) * quantum;
        Some(Rgb([r as u8, g as u8, b as u8]))
    }
}

/// Flattens transparency by compositing onto an opaque white canvas, so
/// transparent corner pixels are not mistaken for background color.
fn composite_on_white(image: &Image<Rgba<u8>>) -> Image<Rgb<u8>> {
    map_colors(image, |Rgba([red, green, blue, alpha])| {
        let alpha = f32::from(alpha) / 255.0;
        let blend = |channel: u8| (f32::from(channel) * alpha + 255.0 * (1.0 - alpha)) as u8;
        Rgb([blend(red), blend(green), blend(blue)])
    })
}

/// Estimates the dominant background color by voting over quantized pixels
/// sampled from the four image corners.
///
/// The image is flattened onto white and blurred before sampling; corner
/// regions are `px * px` where `px` is `corner_fraction` of the shortest
/// side, at least 1. Corners are visited top-left, top-right, bottom-left,
/// bottom-right, row-major within each corner.
pub fn estimate_background(image: &DynamicImage, params: &EstimatorParams) -> Result<Rgb<u8>> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(StickerError::InvalidImage {
            reason: format!("zero-area image ({width}x{height})"),
        });
    }

    let flattened = composite_on_white(&image.to_rgba8());
    let blurred = gaussian_blur_f32(&flattened, params.blur_sigma);

    let px = ((width.min(height) as f32) * params.corner_fraction)
        .round()
        .max(1.0) as u32;

    let mut histogram = CornerHistogram::new(params.bucket_quantum);
    let corners = [
        (0, 0),
        (width - px, 0),
        (0, height - px),
        (width - px, height - px),
    ];
    for (corner_x, corner_y) in corners {
        for y in 0..px {
            for x in 0..px {
                histogram.record(*blurred.get_pixel(corner_x + x, corner_y + y));
            }
        }
    }

    histogram.mode().ok_or_else(|| StickerError::InvalidImage {
        reason: "empty corner sample".to_string(),
    })
}

/// Estimates the background color and expands the canvas on all four sides
/// with it as padding. The pasted center is the original image (un-blurred,
/// un-composited RGB); the margin is `margin_fraction` of the longest side.
///
/// Returns the expanded image together with the estimated background color.
pub fn expand_margins(
    image: &DynamicImage,
    params: &EstimatorParams,
) -> Result<(Image<Rgb<u8>>, Rgb<u8>)> {
    let background = estimate_background(image, params)?;

    let (width, height) = (image.width(), image.height());
    let margin = ((width.max(height) as f32) * params.margin_fraction).round() as u32;

    let expanded = expand_canvas(&image.to_rgb8(), margin, background);
    Ok((expanded, background))
}
