use std::collections::VecDeque;

use image::{imageops, DynamicImage, Rgb, Rgba};

use crate::errors::{Result, StickerError};
use crate::stickerops::alpha::ApplyAlphaMask;
use crate::stickerops::background::{expand_margins, EstimatorParams};
use crate::stickerops::mask::{MaskState, SegmentationMask};
use crate::Image;

/// Tunables for subject segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterParams {
    /// Flood fill seed; the pixel here is assumed to be background.
    pub seed: (u32, u32),
    /// Maximum per-channel delta to the seed color for a pixel to join the
    /// background region.
    pub threshold: u8,
    /// Dilate the subject boundary into a soft halo.
    pub border: bool,
    /// Crop the result to the subject's bounding box plus a margin.
    pub crop: bool,
    /// Radius of the filled disk drawn around each border pixel.
    pub border_radius: u32,
    /// Fraction of the longest box side added as crop margin.
    pub crop_margin_fraction: f32,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            seed: (10, 10),
            threshold: 150,
            border: true,
            crop: true,
            border_radius: 8,
            crop_margin_fraction: 0.05,
        }
    }
}

fn channel_delta(a: Rgb<u8>, b: Rgb<u8>) -> u8 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| x.abs_diff(y))
        .max()
        .unwrap_or(0)
}

/// Classifies every pixel as background or foreground with a 4-connected
/// flood fill from `seed`.
///
/// A neighbour joins the background region iff its maximum per-channel
/// delta to the seed's original color is within `threshold`. The fill uses
/// an explicit work queue and runs to closure; everything unreachable from
/// the seed stays foreground.
pub fn flood_fill_background(
    image: &Image<Rgb<u8>>,
    seed: (u32, u32),
    threshold: u8,
) -> Result<SegmentationMask> {
    let (width, height) = image.dimensions();
    let (seed_x, seed_y) = seed;
    if seed_x >= width || seed_y >= height {
        return Err(StickerError::InvalidSeed {
            x: seed_x,
            y: seed_y,
            width,
            height,
        });
    }

    let seed_color = *image.get_pixel(seed_x, seed_y);
    let mut mask = SegmentationMask::filled(width, height, MaskState::Foreground);
    let mut queue = VecDeque::new();

    mask.set(seed_x, seed_y, MaskState::Background);
    queue.push_back(seed);

    while let Some((x, y)) = queue.pop_front() {
        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            if nx >= width || ny >= height || mask.get(nx, ny) != MaskState::Foreground {
                continue;
            }
            if channel_delta(*image.get_pixel(nx, ny), seed_color) <= threshold {
                mask.set(nx, ny, MaskState::Background);
                queue.push_back((nx, ny));
            }
        }
    }

    Ok(mask)
}

/// Segments the subject and makes the background transparent.
///
/// Runs the flood fill, optionally dilates the boundary into a halo,
/// converts the classification into an alpha mask, applies it, and
/// optionally crops to the subject's bounding box expanded by
/// `crop_margin_fraction` of its longest side.
///
/// A fully background image yields a fully transparent canvas; in that
/// degenerate case the crop is skipped and the full canvas is returned.
pub fn segment_subject(image: Image<Rgb<u8>>, params: &SegmenterParams) -> Result<Image<Rgba<u8>>> {
    let mut mask = flood_fill_background(&image, params.seed, params.threshold)?;

    if params.border {
        mask.dilate_border(params.border_radius);
    }

    let alpha = mask.to_alpha();
    let masked = image.apply_alpha_mask(&alpha)?;

    if !params.crop {
        return Ok(masked);
    }

    match mask.bounding_box() {
        Some(bbox) => {
            let margin = ((bbox.width().max(bbox.height()) as f32)
                * params.crop_margin_fraction)
                .round() as u32;
            let bbox = bbox.expand(margin, mask.dimensions());
            let cropped = imageops::crop_imm(
                &masked,
                bbox.min_x,
                bbox.min_y,
                bbox.width(),
                bbox.height(),
            );
            Ok(cropped.to_image())
        }
        None => Ok(masked),
    }
}

/// The full sticker pipeline: expand the canvas with the estimated
/// background color, then segment with border dilation and cropping as
/// configured in `segmenter`.
pub fn full_process(
    image: &DynamicImage,
    estimator: &EstimatorParams,
    segmenter: &SegmenterParams,
) -> Result<Image<Rgba<u8>>> {
    let (expanded, _background) = expand_margins(image, estimator)?;
    segment_subject(expanded, segmenter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    /// 100x100 red canvas with a 20x20 blue square centered on it.
    fn red_with_blue_square() -> Image<Rgb<u8>> {
        ImageBuffer::from_fn(100, 100, |x, y| {
            if (40..60).contains(&x) && (40..60).contains(&y) {
                BLUE
            } else {
                RED
            }
        })
    }

    #[test]
    fn test_channel_delta_is_max_per_channel() {
        assert_eq!(channel_delta(Rgb([10, 20, 30]), Rgb([10, 20, 30])), 0);
        assert_eq!(channel_delta(Rgb([0, 100, 30]), Rgb([5, 20, 40])), 80);
    }

    #[test]
    fn test_flood_fill_classifies_square() {
        let image = red_with_blue_square();
        let mask = flood_fill_background(&image, (10, 10), 150).unwrap();

        // seed is always background
        assert_eq!(mask.get(10, 10), MaskState::Background);
        // all red reachable, blue left as foreground
        assert_eq!(mask.count(MaskState::Foreground), 400);
        assert_eq!(mask.get(50, 50), MaskState::Foreground);
        assert_eq!(mask.get(0, 0), MaskState::Background);
        assert_eq!(mask.get(99, 99), MaskState::Background);
    }

    #[test]
    fn test_flood_fill_threshold_blocks_distant_colors() {
        // blue differs from red by 255 in two channels; a huge threshold
        // swallows the square too
        let image = red_with_blue_square();
        let mask = flood_fill_background(&image, (10, 10), 255).unwrap();
        assert_eq!(mask.count(MaskState::Foreground), 0);
    }

    #[test]
    fn test_flood_fill_does_not_cross_foreground_barriers() {
        // a red frame enclosed by a blue ring: the inner red area is
        // unreachable from the seed and stays foreground
        let image: Image<Rgb<u8>> = ImageBuffer::from_fn(60, 60, |x, y| {
            let on_ring = (20..=40).contains(&x)
                && (20..=40).contains(&y)
                && !((25..36).contains(&x) && (25..36).contains(&y));
            if on_ring {
                BLUE
            } else {
                RED
            }
        });
        let mask = flood_fill_background(&image, (10, 10), 150).unwrap();
        assert_eq!(mask.get(30, 30), MaskState::Foreground);
        assert_eq!(mask.get(1, 1), MaskState::Background);
    }

    #[test]
    fn test_flood_fill_rejects_out_of_bounds_seed() {
        let image: Image<Rgb<u8>> = ImageBuffer::from_pixel(8, 8, RED);
        assert!(matches!(
            flood_fill_background(&image, (10, 10), 150),
            Err(StickerError::InvalidSeed {
                x: 10,
                y: 10,
                width: 8,
                height: 8
            })
        ));
    }

    #[test]
    fn test_segment_subject_masks_background() {
        let image = red_with_blue_square();
        let params = SegmenterParams {
            border: false,
            crop: false,
            ..Default::default()
        };
        let result = segment_subject(image, &params).unwrap();

        assert_eq!(result.dimensions(), (100, 100));
        assert_eq!(result.get_pixel(10, 10), &Rgba([0, 0, 0, 0]));
        assert_eq!(result.get_pixel(50, 50), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_segment_subject_border_halo_is_opaque_superset() {
        let image = red_with_blue_square();
        let no_border = segment_subject(
            image.clone(),
            &SegmenterParams {
                border: false,
                crop: false,
                ..Default::default()
            },
        )
        .unwrap();
        let with_border = segment_subject(
            image,
            &SegmenterParams {
                crop: false,
                ..Default::default()
            },
        )
        .unwrap();

        for (x, y, pixel) in no_border.enumerate_pixels() {
            if pixel[3] == 255 {
                assert_eq!(with_border.get_pixel(x, y)[3], 255);
            }
        }
        // halo pixel just outside the square, within radius 8
        assert_eq!(with_border.get_pixel(36, 50)[3], 255);
        // far corner stays transparent
        assert_eq!(with_border.get_pixel(5, 5)[3], 0);
    }

    #[test]
    fn test_segment_subject_crops_to_square_plus_margin() {
        let image = red_with_blue_square();
        let params = SegmenterParams {
            border: false,
            ..Default::default()
        };
        let result = segment_subject(image, &params).unwrap();

        // box is 20x20 at (40, 40); margin = round(20 * 0.05) = 1
        assert_eq!(result.dimensions(), (22, 22));
        assert_eq!(result.get_pixel(11, 11), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_segment_subject_uniform_image_is_fully_transparent() {
        let image: Image<Rgb<u8>> = ImageBuffer::from_pixel(50, 50, RED);
        let result = segment_subject(image, &SegmenterParams::default()).unwrap();

        // empty bounding box: crop falls back to the full canvas
        assert_eq!(result.dimensions(), (50, 50));
        assert!(result.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_full_process_scenario() {
        let image = DynamicImage::ImageRgb8(red_with_blue_square());
        let result = full_process(
            &image,
            &EstimatorParams::default(),
            &SegmenterParams::default(),
        )
        .unwrap();

        // expansion adds a 10px red margin; crop pulls the result back to
        // roughly the square plus halo plus crop margin
        let (width, height) = result.dimensions();
        assert!(width < 120 && height < 120);
        assert!(width >= 20 && height >= 20);
        // center pixel of the cropped output is opaque blue
        assert_eq!(result.get_pixel(width / 2, height / 2)[3], 255);
    }
}
