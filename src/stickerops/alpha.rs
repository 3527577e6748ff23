use image::{Luma, Pixel, Primitive, Rgb, Rgba};
use imageproc::map::map_colors2;

use crate::errors::{Result, StickerError};
use crate::Image;

/// Applies a grayscale alpha mask to an RGB image, producing RGBA.
///
/// Fully transparent pixels are zeroed out; all other pixels keep their
/// original color with the mask value as alpha. This consumes the image.
pub trait ApplyAlphaMask<S: Primitive>
where
    Rgba<S>: Pixel<Subpixel = S>,
{
    fn apply_alpha_mask(self, mask: &Image<Luma<S>>) -> Result<Image<Rgba<S>>>;
}

impl<S> ApplyAlphaMask<S> for Image<Rgb<S>>
where
    Rgb<S>: Pixel<Subpixel = S>,
    Rgba<S>: Pixel<Subpixel = S>,
    Luma<S>: Pixel<Subpixel = S>,
    S: Primitive + 'static,
{
    fn apply_alpha_mask(self, mask: &Image<Luma<S>>) -> Result<Image<Rgba<S>>> {
        if self.dimensions() != mask.dimensions() {
            return Err(StickerError::InvalidImage {
                reason: format!(
                    "image and mask dimensions do not match: {:?} vs {:?}",
                    self.dimensions(),
                    mask.dimensions()
                ),
            });
        }

        let zero = S::zero();
        let result = map_colors2(&self, mask, |Rgb([red, green, blue]), Luma([alpha])| {
            if alpha == zero {
                Rgba([zero, zero, zero, zero])
            } else {
                Rgba([red, green, blue, alpha])
            }
        });

        Ok(result)
    }
}
