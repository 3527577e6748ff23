use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};
use num_traits::AsPrimitive;

use crate::Image;

/// Builds a new canvas `2 * margin` larger than `image` on each axis, fills
/// it with `color` and pastes `image` centered at offset `(margin, margin)`.
pub fn expand_canvas<I, P, S>(image: &I, margin: u32, color: P) -> Image<P>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive,
{
    let (width, height) = image.dimensions();
    let mut canvas = ImageBuffer::from_pixel(width + 2 * margin, height + 2 * margin, color);
    let offset: i64 = margin.as_();
    imageops::overlay(&mut canvas, image, offset, offset);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_expand_canvas_dimensions_and_fill() {
        let image: Image<Rgb<u8>> = ImageBuffer::from_pixel(4, 6, Rgb([10, 20, 30]));
        let canvas = expand_canvas(&image, 3, Rgb([200, 200, 200]));

        assert_eq!(canvas.dimensions(), (10, 12));
        // margin strip is the fill color, interior is the source image
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([200, 200, 200]));
        assert_eq!(canvas.get_pixel(2, 11), &Rgb([200, 200, 200]));
        assert_eq!(canvas.get_pixel(3, 3), &Rgb([10, 20, 30]));
        assert_eq!(canvas.get_pixel(6, 8), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_expand_canvas_zero_margin_is_copy() {
        let image: Image<Rgb<u8>> = ImageBuffer::from_pixel(5, 5, Rgb([1, 2, 3]));
        let canvas = expand_canvas(&image, 0, Rgb([0, 0, 0]));
        assert_eq!(canvas, image);
    }
}
