use image::Luma;
use imageproc::drawing::draw_filled_ellipse_mut;

use crate::Image;

/// Classification of a single pixel after segmentation.
///
/// Every pixel holds exactly one state at any instant. `BorderFill` is only
/// produced by [`SegmentationMask::dilate_border`] and marks background
/// pixels pulled into the opaque region to form the soft halo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskState {
    Background,
    Foreground,
    BorderFill,
}

/// Per-pixel state grid with the same dimensions as the segmented image.
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    states: Vec<MaskState>,
}

/// Tightest rectangle (inclusive coordinates) containing all non-background
/// mask pixels. Invariant: `min_x <= max_x`, `min_y <= max_y`, all within
/// the mask bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub const fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub const fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Grows the box by `margin` on all sides, clamped to an image of the
    /// given `(width, height)`.
    pub fn expand(&self, margin: u32, bounds: (u32, u32)) -> Self {
        let (width, height) = bounds;
        Self {
            min_x: self.min_x.saturating_sub(margin),
            min_y: self.min_y.saturating_sub(margin),
            max_x: (self.max_x + margin).min(width.saturating_sub(1)),
            max_y: (self.max_y + margin).min(height.saturating_sub(1)),
        }
    }
}

impl SegmentationMask {
    /// Creates a mask with every pixel in the given state.
    pub fn filled(width: u32, height: u32, state: MaskState) -> Self {
        Self {
            width,
            height,
            states: vec![state; (width * height) as usize],
        }
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> MaskState {
        self.states[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, state: MaskState) {
        let idx = self.index(x, y);
        self.states[idx] = state;
    }

    pub fn count(&self, state: MaskState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    /// Border pixels: foreground pixels with at least one 4-connected
    /// background neighbour. Only the interior is scanned (the 1px image
    /// edge is excluded), each interior pixel exactly once.
    pub fn border_pixels(&self) -> Vec<(u32, u32)> {
        let mut pixels = Vec::new();
        for y in 1..self.height.saturating_sub(1) {
            for x in 1..self.width.saturating_sub(1) {
                if self.get(x, y) == MaskState::Foreground
                    && (self.get(x - 1, y) == MaskState::Background
                        || self.get(x + 1, y) == MaskState::Background
                        || self.get(x, y - 1) == MaskState::Background
                        || self.get(x, y + 1) == MaskState::Background)
                {
                    pixels.push((x, y));
                }
            }
        }
        pixels
    }

    /// Marks every background pixel within `radius` of a border pixel as
    /// `BorderFill`, producing the soft halo around the subject. Foreground
    /// pixels are never downgraded, so the opaque set only grows.
    pub fn dilate_border(&mut self, radius: u32) {
        let border = self.border_pixels();
        if border.is_empty() {
            return;
        }

        // Rasterize the halo as a union of filled disks, then merge it back
        // into the state grid in one pass.
        let mut halo: Image<Luma<u8>> = Image::new(self.width, self.height);
        for &(x, y) in &border {
            draw_filled_ellipse_mut(
                &mut halo,
                (x as i32, y as i32),
                radius as i32,
                radius as i32,
                Luma([255u8]),
            );
        }

        for y in 0..self.height {
            for x in 0..self.width {
                if halo.get_pixel(x, y)[0] > 0 && self.get(x, y) == MaskState::Background {
                    self.set(x, y, MaskState::BorderFill);
                }
            }
        }
    }

    /// Bounding box of all non-background pixels, scanning the same interior
    /// region as border detection. `None` when everything is background.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for y in 1..self.height.saturating_sub(1) {
            for x in 1..self.width.saturating_sub(1) {
                if self.get(x, y) == MaskState::Background {
                    continue;
                }
                bbox = Some(match bbox {
                    None => BoundingBox {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => BoundingBox {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                });
            }
        }
        bbox
    }

    /// Converts the classification into an alpha plane: background is fully
    /// transparent, foreground and border fill are fully opaque.
    pub fn to_alpha(&self) -> Image<Luma<u8>> {
        Image::from_fn(self.width, self.height, |x, y| {
            match self.get(x, y) {
                MaskState::Background => Luma([0u8]),
                MaskState::Foreground | MaskState::BorderFill => Luma([255u8]),
            }
        })
    }
}
