use image::RgbImage;

use crate::DiffError;

/// Check that two bitmaps can be compared pixel-by-pixel.
///
/// Empty bitmaps are rejected before sizes are compared, so a 0x0 page
/// against a 0x0 page is still an error.
pub fn validate_pair(left: &RgbImage, right: &RgbImage) -> Result<(), DiffError> {
    for img in [left, right] {
        if img.width() == 0 || img.height() == 0 {
            return Err(DiffError::EmptyBitmap {
                width: img.width(),
                height: img.height(),
            });
        }
    }

    if left.dimensions() != right.dimensions() {
        return Err(DiffError::DimensionMismatch {
            left_w: left.width(),
            left_h: left.height(),
            right_w: right.width(),
            right_h: right.height(),
        });
    }

    Ok(())
}

/// Boolean grid marking which pixels of two compared bitmaps differ.
///
/// Row-major, same dimensions as the compared bitmaps. There is no way to
/// flip a cell after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl DifferenceMask {
    pub(crate) fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Self {
            width,
            height,
            cells,
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self::from_cells(width, height, cells)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `false` for coordinates outside the mask.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Number of `true` cells.
    pub fn count(&self) -> u64 {
        self.cells.iter().filter(|&&c| c).count() as u64
    }

    /// True when no cell is set.
    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    /// Coordinates of every set cell, in row-major order.
    pub fn iter_set(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let w = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(move |(i, _)| ((i % w) as u32, (i / w) as u32))
    }

    pub(crate) fn row(&self, y: u32) -> &[bool] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.cells[start..start + w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn same_size_pair_is_valid() {
        let a = RgbImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        let b = RgbImage::from_pixel(4, 3, Rgb([9, 9, 9]));
        assert_eq!(validate_pair(&a, &b), Ok(()));
    }

    #[test]
    fn mismatched_sizes_rejected() {
        let a = RgbImage::new(4, 3);
        let b = RgbImage::new(4, 5);
        assert_eq!(
            validate_pair(&a, &b),
            Err(DiffError::DimensionMismatch {
                left_w: 4,
                left_h: 3,
                right_w: 4,
                right_h: 5,
            })
        );
    }

    #[test]
    fn empty_bitmap_rejected_before_size_check() {
        let a = RgbImage::new(0, 3);
        let b = RgbImage::new(4, 3);
        assert_eq!(
            validate_pair(&a, &b),
            Err(DiffError::EmptyBitmap {
                width: 0,
                height: 3
            })
        );
    }

    #[test]
    fn mask_accessors() {
        let mask = DifferenceMask::from_fn(5, 4, |x, y| x == 2 && y >= 1);
        assert_eq!(mask.width(), 5);
        assert_eq!(mask.height(), 4);
        assert_eq!(mask.count(), 3);
        assert!(!mask.is_empty());
        assert!(mask.get(2, 1));
        assert!(!mask.get(1, 1));
        assert!(!mask.get(99, 0));
        let set: Vec<_> = mask.iter_set().collect();
        assert_eq!(set, vec![(2, 1), (2, 2), (2, 3)]);
        assert_eq!(mask.row(2), &[false, false, true, false, false]);
    }

    #[test]
    fn all_false_mask_is_empty() {
        let mask = DifferenceMask::from_fn(3, 3, |_, _| false);
        assert!(mask.is_empty());
        assert_eq!(mask.count(), 0);
    }
}
