use image::{Rgb, RgbImage};

/// Page canvas colour used to pad the smaller page.
const PAD_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// `(left_w, left_h, right_w, right_h)` of two pages rendered at different sizes.
pub type SizeMismatch = (u32, u32, u32, u32);

/// Bring two pages to a common size by padding with white, anchored top-left.
///
/// The engine refuses differently-sized bitmaps; this is the policy that
/// reconciles them before comparison. Padding shows up as differing pixels.
pub fn normalize(left: RgbImage, right: RgbImage) -> (RgbImage, RgbImage, Option<SizeMismatch>) {
    if left.dimensions() == right.dimensions() {
        return (left, right, None);
    }

    let mismatch = (left.width(), left.height(), right.width(), right.height());
    let w = left.width().max(right.width());
    let h = left.height().max(right.height());
    (pad_to(left, w, h), pad_to(right, w, h), Some(mismatch))
}

/// Paste `src` onto a white canvas of `w x h`, anchored at top-left.
fn pad_to(src: RgbImage, w: u32, h: u32) -> RgbImage {
    if src.dimensions() == (w, h) {
        return src;
    }
    let mut canvas = RgbImage::from_pixel(w, h, PAD_COLOR);
    image::imageops::overlay(&mut canvas, &src, 0, 0);
    canvas
}
