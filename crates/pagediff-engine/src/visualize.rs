use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::bitmap::DifferenceMask;
use crate::regions::Region;

/// How regions (and optionally differing pixels) are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightStyle {
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    /// Rings drawn inward from each region's border.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    /// Fill for differing pixels in [`render_with_mask`]; `None` leaves them as-is.
    /// Written as `[r, g, b]`, or `false` to turn the fill off.
    #[serde(default = "default_mask_tint", with = "tint")]
    pub mask_tint: Option<[u8; 3]>,
}

fn default_color() -> [u8; 3] {
    [255, 0, 0]
}

fn default_stroke_width() -> u32 {
    3
}

fn default_mask_tint() -> Option<[u8; 3]> {
    Some([255, 0, 0])
}

/// `mask_tint` as either a colour or a boolean switch; `true` means the default colour.
mod tint {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Enabled(bool),
        Color([u8; 3]),
    }

    pub fn serialize<S: Serializer>(tint: &Option<[u8; 3]>, s: S) -> Result<S::Ok, S::Error> {
        match tint {
            Some(color) => Repr::Color(*color),
            None => Repr::Enabled(false),
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<[u8; 3]>, D::Error> {
        Ok(match Repr::deserialize(d)? {
            Repr::Color(color) => Some(color),
            Repr::Enabled(true) => super::default_mask_tint(),
            Repr::Enabled(false) => None,
        })
    }
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: default_color(),
            stroke_width: default_stroke_width(),
            mask_tint: default_mask_tint(),
        }
    }
}

/// Copy of `base` with every region outlined.
pub fn render(base: &RgbImage, regions: &[Region], style: &HighlightStyle) -> RgbImage {
    let mut out = base.clone();
    draw_regions(&mut out, regions, style);
    out
}

/// Copy of `base` with differing pixels tinted, then regions outlined.
pub fn render_with_mask(
    base: &RgbImage,
    mask: &DifferenceMask,
    regions: &[Region],
    style: &HighlightStyle,
) -> RgbImage {
    let mut out = base.clone();
    if let Some(tint) = style.mask_tint {
        for (x, y) in mask.iter_set() {
            if x < out.width() && y < out.height() {
                out.put_pixel(x, y, Rgb(tint));
            }
        }
    }
    draw_regions(&mut out, regions, style);
    out
}

fn draw_regions(canvas: &mut RgbImage, regions: &[Region], style: &HighlightStyle) {
    let color = Rgb(style.color);
    for region in regions {
        for ring in 0..style.stroke_width {
            let inset = ring * 2;
            if inset >= region.width || inset >= region.height {
                break;
            }
            let rect = Rect::at((region.x + ring) as i32, (region.y + ring) as i32)
                .of_size(region.width - inset, region.height - inset);
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn region(x: u32, y: u32, width: u32, height: u32) -> Region {
        Region {
            x,
            y,
            width,
            height,
            pixel_count: 1,
        }
    }

    #[test]
    fn outlines_region_without_touching_input() {
        let base = RgbImage::from_pixel(50, 50, WHITE);
        let style = HighlightStyle {
            stroke_width: 2,
            ..HighlightStyle::default()
        };
        let out = render(&base, &[region(10, 10, 20, 20)], &style);

        assert!(base.pixels().all(|p| *p == WHITE));
        // Outer and second ring.
        assert_eq!(*out.get_pixel(10, 10), RED);
        assert_eq!(*out.get_pixel(29, 29), RED);
        assert_eq!(*out.get_pixel(11, 20), RED);
        // Inside the stroke and outside the region stay untouched.
        assert_eq!(*out.get_pixel(12, 20), WHITE);
        assert_eq!(*out.get_pixel(20, 20), WHITE);
        assert_eq!(*out.get_pixel(9, 10), WHITE);
        assert_eq!(*out.get_pixel(30, 30), WHITE);
    }

    #[test]
    fn custom_color() {
        let base = RgbImage::from_pixel(10, 10, WHITE);
        let style = HighlightStyle {
            color: [0, 0, 255],
            stroke_width: 1,
            mask_tint: None,
        };
        let out = render(&base, &[region(0, 0, 10, 10)], &style);
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(9, 9), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(5, 5), WHITE);
    }

    #[test]
    fn thick_stroke_on_tiny_region_fills_it() {
        let base = RgbImage::from_pixel(10, 10, WHITE);
        let out = render(&base, &[region(2, 2, 4, 4)], &HighlightStyle::default());
        for y in 2..6 {
            for x in 2..6 {
                assert_eq!(*out.get_pixel(x, y), RED, "({x}, {y})");
            }
        }
        assert_eq!(*out.get_pixel(6, 6), WHITE);
    }

    #[test]
    fn no_regions_is_plain_copy() {
        let base = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8, y as u8, 0]));
        assert_eq!(render(&base, &[], &HighlightStyle::default()), base);
    }

    #[test]
    fn mask_tint_paints_differing_pixels() {
        let base = RgbImage::from_pixel(6, 6, WHITE);
        let mask = DifferenceMask::from_fn(6, 6, |x, y| x == 3 && y == 4);
        let style = HighlightStyle {
            mask_tint: Some([0, 255, 0]),
            ..HighlightStyle::default()
        };
        let out = render_with_mask(&base, &mask, &[], &style);
        assert_eq!(*out.get_pixel(3, 4), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(3, 3), WHITE);

        let untinted = render_with_mask(
            &base,
            &mask,
            &[],
            &HighlightStyle {
                mask_tint: None,
                ..style
            },
        );
        assert_eq!(untinted, base);
    }

    #[test]
    fn mask_tint_can_be_switched_off() {
        let off: HighlightStyle = serde_json::from_str(r#"{"mask_tint": false}"#).unwrap();
        assert_eq!(off.mask_tint, None);
        assert_eq!(off.color, [255, 0, 0]);

        let on: HighlightStyle = serde_json::from_str(r#"{"mask_tint": true}"#).unwrap();
        assert_eq!(on.mask_tint, Some([255, 0, 0]));

        let blue: HighlightStyle = serde_json::from_str(r#"{"mask_tint": [0, 0, 255]}"#).unwrap();
        assert_eq!(blue.mask_tint, Some([0, 0, 255]));

        let unset: HighlightStyle = serde_json::from_str("{}").unwrap();
        assert_eq!(unset, HighlightStyle::default());

        let json = serde_json::to_value(off).unwrap();
        assert_eq!(json["mask_tint"], false);
    }
}
