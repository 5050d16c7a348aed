//! Rasters: resampling and letterbox padding.

use image::{imageops, Rgba, RgbaImage};

use crate::{config::Filter, geometry::center_offsets};

/// Resize to exactly `width`x`height` with the given filter.
///
/// Resampling itself is [`imageops::resize`]. An empty target skips the
/// kernel entirely.
pub fn resize(
    src: &RgbaImage,
    width: u32,
    height: u32,
    filter: Filter,
) -> RgbaImage {
    if width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    imageops::resize(src, width, height, filter.into())
}

/// Place `src` centered on a freshly allocated `width`x`height` canvas
/// filled with `background`.
///
/// Pixels are copied verbatim, alpha included; nothing is blended.
/// The source is never touched. Parts of `src` that fall outside the
/// canvas are clipped. An empty canvas comes back as 0x0.
pub fn pad(
    src: &RgbaImage,
    width: u32,
    height: u32,
    background: Rgba<u8>,
) -> RgbaImage {
    if width == 0 || height == 0 {
        return RgbaImage::new(0, 0);
    }
    let mut canvas = RgbaImage::from_pixel(width, height, background);
    let (x, y) = center_offsets(width, height, src.width(), src.height());
    imageops::replace(&mut canvas, src, x, y);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// A small raster where every pixel is different.
    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7) as u8, (y * 13) as u8, (x + y) as u8, 200])
        })
    }

    #[test]
    fn pad_centers_with_background_bands() {
        let src = RgbaImage::from_pixel(100, 50, WHITE);
        let out = pad(&src, 100, 100, BLACK);
        assert_eq!(out.dimensions(), (100, 100));
        for y in 0..100 {
            let expected = if (25..75).contains(&y) { WHITE } else { BLACK };
            assert_eq!(*out.get_pixel(0, y), expected, "row {y}");
            assert_eq!(*out.get_pixel(99, y), expected, "row {y}");
        }
    }

    #[test]
    fn pad_then_crop_restores_source() {
        let src = gradient(7, 4);
        for (w, h) in [(7, 4), (8, 4), (10, 10), (31, 17)] {
            let out = pad(&src, w, h, WHITE);
            let (x, y) = center_offsets(w, h, 7, 4);
            let back =
                imageops::crop_imm(&out, x as u32, y as u32, 7, 4).to_image();
            assert_eq!(back, src, "canvas {w}x{h}");
        }
    }

    #[test]
    fn pad_overwrites_alpha_straight() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 0]));
        let out = pad(&src, 3, 3, WHITE);
        assert_eq!(*out.get_pixel(1, 1), Rgba([10, 20, 30, 0]));
        assert_eq!(*out.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn pad_into_empty_canvas() {
        let src = gradient(4, 4);
        assert_eq!(pad(&src, 0, 10, BLACK).dimensions(), (0, 0));
        assert_eq!(pad(&src, 10, 0, BLACK).dimensions(), (0, 0));
    }

    #[test]
    fn pad_of_empty_source_is_background() {
        let out = pad(&RgbaImage::new(100, 0), 100, 100, WHITE);
        assert!(out.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn resize_hits_exact_size_with_every_filter() {
        let src = gradient(40, 20);
        for filter in [
            Filter::Nearest,
            Filter::Triangle,
            Filter::CatmullRom,
            Filter::Gaussian,
            Filter::Lanczos3,
        ] {
            assert_eq!(resize(&src, 10, 5, filter).dimensions(), (10, 5));
        }
    }

    #[test]
    fn resize_to_nothing() {
        let src = gradient(40, 20);
        assert_eq!(resize(&src, 0, 5, Filter::Lanczos3).dimensions(), (0, 5));
        assert_eq!(resize(&src, 5, 0, Filter::Lanczos3).dimensions(), (5, 0));
    }

    #[test]
    fn resize_then_pad_is_repeatable() {
        let src = gradient(64, 48);
        let once = pad(&resize(&src, 30, 22, Filter::Lanczos3), 40, 40, BLACK);
        let twice = pad(&resize(&src, 30, 22, Filter::Lanczos3), 40, 40, BLACK);
        assert_eq!(once.as_raw(), twice.as_raw());
    }
}
