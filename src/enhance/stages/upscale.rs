use crate::enhance::EnhanceError;
use image::{imageops, imageops::FilterType, RgbaImage};

/// Resample to the target dimensions with a Lanczos3 kernel.
/// Alpha is resampled alongside the color channels.
pub fn apply(
    image: RgbaImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage, EnhanceError> {
    if image.dimensions() == (target_w, target_h) {
        return Ok(image);
    }
    Ok(imageops::resize(&image, target_w, target_h, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_upscale_produces_target_dimensions() {
        let img = RgbaImage::from_pixel(5, 8, Rgba([10, 20, 30, 255]));
        let result = apply(img, 12, 19).unwrap();
        assert_eq!(result.dimensions(), (12, 19));
    }

    #[test]
    fn test_upscale_preserves_uniform_color() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([200, 100, 50, 180]));
        let result = apply(img, 9, 9).unwrap();
        for px in result.pixels() {
            for c in 0..4 {
                assert!(
                    (px.0[c] as i32 - [200, 100, 50, 180][c] as i32).abs() <= 1,
                    "channel {} drifted: {:?}",
                    c,
                    px.0
                );
            }
        }
    }

    #[test]
    fn test_unit_scale_is_identity() {
        let mut img = RgbaImage::new(4, 4);
        for (i, px) in img.pixels_mut().enumerate() {
            px.0 = [i as u8 * 10, 255 - i as u8 * 10, i as u8, 255];
        }
        let expected = img.clone();
        let result = apply(img, 4, 4).unwrap();
        assert_eq!(result, expected);
    }
}
