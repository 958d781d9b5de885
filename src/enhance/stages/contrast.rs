use crate::enhance::EnhanceError;
use image::RgbaImage;

/// Linear contrast stretch around the midpoint:
/// `out = clamp(((v/255 - 0.5) * factor + 0.5) * 255)` per RGB channel.
pub fn apply(mut image: RgbaImage, factor: f32) -> Result<RgbaImage, EnhanceError> {
    if factor == 1.0 {
        return Ok(image);
    }

    for px in image.pixels_mut() {
        for c in 0..3 {
            let value = ((px.0[c] as f32 / 255.0 - 0.5) * factor + 0.5) * 255.0;
            px.0[c] = value.clamp(0.0, 255.0) as u8;
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_contrast_spreads_values_from_midpoint() {
        let img = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([50, 50, 50, 255]),
            1 => Rgba([128, 128, 128, 255]),
            _ => Rgba([200, 200, 200, 255]),
        });
        let result = apply(img, 1.08).unwrap();

        assert!(result.get_pixel(0, 0).0[0] < 50);
        // Midpoint stays put (127.5 center, so 128 moves by under a level)
        let mid = result.get_pixel(1, 0).0[0] as i32;
        assert!((mid - 128).abs() <= 1);
        assert!(result.get_pixel(2, 0).0[0] > 200);
    }

    #[test]
    fn test_contrast_clamps_extremes() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let result = apply(img, 1.5).unwrap();
        assert_eq!(result.get_pixel(0, 0).0[..3], [0, 0, 0]);
        assert_eq!(result.get_pixel(1, 0).0[..3], [255, 255, 255]);
    }

    #[test]
    fn test_contrast_leaves_alpha_untouched() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 240, 128, 77]));
        let result = apply(img, 1.3).unwrap();
        for px in result.pixels() {
            assert_eq!(px.0[3], 77);
        }
    }
}
