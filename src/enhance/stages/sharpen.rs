use crate::enhance::EnhanceError;
use image::RgbaImage;
use imageproc::filter::gaussian_blur_f32;

/// Blur radius of the unsharp mask, roughly one pixel.
const BLUR_SIGMA: f32 = 1.0;

/// Unsharp mask: `out = clamp(original + strength * (original - blurred))`
/// per RGB channel. Alpha is left untouched.
pub fn apply(mut image: RgbaImage, strength: f32) -> Result<RgbaImage, EnhanceError> {
    if strength == 0.0 {
        return Ok(image);
    }

    let blurred = gaussian_blur_f32(&image, BLUR_SIGMA);

    for (px, blur_px) in image.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let original = px.0[c] as f32;
            let value = original + strength * (original - blur_px.0[c] as f32);
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
    fn test_sharpen_enhances_edges() {
        // Left half dark, right half light
        let img = RgbaImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgba([50, 50, 50, 255])
            } else {
                Rgba([200, 200, 200, 255])
            }
        });

        let result = apply(img, 0.6).unwrap();

        let edge_left = result.get_pixel(9, 5).0[0] as i32;
        let edge_right = result.get_pixel(10, 5).0[0] as i32;

        // The residual pushes the dark side darker and the light side lighter
        assert!(edge_left < 50, "dark edge should darken, got {}", edge_left);
        assert!(
            edge_right > 200,
            "light edge should brighten, got {}",
            edge_right
        );
    }

    #[test]
    fn test_sharpen_is_noop_on_flat_field() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([120, 60, 30, 255]));
        let result = apply(img.clone(), 0.6).unwrap();
        for (a, b) in result.pixels().zip(img.pixels()) {
            for c in 0..3 {
                assert!((a.0[c] as i32 - b.0[c] as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_sharpen_leaves_alpha_untouched() {
        let img = RgbaImage::from_fn(10, 10, |x, y| {
            Rgba([(x * 25) as u8, (y * 25) as u8, 128, (x * 10 + y) as u8])
        });
        let result = apply(img.clone(), 1.5).unwrap();
        for (a, b) in result.pixels().zip(img.pixels()) {
            assert_eq!(a.0[3], b.0[3]);
        }
    }
}
