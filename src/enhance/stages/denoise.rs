use crate::enhance::EnhanceError;
use image::RgbaImage;

/// Weight given to neighbors whose color differs from the center by at
/// least the threshold. Near-zero so dissimilar pixels (line edges)
/// barely influence the average.
const DISSIMILAR_WEIGHT: f32 = 0.1;

/// Edge-preserving denoise: a simplified bilateral filter.
///
/// Each non-border pixel becomes the weighted average of its
/// `(2r+1) x (2r+1)` neighborhood per RGB channel, where a neighbor
/// weighs 1.0 when the sum of absolute per-channel differences to the
/// center is below `threshold` and [`DISSIMILAR_WEIGHT`] otherwise.
/// Weights are summed and divided per pixel. Pixels within `radius` of
/// any edge are copied unchanged, and alpha is never touched.
pub fn apply(image: RgbaImage, radius: u32, threshold: u32) -> Result<RgbaImage, EnhanceError> {
    if radius == 0 {
        return Ok(image);
    }

    let (width, height) = image.dimensions();
    let mut output = image.clone();
    if width as u64 <= 2 * radius as u64 || height as u64 <= 2 * radius as u64 {
        // No interior pixels; everything counts as border
        return Ok(output);
    }

    let r = radius as i64;
    for y in radius..height - radius {
        for x in radius..width - radius {
            let center = image.get_pixel(x, y).0;
            let mut sums = [0.0f32; 3];
            let mut weight_sum = 0.0f32;

            for ky in -r..=r {
                for kx in -r..=r {
                    let neighbor = image
                        .get_pixel((x as i64 + kx) as u32, (y as i64 + ky) as u32)
                        .0;
                    let diff = (center[0] as i32 - neighbor[0] as i32).abs()
                        + (center[1] as i32 - neighbor[1] as i32).abs()
                        + (center[2] as i32 - neighbor[2] as i32).abs();
                    let weight = if (diff as u32) < threshold {
                        1.0
                    } else {
                        DISSIMILAR_WEIGHT
                    };
                    for c in 0..3 {
                        sums[c] += neighbor[c] as f32 * weight;
                    }
                    weight_sum += weight;
                }
            }

            let px = output.get_pixel_mut(x, y);
            for c in 0..3 {
                px.0[c] = (sums[c] / weight_sum).clamp(0.0, 255.0) as u8;
            }
        }
    }

    Ok(output)
}
