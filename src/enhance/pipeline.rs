use image::RgbaImage;
use serde::Serialize;
use std::time::Instant;

use super::stages;
use super::{EnhanceError, EnhancementParams, RasterImage};

/// Timing information for a single enhancement stage
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of an enhancement run including timing stats
#[derive(Debug, Clone)]
pub struct EnhanceResult {
    pub image: RasterImage,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Enhancement pipeline: upscale, sharpen, contrast, denoise, in order.
/// Each stage consumes the previous stage's full output buffer.
pub struct Pipeline {
    params: EnhancementParams,
}

impl Pipeline {
    pub fn new(params: EnhancementParams) -> Self {
        Self { params }
    }

    /// Run all stages over `image` according to the configured params.
    pub fn process(&self, image: &RasterImage) -> Result<EnhanceResult, EnhanceError> {
        image.validate()?;
        self.params.validate()?;

        let (target_w, target_h) =
            target_dimensions(image.width, image.height, self.params.scale)?;

        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let src = RgbaImage::from_raw(image.width, image.height, image.data.clone())
            .ok_or_else(|| {
                EnhanceError::ProcessingFailure("pixel buffer rejected by image backend".into())
            })?;

        let mut img = src;
        img = self.run_step("upscale", img, &mut steps_timing, |i| {
            stages::upscale::apply(i, target_w, target_h)
        })?;
        img = self.run_step("sharpen", img, &mut steps_timing, |i| {
            stages::sharpen::apply(i, self.params.sharpen_strength)
        })?;
        img = self.run_step("contrast", img, &mut steps_timing, |i| {
            stages::contrast::apply(i, self.params.contrast)
        })?;
        img = self.run_step("denoise", img, &mut steps_timing, |i| {
            stages::denoise::apply(i, self.params.denoise_radius, self.params.denoise_threshold)
        })?;

        Ok(EnhanceResult {
            image: RasterImage {
                width: target_w,
                height: target_h,
                data: img.into_raw(),
            },
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: RgbaImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<RgbaImage, EnhanceError>
    where
        F: FnOnce(RgbaImage) -> Result<RgbaImage, EnhanceError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

/// Compute `round(dim * scale)` per axis, rejecting zero-area targets.
fn target_dimensions(width: u32, height: u32, scale: f32) -> Result<(u32, u32), EnhanceError> {
    let target_w = (width as f64 * scale as f64).round() as u32;
    let target_h = (height as f64 * scale as f64).round() as u32;
    if target_w == 0 || target_h == 0 {
        return Err(EnhanceError::InvalidInput(format!(
            "scale {} produces a zero-area target for {}x{}",
            scale, width, height
        )));
    }
    Ok((target_w, target_h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_dimensions_round_per_axis() {
        assert_eq!(target_dimensions(3, 3, 0.5).unwrap(), (2, 2)); // 1.5 rounds up
        assert_eq!(target_dimensions(10, 7, 1.5).unwrap(), (15, 11));
        assert_eq!(target_dimensions(800, 1200, 2.0).unwrap(), (1600, 2400));
    }

    #[test]
    fn test_target_dimensions_reject_zero_area() {
        assert!(target_dimensions(1, 1, 0.2).is_err());
        assert!(target_dimensions(2, 100, 0.1).is_err());
    }

    #[test]
    fn test_pipeline_reports_all_stage_timings() {
        let img = RasterImage::new(4, 4, vec![128; 4 * 4 * 4]).unwrap();
        let result = Pipeline::new(EnhancementParams::default())
            .process(&img)
            .unwrap();
        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["upscale", "sharpen", "contrast", "denoise"]);
    }
}
