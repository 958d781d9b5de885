//! Image enhancement filter for manga/manhwa page images.
//!
//! A pure, stateless pipeline: Lanczos upscale, unsharp-mask sharpening,
//! linear contrast stretch, then an edge-preserving denoise tuned for
//! line art. Each invocation owns its buffers, so calls are safe to run
//! concurrently on independent images.

pub mod pipeline;
pub mod stages;

pub use pipeline::Pipeline;

use thiserror::Error;

/// Largest upscale factor the filter accepts.
pub const MAX_SCALE: f32 = 4.0;

/// Largest denoise similarity threshold (255 per channel, three channels).
pub const MAX_DENOISE_THRESHOLD: u32 = 255 * 3;

#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing failure: {0}")]
    ProcessingFailure(String),
}

/// A decoded image: interleaved 8-bit RGBA samples, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Build a raster image, rejecting zero dimensions and buffers whose
    /// length does not match `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, EnhanceError> {
        let img = Self {
            width,
            height,
            data,
        };
        img.validate()?;
        Ok(img)
    }

    pub fn validate(&self) -> Result<(), EnhanceError> {
        if self.width == 0 || self.height == 0 {
            return Err(EnhanceError::InvalidInput(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as u64 * self.height as u64 * 4;
        if self.data.len() as u64 != expected {
            return Err(EnhanceError::InvalidInput(format!(
                "pixel buffer length {} does not match {}x{}x4 = {}",
                self.data.len(),
                self.width,
                self.height,
                expected
            )));
        }
        Ok(())
    }
}

/// Tuning knobs for the four enhancement stages.
#[derive(Debug, Clone, Copy)]
pub struct EnhancementParams {
    /// Upscale factor, validated in (0, 4].
    pub scale: f32,
    /// Unsharp-mask strength.
    pub sharpen_strength: f32,
    /// Linear contrast factor around the midpoint.
    pub contrast: f32,
    /// Denoise kernel radius; 0 disables the denoise stage.
    pub denoise_radius: u32,
    /// Sum-of-absolute-differences threshold below which a neighbor is
    /// considered similar to the center pixel.
    pub denoise_threshold: u32,
}

impl Default for EnhancementParams {
    fn default() -> Self {
        Self {
            scale: 2.0,
            sharpen_strength: 0.6,
            contrast: 1.08,
            denoise_radius: 1,
            denoise_threshold: 30,
        }
    }
}

impl EnhancementParams {
    pub fn validate(&self) -> Result<(), EnhanceError> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(EnhanceError::InvalidInput(format!(
                "scale must be in (0, {}], got {}",
                MAX_SCALE, self.scale
            )));
        }
        if !self.sharpen_strength.is_finite() || self.sharpen_strength < 0.0 {
            return Err(EnhanceError::InvalidInput(format!(
                "sharpen strength must be non-negative, got {}",
                self.sharpen_strength
            )));
        }
        if !self.contrast.is_finite() || self.contrast <= 0.0 {
            return Err(EnhanceError::InvalidInput(format!(
                "contrast factor must be positive, got {}",
                self.contrast
            )));
        }
        if self.denoise_threshold > MAX_DENOISE_THRESHOLD {
            return Err(EnhanceError::InvalidInput(format!(
                "denoise threshold must be at most {}, got {}",
                MAX_DENOISE_THRESHOLD, self.denoise_threshold
            )));
        }
        Ok(())
    }
}

/// Run the full enhancement pipeline over one image.
///
/// Fails with [`EnhanceError::InvalidInput`] on malformed dimensions,
/// buffer/dimension mismatch, or out-of-range params. Failures are
/// terminal for the call; no partial image is produced and retrying an
/// identical input yields an identical failure.
pub fn enhance(
    image: &RasterImage,
    params: &EnhancementParams,
) -> Result<RasterImage, EnhanceError> {
    Ok(Pipeline::new(*params).process(image)?.image)
}
