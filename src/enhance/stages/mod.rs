//! Individual enhancement stages

pub mod contrast;
pub mod denoise;
pub mod sharpen;
pub mod upscale;
