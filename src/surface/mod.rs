//! Drawable surfaces and the controller that owns their size.

use egui::Color32;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::smoothing::Segment;

mod controller;
mod debounce;
mod raster;

pub use controller::SurfaceController;
pub use debounce::Debouncer;
pub use raster::RasterSurface;

/// Logical surface dimensions, before device-pixel-ratio scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroSurface { width, height });
        }
        Ok(Self { width, height })
    }

    /// Backing-store dimensions for a given pixel ratio, at least one pixel each way
    pub fn physical(&self, pixel_ratio: f32) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The minimal drawing capability the renderer needs from a host graphics API
///
/// Coordinates passed in are logical; implementations apply their pixel ratio.
pub trait DrawableSurface {
    fn size(&self) -> SurfaceSize;

    fn pixel_ratio(&self) -> f32;

    /// Reallocate the backing store. Contents are cleared.
    fn resize(&mut self, size: SurfaceSize, pixel_ratio: f32);

    /// Fill every pixel with `color`
    fn clear(&mut self, color: Color32);

    fn draw_segment(&mut self, segment: &Segment, color: Color32);

    /// Composite `image` stretched over the whole surface
    fn draw_image(&mut self, image: &RgbaImage);

    fn pixels(&self) -> &RgbaImage;
}
