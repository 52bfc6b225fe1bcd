use log::debug;

use super::{Debouncer, SurfaceSize};
use crate::error::ConfigError;

/// Owns logical surface dimensions and the device pixel ratio
///
/// Resize requests pass through a [`Debouncer`] so a burst of notifications
/// (a window drag) results in a single resize once input settles.
#[derive(Debug, Clone)]
pub struct SurfaceController {
    size: SurfaceSize,
    pixel_ratio: f32,
    resize_gate: Debouncer<SurfaceSize>,
}

impl SurfaceController {
    pub fn new(size: SurfaceSize, pixel_ratio: f32, debounce_ms: u64) -> Result<Self, ConfigError> {
        validate_pixel_ratio(pixel_ratio)?;
        Ok(Self {
            size,
            pixel_ratio,
            resize_gate: Debouncer::new(debounce_ms),
        })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn physical_size(&self) -> (u32, u32) {
        self.size.physical(self.pixel_ratio)
    }

    pub fn set_debounce_ms(&mut self, debounce_ms: u64) {
        self.resize_gate.set_delay(debounce_ms);
    }

    /// Queue a resize; zero dimensions are rejected without touching the queue
    pub fn request_resize(&mut self, width: u32, height: u32, now_ms: u64) -> Result<(), ConfigError> {
        let size = SurfaceSize::new(width, height)?;
        debug!("Resize to {size} requested at {now_ms}ms");
        self.resize_gate.call(size, now_ms);
        Ok(())
    }

    pub fn has_pending_resize(&self) -> bool {
        self.resize_gate.is_pending()
    }

    /// Apply a settled resize, returning the new size when one fired
    pub fn poll(&mut self, now_ms: u64) -> Option<SurfaceSize> {
        let size = self.resize_gate.poll(now_ms)?;
        self.size = size;
        Some(size)
    }

    /// Returns true when the ratio actually changed
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) -> Result<bool, ConfigError> {
        validate_pixel_ratio(pixel_ratio)?;
        let changed = pixel_ratio != self.pixel_ratio;
        self.pixel_ratio = pixel_ratio;
        Ok(changed)
    }
}

fn validate_pixel_ratio(pixel_ratio: f32) -> Result<(), ConfigError> {
    if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPixelRatio(pixel_ratio))
    }
}
