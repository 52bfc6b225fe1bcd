use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How instantaneous pointer velocity (logical px per ms) maps to a target width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VelocityMapping {
    /// Width falls linearly from `max_width` at rest to `min_width` at `full_thin_velocity`
    Linear { full_thin_velocity: f32 },
    /// `max_width / (velocity + 1)`, clamped to the width bounds
    Reciprocal,
}

impl Default for VelocityMapping {
    fn default() -> Self {
        VelocityMapping::Linear {
            full_thin_velocity: 2.5,
        }
    }
}

impl VelocityMapping {
    pub fn target_width(&self, velocity: f32, min_width: f32, max_width: f32) -> f32 {
        let width = match *self {
            VelocityMapping::Linear { full_thin_velocity } => {
                let t = (velocity / full_thin_velocity).clamp(0.0, 1.0);
                max_width - (max_width - min_width) * t
            }
            VelocityMapping::Reciprocal => max_width / (velocity + 1.0),
        };
        width.clamp(min_width, max_width)
    }
}

/// User-facing pad configuration, persisted by the desktop host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    /// Thinnest line, also the diameter of a tap dot
    pub min_width: f32,
    pub max_width: f32,
    pub pen_color: Color32,
    /// Flattening color for opaque exports; transparent means white
    pub background_color: Color32,
    /// Position of segment joints between consecutive points, 0.5 is the midpoint
    pub control_point_weight: f32,
    /// Exponential smoothing factor applied to widths, 1.0 disables smoothing
    pub width_filter_weight: f32,
    pub velocity_mapping: VelocityMapping,
    /// Lower bound on the time delta used for velocity
    pub min_time_delta_ms: f32,
    pub resize_debounce_ms: u64,
    pub device_pixel_ratio: f32,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            min_width: 0.5,
            max_width: 2.5,
            pen_color: Color32::BLACK,
            background_color: Color32::TRANSPARENT,
            control_point_weight: 0.5,
            width_filter_weight: 0.7,
            velocity_mapping: VelocityMapping::default(),
            min_time_delta_ms: 1.0,
            resize_debounce_ms: 200,
            device_pixel_ratio: 1.0,
        }
    }
}

impl PadConfig {
    /// Parses a JSON configuration and validates it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PadConfig =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_width_bounds(self.min_width, self.max_width)?;
        validate_weight("control_point_weight", self.control_point_weight)?;
        validate_weight("width_filter_weight", self.width_filter_weight)?;

        if let VelocityMapping::Linear { full_thin_velocity } = self.velocity_mapping {
            validate_positive("full_thin_velocity", full_thin_velocity)?;
        }
        validate_positive("min_time_delta_ms", self.min_time_delta_ms)?;

        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(ConfigError::InvalidPixelRatio(self.device_pixel_ratio));
        }
        Ok(())
    }
}

pub(crate) fn validate_width_bounds(min_width: f32, max_width: f32) -> Result<(), ConfigError> {
    for (name, value) in [("min_width", min_width), ("max_width", max_width)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidWidth { name, value });
        }
    }
    if min_width > max_width {
        return Err(ConfigError::InvertedWidthBounds {
            min: min_width,
            max: max_width,
        });
    }
    Ok(())
}

fn validate_weight(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { name, value })
    }
}

fn validate_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidVelocity { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PadConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_width_rejected() {
        let config = PadConfig {
            min_width: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidWidth {
                name: "min_width",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = PadConfig {
            min_width: 4.0,
            max_width: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedWidthBounds { .. })
        ));
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let config = PadConfig {
            width_filter_weight: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeight { name: "width_filter_weight", .. })
        ));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = PadConfig::from_json(r#"{ "max_width": 6.0 }"#).unwrap();
        assert_eq!(config.max_width, 6.0);
        assert_eq!(config.min_width, 0.5);
        assert_eq!(config.resize_debounce_ms, 200);
    }

    #[test]
    fn test_from_json_validates() {
        let result = PadConfig::from_json(r#"{ "device_pixel_ratio": 0.0 }"#);
        assert_eq!(result, Err(ConfigError::InvalidPixelRatio(0.0)));
    }

    #[test]
    fn test_linear_mapping_thins_with_speed() {
        let mapping = VelocityMapping::default();
        let slow = mapping.target_width(0.1, 0.5, 2.5);
        let fast = mapping.target_width(2.0, 0.5, 2.5);
        assert!(slow > fast);
        assert_eq!(mapping.target_width(0.0, 0.5, 2.5), 2.5);
        assert_eq!(mapping.target_width(100.0, 0.5, 2.5), 0.5);
    }

    #[test]
    fn test_reciprocal_mapping_is_clamped() {
        let mapping = VelocityMapping::Reciprocal;
        assert_eq!(mapping.target_width(0.0, 0.5, 2.5), 2.5);
        assert_eq!(mapping.target_width(1000.0, 0.5, 2.5), 0.5);
    }
}
