use thiserror::Error;

/// Rejected configuration, reported before any drawing happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Stroke width bound `{name}` must be a finite, non-negative number (got {value})")]
    InvalidWidth { name: &'static str, value: f32 },
    #[error("Minimum width {min} exceeds maximum width {max}")]
    InvertedWidthBounds { min: f32, max: f32 },
    #[error("Weight `{name}` must lie in [0, 1] (got {value})")]
    InvalidWeight { name: &'static str, value: f32 },
    #[error("Surface dimensions must be non-zero (got {width}x{height})")]
    ZeroSurface { width: u32, height: u32 },
    #[error("Device pixel ratio must be finite and positive (got {0})")]
    InvalidPixelRatio(f32),
    #[error("Velocity parameter `{name}` must be finite and positive (got {value})")]
    InvalidVelocity { name: &'static str, value: f32 },
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Failure to fetch or decode a background image
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to read image source {source_name}: {reason}")]
    Io { source_name: String, reason: String },
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Malformed data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Unsupported image source: {0}")]
    Unsupported(String),
}

impl From<image::ImageError> for LoadError {
    fn from(err: image::ImageError) -> Self {
        LoadError::Decode(err.to_string())
    }
}

/// Failure to encode an export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to serialize vector data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Rejected vector data during rehydration
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Malformed vector data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Stroke {stroke} segment {segment} has an invalid width")]
    InvalidWidth { stroke: usize, segment: usize },
    #[error("Stroke {stroke} segment {segment} has a non-finite coordinate")]
    InvalidCoordinate { stroke: usize, segment: usize },
}
