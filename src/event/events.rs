use crate::error::LoadError;
use crate::stroke::StrokeId;

/// Why the surface was repainted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    /// A stroke was finalized (already painted incrementally)
    StrokeCompleted,
    Undo,
    Clear,
    Resize,
    Background,
    /// History was replaced from vector data
    Import,
    /// Pen color, width bounds or pixel ratio changed
    Config,
}

/// Notifications emitted to the host after every structural change
#[derive(Debug, Clone, PartialEq)]
pub enum PadEvent {
    StrokeCompleted { id: StrokeId },
    SurfaceChanged { reason: SurfaceChange },
    BackgroundLoaded { source: String },
    BackgroundFailed { source: String, error: LoadError },
}
