#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod background;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod history;
pub mod input;
pub mod pad;
pub mod recorder;
pub mod renderer;
pub mod smoothing;
pub mod stroke;
pub mod surface;
pub mod texture_manager;
pub mod util;

pub use app::SignaturePadApp;
pub use config::{PadConfig, VelocityMapping};
pub use error::{ConfigError, ExportError, LoadError, VectorError};
pub use event::{EventHandler, NotificationLog, PadEvent, SurfaceChange};
pub use export::{ExportFormat, Exported, VectorSignature};
pub use input::{Point, PointerEvent, RawSample};
pub use pad::SignaturePad;
pub use smoothing::Segment;
pub use stroke::{Stroke, StrokeId};
pub use surface::{DrawableSurface, RasterSurface, SurfaceSize};
