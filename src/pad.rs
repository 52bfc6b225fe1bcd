//! The signature pad: wires sampler, smoother, recorder, renderer and surface
//! controller together behind the host-facing API.

use egui::{Color32, Pos2};
use image::RgbaImage;
use log::{debug, info};

use crate::background::{BackgroundLoader, BackgroundOutcome, ImageLoader, RequestId};
use crate::config::{validate_width_bounds, PadConfig};
use crate::error::{ConfigError, ExportError, VectorError};
use crate::event::{EventBus, EventHandler, PadEvent, SurfaceChange};
use crate::export::{ExportEngine, ExportFormat, Exported, VectorSignature};
use crate::history::History;
use crate::input::{PointSampler, PointerEvent, RawSample};
use crate::recorder::StrokeRecorder;
use crate::renderer::Renderer;
use crate::smoothing::{CurveSmoother, Segment, SmootherSettings};
use crate::stroke::{Stroke, StrokeRef};
use crate::surface::{DrawableSurface, RasterSurface, SurfaceController, SurfaceSize};

/// A drawing session on one surface
///
/// All calls are expected from a single logical thread, one event at a time.
/// Every mutating call validates its input before touching any state.
pub struct SignaturePad<S = RasterSurface> {
    config: PadConfig,
    sampler: PointSampler,
    smoother: CurveSmoother,
    recorder: StrokeRecorder,
    renderer: Renderer<S>,
    surface: SurfaceController,
    background: BackgroundLoader,
    events: EventBus,
}

impl<S: std::fmt::Debug> std::fmt::Debug for SignaturePad<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePad")
            .field("config", &self.config)
            .field("recorder", &self.recorder)
            .field("surface", &self.surface)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

impl SignaturePad<RasterSurface> {
    /// A pad rendering into a software surface, loading backgrounds from data URLs and files
    pub fn new(config: PadConfig, width: u32, height: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let size = SurfaceSize::new(width, height)?;
        let surface = RasterSurface::new(size, config.device_pixel_ratio);
        Self::with_parts(config, surface, BackgroundLoader::default())
    }
}

impl<S: DrawableSurface> SignaturePad<S> {
    pub fn with_parts(
        config: PadConfig,
        mut surface: S,
        background: BackgroundLoader,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let size = surface.size();
        SurfaceSize::new(size.width, size.height)?;
        let controller =
            SurfaceController::new(size, config.device_pixel_ratio, config.resize_debounce_ms)?;
        if surface.pixel_ratio() != config.device_pixel_ratio {
            surface.resize(size, config.device_pixel_ratio);
        }

        let mut pad = Self {
            smoother: CurveSmoother::new(SmootherSettings::from(&config)),
            sampler: PointSampler::default(),
            recorder: StrokeRecorder::new(),
            renderer: Renderer::new(surface, config.background_color),
            surface: controller,
            background,
            events: EventBus::new(),
            config,
        };
        pad.renderer.redraw(pad.recorder.history(), None);
        Ok(pad)
    }

    /// Replace the image loader, e.g. with a network-backed one
    pub fn with_loader(mut self, loader: Box<dyn ImageLoader>) -> Self {
        self.background = BackgroundLoader::new(loader);
        self
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.events.subscribe(handler);
    }

    // ---- configuration -------------------------------------------------

    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    /// Apply a whole new configuration; rejected configs change nothing
    pub fn set_config(&mut self, config: PadConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let ratio_changed = self.surface.set_pixel_ratio(config.device_pixel_ratio)?;
        self.surface.set_debounce_ms(config.resize_debounce_ms);
        let needs_redraw = ratio_changed || config.background_color != self.config.background_color;

        self.config = config;
        self.renderer.set_background_color(self.config.background_color);
        if ratio_changed {
            self.renderer
                .resize(self.surface.size(), self.surface.pixel_ratio());
        }
        if needs_redraw {
            self.full_redraw(SurfaceChange::Config);
        }
        Ok(())
    }

    /// Color for strokes started from now on
    pub fn set_pen_color(&mut self, color: Color32) {
        self.config.pen_color = color;
    }

    pub fn pen_color(&self) -> Color32 {
        self.config.pen_color
    }

    /// Width bounds for strokes started from now on
    pub fn set_width_bounds(&mut self, min_width: f32, max_width: f32) -> Result<(), ConfigError> {
        validate_width_bounds(min_width, max_width)?;
        self.config.min_width = min_width;
        self.config.max_width = max_width;
        Ok(())
    }

    /// Where the surface's top-left corner sits in host coordinates
    pub fn set_origin(&mut self, origin: Pos2) {
        self.sampler.set_origin(origin);
    }

    // ---- pointer input -------------------------------------------------

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(raw) => self.begin_stroke(&raw),
            PointerEvent::Move(raw) => {
                if self.recorder.is_recording() {
                    self.add_sample(&raw);
                }
            }
            PointerEvent::Up(raw) => {
                if self.recorder.is_recording() {
                    if let Some(raw) = raw {
                        self.add_sample(&raw);
                    }
                    self.end_stroke();
                }
            }
            PointerEvent::Cancel | PointerEvent::Leave => {
                if self.recorder.is_recording() {
                    self.end_stroke();
                }
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    fn begin_stroke(&mut self, raw: &RawSample) {
        if self.recorder.is_recording() {
            self.end_stroke();
        }
        self.sampler.reset();
        self.smoother.set_settings(SmootherSettings::from(&self.config));
        self.recorder.begin(self.config.pen_color);
        self.add_sample(raw);
    }

    fn add_sample(&mut self, raw: &RawSample) {
        let Some(point) = self.sampler.ingest(raw) else {
            return;
        };
        if let Some(segment) = self.smoother.push(point) {
            self.emit_segment(segment);
        }
    }

    fn emit_segment(&mut self, segment: Segment) {
        let color = self
            .recorder
            .current()
            .map_or(self.config.pen_color, |stroke| stroke.color());
        if self.recorder.append(segment) {
            self.renderer.paint_segment(&segment, color);
        }
    }

    fn end_stroke(&mut self) {
        if let Some(segment) = self.smoother.finish() {
            self.emit_segment(segment);
        }
        if let Some(stroke) = self.recorder.finalize() {
            self.events.emit(PadEvent::StrokeCompleted { id: stroke.id() });
            self.events.emit(PadEvent::SurfaceChanged {
                reason: SurfaceChange::StrokeCompleted,
            });
        }
    }

    // ---- history -------------------------------------------------------

    /// Remove the last finished stroke; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        if !self.recorder.undo() {
            return false;
        }
        self.full_redraw(SurfaceChange::Undo);
        true
    }

    /// Remove every stroke; the background image stays
    pub fn clear(&mut self) {
        self.smoother.reset();
        self.recorder.clear();
        self.full_redraw(SurfaceChange::Clear);
    }

    pub fn is_empty(&self) -> bool {
        self.recorder.history().is_empty()
    }

    pub fn history(&self) -> &History {
        self.recorder.history()
    }

    pub fn stroke_count(&self) -> usize {
        self.recorder.history().len()
    }

    // ---- surface -------------------------------------------------------

    pub fn size(&self) -> SurfaceSize {
        self.surface.size()
    }

    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }

    pub fn pixels(&self) -> &RgbaImage {
        self.renderer.pixels()
    }

    pub fn redraw_count(&self) -> u64 {
        self.renderer.redraw_count()
    }

    /// Queue a resize; it is applied by [`SignaturePad::poll`] once resizes stop arriving
    pub fn resize(&mut self, width: u32, height: u32, now_ms: u64) -> Result<(), ConfigError> {
        self.surface.request_resize(width, height, now_ms)
    }

    pub fn has_pending_resize(&self) -> bool {
        self.surface.has_pending_resize()
    }

    /// Start loading a background image; `None` removes the current one
    pub fn set_background_source(&mut self, source: Option<&str>) -> Option<RequestId> {
        match source {
            Some(source) => Some(self.background.request(source)),
            None => {
                self.background.cancel_current();
                if self.renderer.background().is_some() {
                    self.renderer.set_background(None);
                    self.full_redraw(SurfaceChange::Background);
                }
                None
            }
        }
    }

    pub fn background_source_pending(&self) -> Option<&str> {
        self.background.current_source()
    }

    /// Deliver timer and load completions that are due
    ///
    /// Hosts call this once per frame or tick. Returns true when the surface
    /// was fully redrawn.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let mut redrawn = false;

        if let Some(size) = self.surface.poll(now_ms) {
            info!("Applying resize to {size}");
            self.renderer.resize(size, self.surface.pixel_ratio());
            self.full_redraw(SurfaceChange::Resize);
            redrawn = true;
        }

        for outcome in self.background.poll_completions() {
            match outcome {
                BackgroundOutcome::Loaded { source, image } => {
                    self.renderer.set_background(Some(image));
                    self.full_redraw(SurfaceChange::Background);
                    self.events.emit(PadEvent::BackgroundLoaded { source });
                    redrawn = true;
                }
                BackgroundOutcome::Failed { source, error } => {
                    self.events.emit(PadEvent::BackgroundFailed { source, error });
                }
            }
        }
        redrawn
    }

    fn full_redraw(&mut self, reason: SurfaceChange) {
        debug!("Full redraw ({reason:?})");
        self.renderer
            .redraw(self.recorder.history(), self.recorder.current());
        self.events.emit(PadEvent::SurfaceChanged { reason });
    }

    // ---- export --------------------------------------------------------

    pub fn export(&self, format: ExportFormat) -> Result<Exported, ExportError> {
        ExportEngine {
            history: self.recorder.history(),
            pixels: self.renderer.pixels(),
            size: self.surface.size(),
            background_color: self.config.background_color,
        }
        .export(format)
    }

    /// `None` when nothing has been drawn
    pub fn to_data_url(&self, format: ExportFormat) -> Result<Option<String>, ExportError> {
        self.export(format)?.to_data_url()
    }

    pub fn to_vector(&self) -> VectorSignature {
        VectorSignature::from_history(self.recorder.history())
    }

    /// Replace the history with imported strokes, drawn in the current pen color
    pub fn from_vector(&mut self, signature: &VectorSignature) -> Result<(), VectorError> {
        signature.validate()?;
        let strokes: Vec<StrokeRef> = signature
            .0
            .iter()
            .filter(|stroke| !stroke.0.is_empty())
            .map(|stroke| Stroke::new_ref(self.config.pen_color, stroke.0.clone()))
            .collect();

        info!("Importing {} strokes", strokes.len());
        self.smoother.reset();
        self.recorder.replace_history(strokes);
        self.full_redraw(SurfaceChange::Import);
        Ok(())
    }

    pub fn from_vector_json(&mut self, json: &str) -> Result<(), VectorError> {
        let signature = VectorSignature::from_json(json)?;
        self.from_vector(&signature)
    }
}
