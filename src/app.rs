use egui::{Color32, Rect, pos2};
use log::{error, info};

use crate::config::PadConfig;
use crate::event::{NotificationLog, PadEvent};
use crate::export::ExportFormat;
use crate::input::InputHandler;
use crate::pad::SignaturePad;
use crate::texture_manager::SurfaceTexture;
use crate::util::time;

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct SignaturePadApp {
    config: PadConfig,
    background_path: String,

    // The pad owns pixel buffers and history, which are not persisted
    #[serde(skip)]
    pad: Option<SignaturePad>,
    #[serde(skip)]
    input: InputHandler,
    #[serde(skip)]
    texture: SurfaceTexture,
    #[serde(skip)]
    notifications: NotificationLog,
    #[serde(skip)]
    status: String,
    /// Last size handed to the debounced resize, so repeated frames do not restart it
    #[serde(skip)]
    requested_size: Option<(u32, u32)>,
}

impl Default for SignaturePadApp {
    fn default() -> Self {
        Self {
            config: PadConfig::default(),
            background_path: String::new(),
            pad: None,
            input: InputHandler::new(),
            texture: SurfaceTexture::new(),
            notifications: NotificationLog::new(),
            status: String::new(),
            requested_size: None,
        }
    }
}

impl SignaturePadApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        if let Err(err) = app.config.validate() {
            error!("Stored configuration rejected, using defaults: {err}");
            app.config = PadConfig::default();
        }
        app.config.device_pixel_ratio = cc.egui_ctx.pixels_per_point();
        app
    }

    /// Create the pad lazily, once the drawing area size is known
    fn ensure_pad(&mut self, rect: Rect) -> bool {
        let (width, height) = logical_size(rect);
        if self.pad.is_none() {
            match SignaturePad::new(self.config.clone(), width, height) {
                Ok(pad) => {
                    pad.subscribe(Box::new(self.notifications.clone()));
                    self.pad = Some(pad);
                }
                Err(err) => {
                    error!("Cannot create signature pad: {err}");
                    self.status = err.to_string();
                }
            }
        }
        self.pad.is_some()
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Signature");
        ui.separator();

        let mut config = self.config.clone();
        ui.horizontal(|ui| {
            ui.label("Pen:");
            egui::color_picker::color_edit_button_srgba(
                ui,
                &mut config.pen_color,
                egui::color_picker::Alpha::Opaque,
            );
        });
        ui.add(egui::Slider::new(&mut config.min_width, 0.1..=10.0).text("min width"));
        ui.add(egui::Slider::new(&mut config.max_width, 0.1..=20.0).text("max width"));

        if config != self.config {
            self.apply_config(config);
        }

        ui.separator();
        ui.horizontal(|ui| {
            let Some(pad) = self.pad.as_mut() else {
                return;
            };
            if ui.button("Undo").clicked() && !pad.undo() {
                self.status = "Nothing to undo".to_owned();
            }
            if ui.button("Clear").clicked() {
                pad.clear();
            }
        });

        ui.separator();
        ui.label("Background image:");
        ui.text_edit_singleline(&mut self.background_path);
        ui.horizontal(|ui| {
            let Some(pad) = self.pad.as_mut() else {
                return;
            };
            if ui.button("Load").clicked() && !self.background_path.is_empty() {
                pad.set_background_source(Some(&self.background_path));
            }
            if ui.button("Remove").clicked() {
                pad.set_background_source(None);
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Save PNG").clicked() {
                self.save_export(ExportFormat::Png, "signature.png");
            }
            if ui.button("Save SVG").clicked() {
                self.save_export(ExportFormat::Svg, "signature.svg");
            }
            if ui.button("Save JSON").clicked() {
                self.save_export(ExportFormat::Vector, "signature.json");
            }
        });

        if let Some(pad) = &self.pad {
            ui.separator();
            ui.label(format!("Strokes: {}", pad.stroke_count()));
        }
        if !self.status.is_empty() {
            ui.label(&self.status);
        }
    }

    fn apply_config(&mut self, config: PadConfig) {
        let result = match self.pad.as_mut() {
            Some(pad) => pad.set_config(config.clone()),
            None => config.validate(),
        };
        match result {
            Ok(()) => self.config = config,
            Err(err) => self.status = err.to_string(),
        }
    }

    fn save_export(&mut self, format: ExportFormat, file_name: &str) {
        let Some(pad) = &self.pad else {
            return;
        };
        let exported = match pad.export(format) {
            Ok(exported) => exported,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };

        let bytes = match exported {
            crate::export::Exported::Empty => {
                self.status = "Nothing to export".to_owned();
                return;
            }
            crate::export::Exported::Image(image) => image.bytes,
            crate::export::Exported::Svg(svg) => svg.into_bytes(),
            crate::export::Exported::Vector(vector) => match vector.to_json() {
                Ok(json) => json.into_bytes(),
                Err(err) => {
                    self.status = err.to_string();
                    return;
                }
            },
        };

        #[cfg(not(target_arch = "wasm32"))]
        match std::fs::write(file_name, &bytes) {
            Ok(()) => {
                info!("Wrote {} ({} bytes)", file_name, bytes.len());
                self.status = format!("Saved {file_name}");
            }
            Err(err) => {
                error!("Failed to write {file_name}: {err}");
                self.status = err.to_string();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = bytes;
            self.status = format!("Saving {file_name} is not supported on the web");
        }
    }

    fn drain_notifications(&mut self) {
        for event in self.notifications.take() {
            match event {
                PadEvent::BackgroundFailed { source, error } => {
                    self.status = format!("Could not load {source}: {error}");
                }
                PadEvent::BackgroundLoaded { source } => {
                    self.status = format!("Loaded {source}");
                }
                PadEvent::StrokeCompleted { .. } | PadEvent::SurfaceChanged { .. } => {}
            }
        }
    }
}

fn logical_size(rect: Rect) -> (u32, u32) {
    (
        (rect.width().round() as u32).max(1),
        (rect.height().round() as u32).max(1),
    )
}

impl eframe::App for SignaturePadApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::WHITE))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::drag());
                let rect = response.rect;
                let now = time::monotonic_ms();

                let ratio = ctx.pixels_per_point();
                if ratio != self.config.device_pixel_ratio {
                    let config = PadConfig {
                        device_pixel_ratio: ratio,
                        ..self.config.clone()
                    };
                    self.apply_config(config);
                }

                let events = self.input.process_input(ctx, rect);
                if !self.ensure_pad(rect) {
                    return;
                }
                let Some(pad) = self.pad.as_mut() else {
                    return;
                };

                pad.set_origin(rect.min);
                let (width, height) = logical_size(rect);
                let size = pad.size();
                if (size.width, size.height) != (width, height)
                    && self.requested_size != Some((width, height))
                {
                    match pad.resize(width, height, now) {
                        Ok(()) => self.requested_size = Some((width, height)),
                        Err(err) => error!("Rejected resize: {err}"),
                    }
                }

                // Due redraws land before any stroke started this frame
                pad.poll(now);
                for event in events {
                    pad.handle_pointer(event);
                }

                let busy = pad.has_pending_resize() || pad.background_source_pending().is_some();
                let revision = pad.surface().revision();
                let texture_id = self.texture.update(ctx, pad.pixels(), revision);

                // The surface keeps its size until the debounced resize lands
                let drawn = Rect::from_min_size(
                    rect.min,
                    egui::vec2(size.width as f32, size.height as f32),
                );
                painter.image(
                    texture_id,
                    drawn,
                    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                    Color32::WHITE,
                );

                if busy || self.input.is_drawing() {
                    ctx.request_repaint();
                }
            });

        self.drain_notifications();
    }
}
