use egui::{Context, Pos2, Rect};
use serde::{Deserialize, Serialize};

mod sampler;
pub use sampler::PointSampler;

/// One pointer or touch sample as delivered by the host
///
/// Coordinates are in host space; the sampler subtracts the surface origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSample {
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// In [0, 1], `None` when the device does not report pressure
    pub pressure: Option<f32>,
    /// Monotonic milliseconds, `None` when the host has no precise timing
    pub timestamp_ms: Option<u64>,
}

impl RawSample {
    /// A full-pressure sample at a known time
    pub fn at(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            pressure: None,
            timestamp_ms: Some(timestamp_ms),
        }
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

/// A sample mapped into surface-local logical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub pos: Pos2,
    pub pressure: f32,
    pub time_ms: u64,
}

/// Pointer events consumed by the stroke state machine
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Button or finger went down on the surface
    Down(RawSample),
    Move(RawSample),
    /// Button released, optionally with a final sample
    Up(Option<RawSample>),
    /// The platform aborted the pointer stream
    Cancel,
    /// Pointer left the surface
    Leave,
}

/// Turns egui pointer state over the drawing area into [`PointerEvent`]s
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    drawing: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Process this frame's raw egui input for the surface occupying `surface_rect`
    pub fn process_input(&mut self, ctx: &Context, surface_rect: Rect) -> Vec<PointerEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            let timestamp_ms = Some((input.time * 1000.0) as u64);
            let force = input.events.iter().rev().find_map(|event| match event {
                egui::Event::Touch { force, .. } => *force,
                _ => None,
            });
            let sample_at = |pos: Pos2| RawSample {
                x: Some(pos.x),
                y: Some(pos.y),
                pressure: force,
                timestamp_ms,
            };

            let pos = input.pointer.interact_pos();

            if input.pointer.primary_pressed() {
                if let Some(pos) = pos.filter(|p| surface_rect.contains(*p)) {
                    events.push(PointerEvent::Down(sample_at(pos)));
                    self.drawing = true;
                    self.last_pointer_pos = Some(pos);
                }
            }

            if self.drawing {
                match pos {
                    Some(pos) if !surface_rect.contains(pos) => {
                        events.push(PointerEvent::Leave);
                        self.drawing = false;
                    }
                    Some(pos) if Some(pos) != self.last_pointer_pos => {
                        events.push(PointerEvent::Move(sample_at(pos)));
                        self.last_pointer_pos = Some(pos);
                    }
                    None => {
                        events.push(PointerEvent::Cancel);
                        self.drawing = false;
                    }
                    _ => {}
                }
            }

            if self.drawing && input.pointer.primary_released() {
                events.push(PointerEvent::Up(pos.map(sample_at)));
                self.drawing = false;
            }

            if !self.drawing {
                self.last_pointer_pos = None;
            }
        });

        events
    }
}
