use std::sync::Arc;

use egui::Color32;
use image::RgbaImage;
use log::debug;

use crate::history::History;
use crate::smoothing::Segment;
use crate::stroke::StrokeBuilder;
use crate::surface::{DrawableSurface, SurfaceSize};

/// Paints segments onto a [`DrawableSurface`]
///
/// The renderer is the only writer of the surface. Incremental paints add a
/// single segment on top of what is already there; a full redraw rebuilds the
/// pixels from the background and the history alone.
#[derive(Debug)]
pub struct Renderer<S> {
    surface: S,
    background: Option<Arc<RgbaImage>>,
    background_color: Color32,
    redraw_count: u64,
}

impl<S: DrawableSurface> Renderer<S> {
    pub fn new(surface: S, background_color: Color32) -> Self {
        Self {
            surface,
            background: None,
            background_color,
            redraw_count: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn pixels(&self) -> &RgbaImage {
        self.surface.pixels()
    }

    pub fn background(&self) -> Option<&Arc<RgbaImage>> {
        self.background.as_ref()
    }

    /// Takes effect on the next full redraw
    pub fn set_background(&mut self, background: Option<Arc<RgbaImage>>) {
        self.background = background;
    }

    /// Takes effect on the next full redraw
    pub fn set_background_color(&mut self, color: Color32) {
        self.background_color = color;
    }

    /// Number of full redraws performed so far
    pub fn redraw_count(&self) -> u64 {
        self.redraw_count
    }

    /// Reallocate the surface; callers follow up with a full redraw
    pub fn resize(&mut self, size: SurfaceSize, pixel_ratio: f32) {
        self.surface.resize(size, pixel_ratio);
    }

    /// Paint one newly emitted segment on top of the current pixels
    pub fn paint_segment(&mut self, segment: &Segment, color: Color32) {
        self.surface.draw_segment(segment, color);
    }

    /// Clear, paint the background, then every stroke in history order
    ///
    /// A stroke still being recorded is painted last so that a redraw in the
    /// middle of a stroke does not erase its live ink.
    pub fn redraw(&mut self, history: &History, live: Option<&StrokeBuilder>) {
        self.surface.clear(self.background_color);
        if let Some(background) = &self.background {
            self.surface.draw_image(background);
        }

        for stroke in history.strokes() {
            for segment in stroke.segments() {
                self.surface.draw_segment(segment, stroke.color());
            }
        }
        if let Some(live) = live {
            for segment in live.segments() {
                self.surface.draw_segment(segment, live.color());
            }
        }

        self.redraw_count += 1;
        debug!(
            "Full redraw #{} at {}: {} strokes, {} segments",
            self.redraw_count,
            self.surface.size(),
            history.len(),
            history.segment_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Stroke;
    use crate::surface::RasterSurface;
    use egui::Pos2;
    use image::Rgba;

    fn renderer() -> Renderer<RasterSurface> {
        let size = SurfaceSize::new(30, 30).unwrap();
        Renderer::new(RasterSurface::new(size, 1.0), Color32::TRANSPARENT)
    }

    fn history_with_line(color: Color32, y: f32) -> History {
        let mut history = History::new();
        history.push(Stroke::new_ref(
            color,
            vec![Segment::line(Pos2::new(2.0, y), Pos2::new(28.0, y), 3.0, 3.0)],
        ));
        history
    }

    #[test]
    fn test_redraw_is_deterministic() {
        let history = history_with_line(Color32::BLACK, 15.0);
        let mut renderer = renderer();
        renderer.redraw(&history, None);
        let first = renderer.pixels().clone();
        renderer.redraw(&history, None);
        assert_eq!(&first, renderer.pixels());
        assert_eq!(renderer.redraw_count(), 2);
    }

    #[test]
    fn test_redraw_erases_incremental_ink_not_in_history() {
        let mut renderer = renderer();
        renderer.paint_segment(&Segment::dot(Pos2::new(5.0, 5.0), 4.0), Color32::BLACK);
        assert_ne!(renderer.pixels().get_pixel(5, 5).0[3], 0);

        renderer.redraw(&History::new(), None);
        assert!(renderer.pixels().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_later_strokes_paint_on_top() {
        let mut history = history_with_line(Color32::RED, 15.0);
        history.push(Stroke::new_ref(
            Color32::BLUE,
            vec![Segment::line(Pos2::new(15.0, 2.0), Pos2::new(15.0, 28.0), 3.0, 3.0)],
        ));
        let mut renderer = renderer();
        renderer.redraw(&history, None);
        assert_eq!(renderer.pixels().get_pixel(15, 15).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_background_is_painted_under_strokes() {
        let history = history_with_line(Color32::BLACK, 15.0);
        let mut renderer = renderer();
        renderer.set_background(Some(Arc::new(RgbaImage::from_pixel(
            1,
            1,
            Rgba([0, 255, 0, 255]),
        ))));
        renderer.redraw(&history, None);
        assert_eq!(renderer.pixels().get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(renderer.pixels().get_pixel(15, 15).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_live_stroke_survives_redraw() {
        let mut live = StrokeBuilder::new(Color32::BLACK);
        live.add_segment(Segment::dot(Pos2::new(10.5, 10.5), 4.0));
        let mut renderer = renderer();
        renderer.redraw(&History::new(), Some(&live));
        assert_eq!(renderer.pixels().get_pixel(10, 10).0, [0, 0, 0, 255]);
    }
}
