use egui::Color32;
use log::{debug, info};

use crate::history::History;
use crate::smoothing::Segment;
use crate::stroke::{StrokeBuilder, StrokeRef};

/// Recorder state machine
#[derive(Debug, Clone, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording(StrokeBuilder),
}

impl RecorderState {
    pub fn name(&self) -> &'static str {
        match self {
            RecorderState::Idle => "Idle",
            RecorderState::Recording(_) => "Recording",
        }
    }
}

/// Accumulates segments into strokes and owns the undo history
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    state: RecorderState,
    history: History,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The stroke currently being drawn, if any
    pub fn current(&self) -> Option<&StrokeBuilder> {
        match &self.state {
            RecorderState::Recording(builder) => Some(builder),
            RecorderState::Idle => None,
        }
    }

    /// Idle -> Recording. A stroke still in progress is finalized first.
    pub fn begin(&mut self, color: Color32) -> Option<StrokeRef> {
        let previous = self.finalize();
        let builder = StrokeBuilder::new(color);
        debug!("Stroke {} started", builder.id());
        self.state = RecorderState::Recording(builder);
        previous
    }

    /// Append a segment to the in-progress stroke; ignored while idle
    pub fn append(&mut self, segment: Segment) -> bool {
        match &mut self.state {
            RecorderState::Recording(builder) => {
                builder.add_segment(segment);
                true
            }
            RecorderState::Idle => false,
        }
    }

    /// Recording -> Idle. Returns the stroke if it had segments and was pushed.
    pub fn finalize(&mut self) -> Option<StrokeRef> {
        let RecorderState::Recording(builder) = std::mem::take(&mut self.state) else {
            return None;
        };

        if builder.is_empty() {
            debug!("Discarding empty stroke {}", builder.id());
            return None;
        }

        let stroke = builder.finish();
        info!(
            "Stroke {} finalized with {} segments",
            stroke.id(),
            stroke.segments().len()
        );
        self.history.push(stroke.clone());
        Some(stroke)
    }

    /// Pop the last finalized stroke; false when history is empty
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(stroke) => {
                info!("Undo stroke {}", stroke.id());
                true
            }
            None => false,
        }
    }

    /// Empty the history and drop any stroke in progress
    pub fn clear(&mut self) {
        self.state = RecorderState::Idle;
        self.history.clear();
        info!("History cleared");
    }

    /// Replace the history wholesale, abandoning any stroke in progress
    pub fn replace_history(&mut self, strokes: Vec<StrokeRef>) {
        self.state = RecorderState::Idle;
        self.history.replace(strokes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    fn dot() -> Segment {
        Segment::dot(Pos2::new(1.0, 1.0), 1.0)
    }

    #[test]
    fn test_finalize_pushes_non_empty_stroke() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Color32::BLACK);
        assert!(recorder.is_recording());
        assert!(recorder.append(dot()));
        // History is untouched until finalize
        assert!(recorder.history().is_empty());

        let stroke = recorder.finalize().unwrap();
        assert_eq!(recorder.history().len(), 1);
        assert_eq!(recorder.history().strokes()[0].id(), stroke.id());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_empty_stroke_is_discarded() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Color32::BLACK);
        assert!(recorder.finalize().is_none());
        assert!(recorder.history().is_empty());
    }

    #[test]
    fn test_append_while_idle_is_ignored() {
        let mut recorder = StrokeRecorder::new();
        assert!(!recorder.append(dot()));
        assert!(recorder.finalize().is_none());
    }

    #[test]
    fn test_begin_while_recording_finalizes_previous() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Color32::BLACK);
        recorder.append(dot());
        assert!(recorder.begin(Color32::RED).is_some());
        assert_eq!(recorder.history().len(), 1);
        assert_eq!(recorder.current().unwrap().color(), Color32::RED);
    }

    #[test]
    fn test_undo_until_empty() {
        let mut recorder = StrokeRecorder::new();
        for _ in 0..2 {
            recorder.begin(Color32::BLACK);
            recorder.append(dot());
            recorder.finalize();
        }
        assert!(recorder.undo());
        assert!(recorder.undo());
        assert!(!recorder.undo());
        assert!(!recorder.undo());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Color32::BLACK);
        recorder.append(dot());
        recorder.finalize();
        recorder.begin(Color32::BLACK);
        recorder.append(dot());
        recorder.clear();
        assert!(recorder.history().is_empty());
        assert_eq!(recorder.state().name(), "Idle");
    }
}
