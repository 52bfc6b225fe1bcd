use crate::stroke::StrokeRef;

/// Finalized strokes in completion order
///
/// Append-only apart from [`History::pop`] (undo) and [`History::clear`].
#[derive(Debug, Clone, Default)]
pub struct History {
    strokes: Vec<StrokeRef>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stroke: StrokeRef) {
        self.strokes.push(stroke);
    }

    pub fn pop(&mut self) -> Option<StrokeRef> {
        self.strokes.pop()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// Swap in a whole new history, e.g. when importing vector data
    pub fn replace(&mut self, strokes: Vec<StrokeRef>) {
        self.strokes = strokes;
    }

    pub fn strokes(&self) -> &[StrokeRef] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.strokes.iter().map(|s| s.segments().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoothing::Segment;
    use crate::stroke::Stroke;
    use egui::{Color32, Pos2};

    fn dot_stroke(x: f32) -> StrokeRef {
        Stroke::new_ref(Color32::BLACK, vec![Segment::dot(Pos2::new(x, x), 1.0)])
    }

    #[test]
    fn test_pop_returns_most_recent() {
        let mut history = History::new();
        let first = dot_stroke(1.0);
        let second = dot_stroke(2.0);
        history.push(first.clone());
        history.push(second.clone());

        assert_eq!(history.pop().map(|s| s.id()), Some(second.id()));
        assert_eq!(history.len(), 1);
        assert_eq!(history.strokes()[0].id(), first.id());
    }

    #[test]
    fn test_pop_on_empty_is_none() {
        let mut history = History::new();
        assert!(history.pop().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_segment_count_and_clear() {
        let mut history = History::new();
        history.push(dot_stroke(1.0));
        history.push(dot_stroke(2.0));
        assert_eq!(history.segment_count(), 2);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.segment_count(), 0);
    }
}
