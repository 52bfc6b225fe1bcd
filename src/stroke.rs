use egui::{Color32, Rect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::smoothing::Segment;

/// Identifies a stroke across notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrokeId(pub Uuid);

impl StrokeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StrokeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StrokeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Immutable finalized stroke, shared between history, renderer and exports
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    id: StrokeId,
    color: Color32,
    segments: Vec<Segment>,
}

// In-progress stroke, owned by the recorder until finalized
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    id: StrokeId,
    color: Color32,
    segments: Vec<Segment>,
}

pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    pub fn new(color: Color32, segments: Vec<Segment>) -> Self {
        Self {
            id: StrokeId::new(),
            color,
            segments,
        }
    }

    pub fn new_ref(color: Color32, segments: Vec<Segment>) -> StrokeRef {
        Arc::new(Self::new(color, segments))
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn bounds(&self) -> Rect {
        self.segments
            .iter()
            .fold(Rect::NOTHING, |acc, seg| acc.union(seg.bounds()))
    }
}

impl StrokeBuilder {
    pub fn new(color: Color32) -> Self {
        Self {
            id: StrokeId::new(),
            color,
            segments: Vec::new(),
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Freeze into a shareable stroke, keeping the id
    pub fn finish(self) -> StrokeRef {
        Arc::new(Stroke {
            id: self.id,
            color: self.color,
            segments: self.segments,
        })
    }
}
