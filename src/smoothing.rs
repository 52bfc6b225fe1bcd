//! Turns the live point stream of a stroke into quadratic curve segments.
//!
//! Each incoming point only looks at the two points before it, so the cost per
//! point is constant regardless of stroke length. Segments join at a blend
//! between consecutive points and use the shared point as their control point,
//! which hides the polygon facets of raw pointer sampling.

use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

use crate::config::{PadConfig, VelocityMapping};
use crate::input::Point;

/// One quadratic curve piece with linearly interpolated width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "startPoint")]
    pub start: Pos2,
    #[serde(rename = "controlPoint")]
    pub control: Pos2,
    #[serde(rename = "endPoint")]
    pub end: Pos2,
    #[serde(rename = "startWidth")]
    pub start_width: f32,
    #[serde(rename = "endWidth")]
    pub end_width: f32,
}

impl Segment {
    /// A straight segment, control point on the chord's midpoint
    pub fn line(start: Pos2, end: Pos2, start_width: f32, end_width: f32) -> Self {
        Self {
            start,
            control: start.lerp(end, 0.5),
            end,
            start_width,
            end_width,
        }
    }

    /// A filled dot of diameter `width`
    pub fn dot(center: Pos2, width: f32) -> Self {
        Self::line(center, center, width, width)
    }

    pub fn is_dot(&self) -> bool {
        self.start == self.end && self.start == self.control
    }

    pub fn point_at(&self, t: f32) -> Pos2 {
        let u = 1.0 - t;
        let v = self.start.to_vec2() * (u * u)
            + self.control.to_vec2() * (2.0 * u * t)
            + self.end.to_vec2() * (t * t);
        v.to_pos2()
    }

    pub fn width_at(&self, t: f32) -> f32 {
        self.start_width + (self.end_width - self.start_width) * t
    }

    /// Upper bound of the arc length (average of chord and control polygon)
    pub fn approx_length(&self) -> f32 {
        let chord = self.start.distance(self.end);
        let net = self.start.distance(self.control) + self.control.distance(self.end);
        (chord + net) * 0.5
    }

    /// Bounding box of the inked area, including half the widest line
    pub fn bounds(&self) -> Rect {
        let pad = self.start_width.max(self.end_width) * 0.5;
        Rect::from_points(&[self.start, self.control, self.end]).expand(pad)
    }
}

/// Smoothing parameters, extracted from [`PadConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmootherSettings {
    pub min_width: f32,
    pub max_width: f32,
    pub control_point_weight: f32,
    pub width_filter_weight: f32,
    pub velocity_mapping: VelocityMapping,
    pub min_time_delta_ms: f32,
}

impl From<&PadConfig> for SmootherSettings {
    fn from(config: &PadConfig) -> Self {
        Self {
            min_width: config.min_width,
            max_width: config.max_width,
            control_point_weight: config.control_point_weight,
            width_filter_weight: config.width_filter_weight,
            velocity_mapping: config.velocity_mapping,
            min_time_delta_ms: config.min_time_delta_ms,
        }
    }
}

impl Default for SmootherSettings {
    fn default() -> Self {
        Self::from(&PadConfig::default())
    }
}

/// Rolling-window curve builder for a single stroke
#[derive(Debug, Clone)]
pub struct CurveSmoother {
    settings: SmootherSettings,
    /// Most recent accepted point
    last: Option<Point>,
    /// Where the next segment starts, and the width there
    joint: Option<(Pos2, f32)>,
    last_width: f32,
    points_seen: usize,
}

impl CurveSmoother {
    pub fn new(settings: SmootherSettings) -> Self {
        Self {
            settings,
            last: None,
            joint: None,
            last_width: Self::initial_width(&settings),
            points_seen: 0,
        }
    }

    fn initial_width(settings: &SmootherSettings) -> f32 {
        (settings.min_width + settings.max_width) * 0.5
    }

    pub fn settings(&self) -> &SmootherSettings {
        &self.settings
    }

    /// Replace the settings; takes effect from the next stroke
    pub fn set_settings(&mut self, settings: SmootherSettings) {
        self.settings = settings;
        self.reset();
    }

    pub fn points_seen(&self) -> usize {
        self.points_seen
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.joint = None;
        self.last_width = Self::initial_width(&self.settings);
        self.points_seen = 0;
    }

    /// Feed the next point, returning a segment once enough context exists
    pub fn push(&mut self, point: Point) -> Option<Segment> {
        // A pointer that has not left its first position is still a tap
        if let Some(first) = self.last.filter(|_| self.points_seen == 1) {
            if first.pos == point.pos {
                self.last = Some(point);
                return None;
            }
        }
        self.points_seen += 1;

        let Some(last) = self.last.replace(point) else {
            self.joint = Some((point.pos, self.last_width));
            return None;
        };

        let width = self.next_width(&last, &point);
        if self.points_seen == 2 {
            // No curvature yet: wait for a third point or the end of the stroke
            return None;
        }

        let (start, start_width) = self.joint?;
        let end = last.pos.lerp(point.pos, self.settings.control_point_weight);
        self.joint = Some((end, width));

        Some(Segment {
            start,
            control: last.pos,
            end,
            start_width,
            end_width: width,
        })
    }

    /// Flush buffered points as the final segment and reset for the next stroke
    pub fn finish(&mut self) -> Option<Segment> {
        let segment = match (self.points_seen, self.last, self.joint) {
            (0, ..) => None,
            (1, Some(last), _) => Some(Segment::dot(last.pos, self.settings.min_width)),
            (2, Some(last), Some((start, start_width))) => {
                Some(Segment::line(start, last.pos, start_width, self.last_width))
            }
            (_, Some(last), Some((start, start_width))) if start != last.pos => {
                Some(Segment::line(start, last.pos, start_width, self.last_width))
            }
            _ => None,
        };
        self.reset();
        segment
    }

    fn next_width(&mut self, from: &Point, to: &Point) -> f32 {
        let SmootherSettings {
            min_width,
            max_width,
            width_filter_weight,
            velocity_mapping,
            min_time_delta_ms,
            ..
        } = self.settings;

        let dt = (to.time_ms.saturating_sub(from.time_ms) as f32).max(min_time_delta_ms);
        let velocity = from.pos.distance(to.pos) / dt;
        let target = velocity_mapping.target_width(velocity, min_width, max_width);
        let target = min_width + (target - min_width) * to.pressure;

        let filtered = self.last_width + (target - self.last_width) * width_filter_weight;
        self.last_width = filtered.clamp(min_width, max_width);
        self.last_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32, y: f32, time_ms: u64) -> Point {
        Point {
            pos: Pos2::new(x, y),
            pressure: 1.0,
            time_ms,
        }
    }

    fn run(points: &[Point]) -> Vec<Segment> {
        let mut smoother = CurveSmoother::new(SmootherSettings::default());
        let mut segments: Vec<Segment> = points.iter().filter_map(|p| smoother.push(*p)).collect();
        segments.extend(smoother.finish());
        segments
    }

    #[test]
    fn test_tap_yields_min_width_dot() {
        let segments = run(&[point(4.0, 4.0, 0)]);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_dot());
        assert_eq!(segments[0].start_width, 0.5);
        assert_eq!(segments[0].end_width, 0.5);
    }

    #[test]
    fn test_stationary_points_stay_a_tap() {
        let segments = run(&[point(4.0, 4.0, 0), point(4.0, 4.0, 80), point(4.0, 4.0, 120)]);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_dot());
        assert_eq!(segments[0].start_width, 0.5);
        assert_eq!(segments[0].end_width, 0.5);
    }

    #[test]
    fn test_movement_after_holding_still_draws_a_line() {
        let segments = run(&[point(4.0, 4.0, 0), point(4.0, 4.0, 80), point(24.0, 4.0, 100)]);
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_dot());
        assert_eq!(segments[0].start, Pos2::new(4.0, 4.0));
        assert_eq!(segments[0].end, Pos2::new(24.0, 4.0));
    }

    #[test]
    fn test_two_points_yield_one_straight_segment() {
        let segments = run(&[point(10.0, 10.0, 0), point(50.0, 10.0, 100)]);
        assert_eq!(segments.len(), 1);
        let seg = segments[0];
        assert_eq!(seg.start, Pos2::new(10.0, 10.0));
        assert_eq!(seg.end, Pos2::new(50.0, 10.0));
        assert_eq!(seg.control, Pos2::new(30.0, 10.0));
    }

    #[test]
    fn test_segments_are_continuous() {
        let points: Vec<Point> = (0..10)
            .map(|i| point(i as f32 * 7.0, (i as f32).sin() * 20.0, i * 16))
            .collect();
        let segments = run(&points);
        assert_eq!(segments.len(), points.len() - 1);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[0].end_width, pair[1].start_width);
        }
        assert_eq!(segments.first().unwrap().start, points[0].pos);
        assert_eq!(segments.last().unwrap().end, points[9].pos);
    }

    #[test]
    fn test_control_point_is_previous_sample() {
        let segments = run(&[point(0.0, 0.0, 0), point(10.0, 10.0, 10), point(20.0, 0.0, 20)]);
        assert_eq!(segments[0].control, Pos2::new(10.0, 10.0));
        assert_eq!(segments[0].end, Pos2::new(15.0, 5.0));
    }

    #[test]
    fn test_faster_strokes_are_thinner() {
        let slow = run(&[point(0.0, 0.0, 0), point(5.0, 0.0, 100), point(10.0, 0.0, 200)]);
        let fast = run(&[point(0.0, 0.0, 0), point(50.0, 0.0, 5), point(100.0, 0.0, 10)]);
        assert!(slow.last().unwrap().end_width > fast.last().unwrap().end_width);
    }

    #[test]
    fn test_widths_stay_within_bounds() {
        let points: Vec<Point> = (0..50)
            .map(|i| point((i * i) as f32, 0.0, i as u64))
            .collect();
        for seg in run(&points) {
            for w in [seg.start_width, seg.end_width] {
                assert!((0.5..=2.5).contains(&w), "width {w} out of bounds");
            }
        }
    }

    #[test]
    fn test_width_changes_are_filtered() {
        let mut smoother = CurveSmoother::new(SmootherSettings::default());
        smoother.push(point(0.0, 0.0, 0));
        smoother.push(point(1.0, 0.0, 100));
        // A sudden very fast move only moves part of the way towards min width
        let seg = smoother.push(point(500.0, 0.0, 101)).unwrap();
        assert!(seg.end_width > 0.5);
        assert!(seg.end_width < seg.start_width);
    }

    #[test]
    fn test_zero_time_delta_uses_epsilon() {
        let segments = run(&[point(0.0, 0.0, 5), point(3.0, 4.0, 5)]);
        assert!(segments[0].end_width.is_finite());
    }

    #[test]
    fn test_finish_resets_state() {
        let mut smoother = CurveSmoother::new(SmootherSettings::default());
        smoother.push(point(0.0, 0.0, 0));
        smoother.push(point(9.0, 0.0, 10));
        assert!(smoother.finish().is_some());
        assert_eq!(smoother.points_seen(), 0);
        assert!(smoother.finish().is_none());
    }

    #[test]
    fn test_low_pressure_thins_line() {
        let settings = SmootherSettings {
            width_filter_weight: 1.0,
            ..Default::default()
        };
        let mut smoother = CurveSmoother::new(settings);
        smoother.push(point(0.0, 0.0, 0));
        smoother.push(Point {
            pressure: 0.0,
            ..point(1.0, 0.0, 100)
        });
        let seg = smoother.finish().unwrap();
        assert_eq!(seg.end_width, 0.5);
    }
}
