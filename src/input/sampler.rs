use egui::{Pos2, Vec2};
use log::debug;

use super::{Point, RawSample};
use crate::util::time;

/// Normalizes raw pointer samples into surface-local points
///
/// The only state kept between samples is the last accepted timestamp, used to
/// drop samples whose time delta is zero or negative.
#[derive(Debug, Clone, Default)]
pub struct PointSampler {
    /// Top-left corner of the drawing surface in host coordinates
    origin: Vec2,
    last_timestamp: Option<u64>,
}

impl PointSampler {
    pub fn new(origin: Pos2) -> Self {
        Self {
            origin: origin.to_vec2(),
            last_timestamp: None,
        }
    }

    pub fn set_origin(&mut self, origin: Pos2) {
        self.origin = origin.to_vec2();
    }

    pub fn origin(&self) -> Pos2 {
        self.origin.to_pos2()
    }

    /// Forget the last timestamp, called when a new stroke begins
    pub fn reset(&mut self) {
        self.last_timestamp = None;
    }

    /// Maps a raw sample to a [`Point`], or drops it
    ///
    /// Samples without coordinates, with non-finite coordinates, or whose
    /// timestamp does not advance past the last accepted one yield `None`.
    pub fn ingest(&mut self, raw: &RawSample) -> Option<Point> {
        let (Some(x), Some(y)) = (raw.x, raw.y) else {
            debug!("Dropping pointer sample without coordinates");
            return None;
        };
        if !x.is_finite() || !y.is_finite() {
            debug!("Dropping pointer sample with non-finite coordinates");
            return None;
        }

        let time_ms = match raw.timestamp_ms {
            Some(t) => t,
            None => {
                let now = time::monotonic_ms();
                self.last_timestamp.map_or(now, |last| now.max(last.saturating_add(1)))
            }
        };
        if let Some(last) = self.last_timestamp {
            if time_ms <= last {
                debug!("Dropping pointer sample at {time_ms}ms (last accepted {last}ms)");
                return None;
            }
        }
        self.last_timestamp = Some(time_ms);

        let pressure = match raw.pressure {
            Some(p) if p.is_finite() => p.clamp(0.0, 1.0),
            _ => 1.0,
        };

        Some(Point {
            pos: Pos2::new(x, y) - self.origin,
            pressure,
            time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_into_surface_coordinates() {
        let mut sampler = PointSampler::new(Pos2::new(100.0, 50.0));
        let point = sampler.ingest(&RawSample::at(110.0, 60.0, 5)).unwrap();
        assert_eq!(point.pos, Pos2::new(10.0, 10.0));
        assert_eq!(point.time_ms, 5);
    }

    #[test]
    fn test_pressure_defaults_and_clamps() {
        let mut sampler = PointSampler::default();
        let point = sampler.ingest(&RawSample::at(1.0, 1.0, 1)).unwrap();
        assert_eq!(point.pressure, 1.0);

        let raw = RawSample {
            pressure: Some(3.0),
            ..RawSample::at(2.0, 2.0, 2)
        };
        assert_eq!(sampler.ingest(&raw).unwrap().pressure, 1.0);

        let raw = RawSample {
            pressure: Some(-0.5),
            ..RawSample::at(3.0, 3.0, 3)
        };
        assert_eq!(sampler.ingest(&raw).unwrap().pressure, 0.0);
    }

    #[test]
    fn test_missing_coordinates_rejected() {
        let mut sampler = PointSampler::default();
        let raw = RawSample {
            x: None,
            ..RawSample::at(0.0, 4.0, 1)
        };
        assert!(sampler.ingest(&raw).is_none());
        // A rejected sample does not consume the timestamp
        assert!(sampler.ingest(&RawSample::at(0.0, 4.0, 1)).is_some());
    }

    #[test]
    fn test_duplicate_samples_collapse() {
        let mut sampler = PointSampler::default();
        assert!(sampler.ingest(&RawSample::at(5.0, 5.0, 10)).is_some());
        assert!(sampler.ingest(&RawSample::at(5.0, 5.0, 10)).is_none());
        assert!(sampler.ingest(&RawSample::at(6.0, 5.0, 9)).is_none());
        assert!(sampler.ingest(&RawSample::at(6.0, 5.0, 11)).is_some());
    }

    #[test]
    fn test_reset_accepts_earlier_timestamps() {
        let mut sampler = PointSampler::default();
        sampler.ingest(&RawSample::at(5.0, 5.0, 10)).unwrap();
        sampler.reset();
        assert!(sampler.ingest(&RawSample::at(5.0, 5.0, 10)).is_some());
    }

    #[test]
    fn test_missing_timestamp_is_filled_after_last() {
        let mut sampler = PointSampler::default();
        let far_future = u64::MAX / 2;
        sampler.ingest(&RawSample::at(0.0, 0.0, far_future)).unwrap();
        let raw = RawSample {
            timestamp_ms: None,
            ..RawSample::at(1.0, 1.0, 0)
        };
        let point = sampler.ingest(&raw).unwrap();
        assert_eq!(point.time_ms, far_future + 1);
    }

    #[test]
    fn test_missing_timestamp_after_max_is_dropped() {
        let mut sampler = PointSampler::default();
        sampler.ingest(&RawSample::at(0.0, 0.0, u64::MAX)).unwrap();
        let raw = RawSample {
            timestamp_ms: None,
            ..RawSample::at(1.0, 1.0, 0)
        };
        assert!(sampler.ingest(&raw).is_none());
    }
}
