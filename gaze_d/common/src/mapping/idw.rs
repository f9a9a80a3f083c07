use api::{CalibrationSample, EyePoint, ScreenPoint};
use glam::Vec2;

use super::GazeMapper;
use crate::config::MapperConfig;

/// K-nearest-neighbour inverse-distance weighting over the raw calibration set.
#[derive(Debug, Clone)]
pub struct IdwMapper {
    k: usize,
    power: f32,
    snap_threshold: f32,
    epsilon: f32,
    fallback_sensitivity: f32,
}

impl IdwMapper {
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            k: config.k.max(1),
            power: config.power,
            snap_threshold: config.snap_threshold,
            epsilon: config.epsilon,
            fallback_sensitivity: config.fallback_sensitivity,
        }
    }

    fn nearest_offset(&self, query: Vec2, nearest: &CalibrationSample) -> ScreenPoint {
        let delta = (query - Vec2::from(nearest.eye)) * self.fallback_sensitivity;
        ScreenPoint::from(Vec2::from(nearest.screen) + delta).clamped()
    }
}

impl GazeMapper for IdwMapper {
    fn rebuild(&mut self, _samples: &[CalibrationSample]) {}

    fn predict(&self, eye: EyePoint, samples: &[CalibrationSample]) -> Option<ScreenPoint> {
        if samples.is_empty() {
            return Some(ScreenPoint::CENTER);
        }

        let query = Vec2::from(eye);
        let mut ranked: Vec<(f32, &CalibrationSample)> = samples
            .iter()
            .map(|s| (query.distance(Vec2::from(s.eye)), s))
            .filter(|(d, _)| d.is_finite())
            .collect();
        if ranked.is_empty() {
            return Some(ScreenPoint::CENTER);
        }
        // Stable sort keeps insertion order among equal distances.
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (nearest_distance, nearest) = ranked[0];
        if nearest_distance < self.snap_threshold || nearest_distance == 0.0 {
            return Some(nearest.screen);
        }

        if ranked.len() < self.k {
            return Some(self.nearest_offset(query, nearest));
        }

        let mut weighted = Vec2::ZERO;
        let mut total = 0.0f32;
        for (distance, sample) in ranked.iter().take(self.k) {
            let w = 1.0 / (distance.powf(self.power) + self.epsilon);
            weighted += Vec2::from(sample.screen) * w;
            total += w;
        }
        if !(total > 0.0) || !total.is_finite() {
            return Some(nearest.screen);
        }

        Some(ScreenPoint::from(weighted / total).clamped())
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "Idw"
    }
}
