use api::{CalibrationSample, EyePoint, ScreenPoint};
use log::{debug, warn};

use super::GazeMapper;
use crate::config::MapperConfig;

const MIN_SPAN: f32 = 1e-6;

/// Padded eye-space bounding box of a calibration set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationMap {
    pub eye_min_x: f32,
    pub eye_max_x: f32,
    pub eye_min_y: f32,
    pub eye_max_y: f32,
}

impl CalibrationMap {
    pub fn from_samples(samples: &[CalibrationSample], padding: f32) -> Option<Self> {
        let first = samples.first()?;
        let mut map = Self {
            eye_min_x: first.eye.x,
            eye_max_x: first.eye.x,
            eye_min_y: first.eye.y,
            eye_max_y: first.eye.y,
        };
        for s in &samples[1..] {
            map.eye_min_x = map.eye_min_x.min(s.eye.x);
            map.eye_max_x = map.eye_max_x.max(s.eye.x);
            map.eye_min_y = map.eye_min_y.min(s.eye.y);
            map.eye_max_y = map.eye_max_y.max(s.eye.y);
        }

        let pad_x = (map.eye_max_x - map.eye_min_x) * padding;
        let pad_y = (map.eye_max_y - map.eye_min_y) * padding;
        map.eye_min_x -= pad_x;
        map.eye_max_x += pad_x;
        map.eye_min_y -= pad_y;
        map.eye_max_y += pad_y;
        Some(map)
    }

    pub fn is_degenerate(&self) -> bool {
        self.eye_max_x - self.eye_min_x < MIN_SPAN || self.eye_max_y - self.eye_min_y < MIN_SPAN
    }

    /// Normalizes `eye` into the box; `None` if the box has no extent on some axis.
    pub fn normalize(&self, eye: EyePoint) -> Option<(f32, f32)> {
        if self.is_degenerate() {
            return None;
        }
        let nx = ((eye.x - self.eye_min_x) / (self.eye_max_x - self.eye_min_x)).clamp(0.0, 1.0);
        let ny = ((eye.y - self.eye_min_y) / (self.eye_max_y - self.eye_min_y)).clamp(0.0, 1.0);
        Some((nx, ny))
    }
}

/// Min-max normalization of the eye position against the calibration bounding box.
#[derive(Debug, Clone)]
pub struct LinearMapper {
    padding: f32,
    mirror_x: bool,
    map: Option<CalibrationMap>,
}

impl LinearMapper {
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            padding: config.padding,
            mirror_x: config.mirror_x,
            map: None,
        }
    }

    pub fn map(&self) -> Option<&CalibrationMap> {
        self.map.as_ref()
    }
}

impl GazeMapper for LinearMapper {
    fn rebuild(&mut self, samples: &[CalibrationSample]) {
        self.map = CalibrationMap::from_samples(samples, self.padding);
        if let Some(map) = &self.map {
            if map.is_degenerate() {
                warn!("Calibration bounding box is degenerate: {:?}", map);
            } else {
                debug!("Calibration map rebuilt: {:?}", map);
            }
        }
    }

    fn predict(&self, eye: EyePoint, samples: &[CalibrationSample]) -> Option<ScreenPoint> {
        let map = match self.map {
            Some(map) => map,
            None => match CalibrationMap::from_samples(samples, self.padding) {
                Some(map) => map,
                None => return Some(ScreenPoint::CENTER),
            },
        };

        let (nx, ny) = map.normalize(eye)?;
        let nx = if self.mirror_x { 1.0 - nx } else { nx };
        Some(ScreenPoint::new(nx, ny))
    }

    fn reset(&mut self) {
        self.map = None;
    }

    fn name(&self) -> &str {
        "Linear"
    }
}
