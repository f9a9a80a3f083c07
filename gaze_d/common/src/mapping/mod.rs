//! Eye-space to screen-space mapping strategies.

mod idw;
mod linear;
mod polynomial;

pub use idw::IdwMapper;
pub use linear::{CalibrationMap, LinearMapper};
pub use polynomial::{FitError, PolynomialMapper, QuadraticModel};

use api::{CalibrationSample, EyePoint, ScreenPoint};
use glam::Vec2;

use crate::config::{MapperConfig, MapperStrategy};

pub trait GazeMapper: Send {
    /// Recompute cached parameters after the calibration set changed.
    fn rebuild(&mut self, samples: &[CalibrationSample]);

    /// Predict a normalized screen point. `None` means "keep the previous target".
    fn predict(&self, eye: EyePoint, samples: &[CalibrationSample]) -> Option<ScreenPoint>;

    /// Drop cached parameters.
    fn reset(&mut self);

    fn name(&self) -> &str;
}

pub fn create_mapper(config: &MapperConfig) -> Box<dyn GazeMapper> {
    match config.strategy {
        MapperStrategy::Linear => Box::new(LinearMapper::new(config)),
        MapperStrategy::Idw => Box::new(IdwMapper::new(config)),
        MapperStrategy::Polynomial => Box::new(PolynomialMapper::new(config)),
    }
}

/// Root-mean-square screen-space error of `mapper` over its own training set.
pub fn residual_rms(mapper: &dyn GazeMapper, samples: &[CalibrationSample]) -> Option<f32> {
    let errors: Vec<f32> = samples
        .iter()
        .filter_map(|s| {
            mapper
                .predict(s.eye, samples)
                .map(|p| Vec2::from(p).distance_squared(Vec2::from(s.screen)))
        })
        .collect();
    if errors.is_empty() {
        return None;
    }
    Some((errors.iter().sum::<f32>() / errors.len() as f32).sqrt())
}
