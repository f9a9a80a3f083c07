use api::{CalibrationSample, EyePoint, ScreenPoint};
use log::{debug, warn};

use super::{GazeMapper, IdwMapper};
use crate::config::MapperConfig;

pub const TERMS: usize = 6;
const PIVOT_EPSILON: f64 = 1e-9;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FitError {
    #[error("need at least {needed} samples for a quadratic fit, have {have}")]
    TooFewSamples { needed: usize, have: usize },
    #[error("normal equations are singular (pivot {0:e})")]
    Singular(f64),
}

/// `screen = c0 + c1·ex + c2·ey + c3·ex·ey + c4·ex² + c5·ey²`, one coefficient set per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticModel {
    pub x: [f64; TERMS],
    pub y: [f64; TERMS],
}

fn features(eye: EyePoint) -> [f64; TERMS] {
    let ex = eye.x as f64;
    let ey = eye.y as f64;
    [1.0, ex, ey, ex * ey, ex * ex, ey * ey]
}

fn dot(c: &[f64; TERMS], f: &[f64; TERMS]) -> f64 {
    c.iter().zip(f).map(|(a, b)| a * b).sum()
}

/// Solves `a · c = b` in place by Gaussian elimination with partial pivoting.
fn gaussian_eliminate(
    mut a: [[f64; TERMS]; TERMS],
    mut b: [f64; TERMS],
) -> Result<[f64; TERMS], FitError> {
    for col in 0..TERMS {
        let pivot_row = (col..TERMS)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        let pivot = a[pivot_row][col];
        if !(pivot.abs() >= PIVOT_EPSILON) {
            return Err(FitError::Singular(pivot));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..TERMS {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..TERMS {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut c = [0.0; TERMS];
    for row in (0..TERMS).rev() {
        let tail: f64 = ((row + 1)..TERMS).map(|k| a[row][k] * c[k]).sum();
        c[row] = (b[row] - tail) / a[row][row];
    }
    Ok(c)
}

impl QuadraticModel {
    pub fn fit(samples: &[CalibrationSample], min_samples: usize) -> Result<Self, FitError> {
        let needed = min_samples.max(TERMS);
        if samples.len() < needed {
            return Err(FitError::TooFewSamples {
                needed,
                have: samples.len(),
            });
        }

        let mut ata = [[0.0f64; TERMS]; TERMS];
        let mut atx = [0.0f64; TERMS];
        let mut aty = [0.0f64; TERMS];
        for s in samples {
            let row = features(s.eye);
            for r in 0..TERMS {
                for c in 0..TERMS {
                    ata[r][c] += row[r] * row[c];
                }
                atx[r] += row[r] * s.screen.x as f64;
                aty[r] += row[r] * s.screen.y as f64;
            }
        }

        Ok(Self {
            x: gaussian_eliminate(ata, atx)?,
            y: gaussian_eliminate(ata, aty)?,
        })
    }

    pub fn evaluate(&self, eye: EyePoint) -> ScreenPoint {
        let f = features(eye);
        ScreenPoint::new(dot(&self.x, &f) as f32, dot(&self.y, &f) as f32)
    }
}

/// Quadratic least-squares regression with cached coefficients.
/// Uses IDW until a fit has succeeded.
#[derive(Debug, Clone)]
pub struct PolynomialMapper {
    min_samples: usize,
    model: Option<QuadraticModel>,
    fallback: IdwMapper,
}

impl PolynomialMapper {
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            model: None,
            fallback: IdwMapper::new(config),
        }
    }

    pub fn model(&self) -> Option<&QuadraticModel> {
        self.model.as_ref()
    }
}

impl GazeMapper for PolynomialMapper {
    fn rebuild(&mut self, samples: &[CalibrationSample]) {
        match QuadraticModel::fit(samples, self.min_samples) {
            Ok(model) => {
                debug!("Quadratic fit over {} samples: {:?}", samples.len(), model);
                self.model = Some(model);
            }
            Err(e @ FitError::TooFewSamples { .. }) => {
                debug!("{}; using IDW", e);
                self.model = None;
            }
            Err(e) => {
                warn!("Rejected quadratic fit: {}", e);
            }
        }
    }

    fn predict(&self, eye: EyePoint, samples: &[CalibrationSample]) -> Option<ScreenPoint> {
        match &self.model {
            Some(model) => {
                let p = model.evaluate(eye);
                if p.is_finite() {
                    Some(p.clamped())
                } else {
                    None
                }
            }
            None => self.fallback.predict(eye, samples),
        }
    }

    fn reset(&mut self) {
        self.model = None;
    }

    fn name(&self) -> &str {
        "Polynomial"
    }
}
