use api::ScreenPoint;

use crate::config::SmoothingConfig;
use crate::EuroFilter;

/// Fixed-coefficient exponential smoothing.
#[derive(Debug, Clone, Copy)]
pub struct LerpFilter {
    alpha: f32,
    smoothed: f32,
}

impl LerpFilter {
    pub fn new(alpha: f32, initial: f32) -> Self {
        Self {
            alpha,
            smoothed: initial,
        }
    }

    pub fn filter(&mut self, target: f32) -> f32 {
        if target.is_finite() {
            self.smoothed += (target - self.smoothed) * self.alpha;
        }
        self.smoothed
    }

    pub fn value(&self) -> f32 {
        self.smoothed
    }

    pub fn reset_to(&mut self, value: f32) {
        self.smoothed = value;
    }
}

/// One smoothed scalar channel, either filter kind.
#[derive(Debug, Clone, Copy)]
pub enum AxisFilter {
    Lerp(LerpFilter),
    OneEuro(EuroFilter),
}

impl AxisFilter {
    pub fn from_config(config: &SmoothingConfig, initial: f32) -> Self {
        match *config {
            SmoothingConfig::Lerp { alpha } => Self::Lerp(LerpFilter::new(alpha, initial)),
            SmoothingConfig::OneEuro {
                min_cutoff,
                beta,
                d_cutoff,
                frequency,
            } => Self::OneEuro(EuroFilter::new_with_config(
                min_cutoff, beta, d_cutoff, frequency,
            )),
        }
    }

    pub fn filter(&mut self, target: f32, t: f64) -> f32 {
        match self {
            Self::Lerp(f) => f.filter(target),
            Self::OneEuro(f) => f.filter_at(target, t),
        }
    }

    pub fn reset_to(&mut self, value: f32, t: f64) {
        match self {
            Self::Lerp(f) => f.reset_to(value),
            Self::OneEuro(f) => f.reset_to(value, t),
        }
    }
}

/// Smooths a screen-space target independently per axis.
#[derive(Debug, Clone)]
pub struct CursorSmoother {
    x: AxisFilter,
    y: AxisFilter,
    current: ScreenPoint,
}

impl CursorSmoother {
    pub fn new(config: &SmoothingConfig) -> Self {
        let start = ScreenPoint::CENTER;
        Self {
            x: AxisFilter::from_config(config, start.x),
            y: AxisFilter::from_config(config, start.y),
            current: start,
        }
    }

    pub fn smooth(&mut self, target: ScreenPoint, t: f64) -> ScreenPoint {
        self.current = ScreenPoint {
            x: self.x.filter(target.x, t),
            y: self.y.filter(target.y, t),
        };
        self.current
    }

    pub fn current(&self) -> ScreenPoint {
        self.current
    }

    /// Jumps straight to `point`, discarding any smoothing lag.
    pub fn snap(&mut self, point: ScreenPoint, t: f64) {
        self.x.reset_to(point.x, t);
        self.y.reset_to(point.y, t);
        self.current = point;
    }
}
