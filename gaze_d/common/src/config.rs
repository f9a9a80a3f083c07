use api::{ScreenGeometry, ScreenPoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("smoothing alpha must be in (0, 1), got {0}")]
    Alpha(f32),
    #[error("one-euro parameter `{0}` must be positive, got {1}")]
    EuroParameter(&'static str, f32),
    #[error("screen geometry must be non-zero, got {0}x{1}")]
    Screen(u32, u32),
    #[error("mapper parameter `{0}` is out of range: {1}")]
    Mapper(&'static str, f32),
    #[error("blink parameter `{0}` is out of range")]
    Blink(&'static str),
    #[error("calibration layout has no targets")]
    EmptyLayout,
    #[error("calibration parameter `{0}` is out of range")]
    Calibration(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum SmoothingConfig {
    #[serde(alias = "lerp")]
    Lerp { alpha: f32 },
    #[serde(alias = "one_euro", alias = "euro")]
    OneEuro {
        min_cutoff: f32,
        beta: f32,
        d_cutoff: f32,
        frequency: f32,
    },
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self::OneEuro {
            min_cutoff: 1.0,
            beta: 0.5,
            d_cutoff: 1.0,
            frequency: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MapperStrategy {
    #[serde(alias = "linear", alias = "MinMax")]
    Linear,
    #[default]
    #[serde(alias = "idw", alias = "Knn")]
    Idw,
    #[serde(alias = "polynomial", alias = "Quadratic")]
    Polynomial,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapperConfig {
    pub strategy: MapperStrategy,
    /// Fraction of the eye-space range added on each side of the linear bounding box.
    pub padding: f32,
    /// Compensates for a horizontally mirrored camera image.
    pub mirror_x: bool,
    pub k: usize,
    pub power: f32,
    pub snap_threshold: f32,
    pub epsilon: f32,
    pub fallback_sensitivity: f32,
    pub min_samples: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            strategy: MapperStrategy::default(),
            padding: 0.05,
            mirror_x: false,
            k: 4,
            power: 2.0,
            snap_threshold: 0.01,
            epsilon: 1e-6,
            fallback_sensitivity: 1.0,
            min_samples: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlinkConfig {
    pub ear_threshold: f32,
    pub min_closing_frames: u32,
    pub squint_timeout_frames: u32,
    pub cooldown_frames: u32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.22,
            min_closing_frames: 2,
            squint_timeout_frames: 10,
            cooldown_frames: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum TargetLayout {
    #[default]
    #[serde(alias = "grid", alias = "3x3")]
    Grid3x3,
    #[serde(alias = "five")]
    FivePoint,
    Custom(Vec<ScreenPoint>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum CapturePolicy {
    Averaged { window_ms: u64, sample_hz: f32 },
    Confirm,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self::Averaged {
            window_ms: 1000,
            sample_hz: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    pub layout: TargetLayout,
    /// Inset of grid layouts from the screen edges, normalized.
    pub margin: f32,
    pub dwell_ms: u64,
    pub capture: CapturePolicy,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            layout: TargetLayout::default(),
            margin: 0.1,
            dwell_ms: 2000,
            capture: CapturePolicy::default(),
        }
    }
}

/// What the blink detectors see while the adapter reports no detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LostTrackingPolicy {
    #[default]
    Freeze,
    TreatAsClosed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub screen: ScreenGeometry,
    pub smoothing: SmoothingConfig,
    pub mapper: MapperConfig,
    pub blink: BlinkConfig,
    pub calibration: CalibrationConfig,
    pub correction_ack_ms: u64,
    pub lost_tracking: LostTrackingPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            screen: ScreenGeometry::default(),
            smoothing: SmoothingConfig::default(),
            mapper: MapperConfig::default(),
            blink: BlinkConfig::default(),
            calibration: CalibrationConfig::default(),
            correction_ack_ms: 300,
            lost_tracking: LostTrackingPolicy::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::Screen(self.screen.width, self.screen.height));
        }

        match self.smoothing {
            SmoothingConfig::Lerp { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(ConfigError::Alpha(alpha));
                }
            }
            SmoothingConfig::OneEuro {
                min_cutoff,
                beta,
                d_cutoff,
                frequency,
            } => {
                for (name, value) in [
                    ("min_cutoff", min_cutoff),
                    ("d_cutoff", d_cutoff),
                    ("frequency", frequency),
                ] {
                    if !(value > 0.0) {
                        return Err(ConfigError::EuroParameter(name, value));
                    }
                }
                if !(beta >= 0.0) {
                    return Err(ConfigError::EuroParameter("beta", beta));
                }
            }
        }

        let m = &self.mapper;
        if !(m.padding >= 0.0) {
            return Err(ConfigError::Mapper("padding", m.padding));
        }
        if m.k == 0 {
            return Err(ConfigError::Mapper("k", 0.0));
        }
        if !(m.power > 0.0) {
            return Err(ConfigError::Mapper("power", m.power));
        }
        if !(m.snap_threshold >= 0.0) {
            return Err(ConfigError::Mapper("snap_threshold", m.snap_threshold));
        }
        if !(m.epsilon > 0.0) {
            return Err(ConfigError::Mapper("epsilon", m.epsilon));
        }
        if m.min_samples < 6 {
            return Err(ConfigError::Mapper("min_samples", m.min_samples as f32));
        }

        let b = &self.blink;
        if !(b.ear_threshold > 0.0) {
            return Err(ConfigError::Blink("ear_threshold"));
        }
        if b.min_closing_frames == 0 {
            return Err(ConfigError::Blink("min_closing_frames"));
        }
        if b.squint_timeout_frames < b.min_closing_frames {
            return Err(ConfigError::Blink("squint_timeout_frames"));
        }

        let c = &self.calibration;
        if let TargetLayout::Custom(points) = &c.layout {
            if points.is_empty() {
                return Err(ConfigError::EmptyLayout);
            }
        }
        if !(0.0..0.5).contains(&c.margin) {
            return Err(ConfigError::Calibration("margin"));
        }
        if let CapturePolicy::Averaged { window_ms, sample_hz } = c.capture {
            if window_ms == 0 {
                return Err(ConfigError::Calibration("window_ms"));
            }
            if !(sample_hz > 0.0) {
                return Err(ConfigError::Calibration("sample_hz"));
            }
        }

        Ok(())
    }
}
