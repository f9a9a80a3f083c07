use api::{CalibrationPhaseTag, EyePoint, ScreenPoint};

use crate::config::TargetLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// Target shown, user settling; nothing is sampled.
    Dwell,
    /// Eye readings are being collected for averaging.
    Sampling,
    /// Waiting for the user to confirm the fixation.
    AwaitingConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    #[default]
    NotStarted,
    InProgress {
        target: usize,
        phase: CapturePhase,
    },
    Finished,
}

impl CalibrationState {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    pub fn tag(&self) -> CalibrationPhaseTag {
        match self {
            Self::NotStarted => CalibrationPhaseTag::NotStarted,
            Self::InProgress { .. } => CalibrationPhaseTag::InProgress,
            Self::Finished => CalibrationPhaseTag::Finished,
        }
    }
}

impl TargetLayout {
    /// Ordered on-screen target positions, row by row.
    pub fn targets(&self, margin: f32) -> Vec<ScreenPoint> {
        let lo = margin;
        let hi = 1.0 - margin;
        match self {
            Self::Grid3x3 => {
                let steps = [lo, 0.5, hi];
                steps
                    .iter()
                    .flat_map(|&y| steps.iter().map(move |&x| ScreenPoint::new(x, y)))
                    .collect()
            }
            Self::FivePoint => vec![
                ScreenPoint::CENTER,
                ScreenPoint::new(lo, lo),
                ScreenPoint::new(hi, lo),
                ScreenPoint::new(lo, hi),
                ScreenPoint::new(hi, hi),
            ],
            Self::Custom(points) => points.iter().map(|p| p.clamped()).collect(),
        }
    }
}

/// Eye readings gathered for one target, rate-limited to `sample_hz`.
#[derive(Debug, Clone, Default)]
pub struct CaptureWindow {
    readings: Vec<EyePoint>,
    last_s: Option<f64>,
}

impl CaptureWindow {
    pub fn clear(&mut self) {
        self.readings.clear();
        self.last_s = None;
    }

    pub fn push(&mut self, eye: EyePoint, now_s: f64, sample_hz: f32) -> bool {
        let period = 1.0 / sample_hz as f64;
        if let Some(last) = self.last_s {
            if now_s - last < period - 1e-6 {
                return false;
            }
        }
        self.readings.push(eye);
        self.last_s = Some(now_s);
        true
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn average(&self) -> Option<EyePoint> {
        if self.readings.is_empty() {
            return None;
        }
        let n = self.readings.len() as f32;
        let (sx, sy) = self
            .readings
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(EyePoint::new(sx / n, sy / n))
    }
}
