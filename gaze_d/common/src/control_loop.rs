use api::{
    CalibrationSample, ClickEvent, EyePoint, FrameObservation, PixelPoint, PresentationFrame,
    ScreenPoint,
};
use log::{debug, info};

use crate::blink::BlinkPair;
use crate::calibration::CalibrationState;
use crate::calibration_manager::CalibrationManager;
use crate::config::{ConfigError, LostTrackingPolicy, TrackerConfig};
use crate::smoothing::CursorSmoother;

/// Per-frame orchestration of blink detection, calibration, mapping and smoothing.
///
/// `update` is the perception step and `render` the display step; they may run at
/// different rates and share only `target`, which `update` writes in one assignment.
pub struct ControlLoop {
    pub config: TrackerConfig,
    calibration: CalibrationManager,
    blinks: BlinkPair,
    smoother: CursorSmoother,
    target: ScreenPoint,
    pending_clicks: Vec<ClickEvent>,
    last_eye: Option<EyePoint>,
    tracking: bool,
    ack_until_s: Option<f64>,
}

impl ControlLoop {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calibration: CalibrationManager::new(&config.calibration, &config.mapper),
            blinks: BlinkPair::new(&config.blink),
            smoother: CursorSmoother::new(&config.smoothing),
            target: ScreenPoint::CENTER,
            pending_clicks: Vec::new(),
            last_eye: None,
            tracking: false,
            ack_until_s: None,
            config,
        })
    }

    pub fn calibration(&self) -> &CalibrationManager {
        &self.calibration
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    pub fn samples(&self) -> &[CalibrationSample] {
        self.calibration.samples()
    }

    pub fn target(&self) -> ScreenPoint {
        self.target
    }

    pub fn cursor(&self) -> ScreenPoint {
        self.smoother.current()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Advances calibration timing when no new camera frame arrived.
    pub fn tick(&mut self, now_s: f64) {
        self.calibration.tick(now_s);
    }

    /// Perception step: consume one frame's observation (or its absence).
    pub fn update(&mut self, observation: Option<FrameObservation>, now_s: f64) {
        self.calibration.tick(now_s);

        let Some(obs) = observation else {
            if self.tracking {
                debug!("Tracking lost");
            }
            self.tracking = false;
            self.calibration.observe_lost();
            if self.config.lost_tracking == LostTrackingPolicy::TreatAsClosed {
                let clicks = self.blinks.update(0.0, 0.0, now_s);
                self.pending_clicks.extend(clicks);
            }
            return;
        };

        if !self.tracking {
            debug!("Tracking acquired");
        }
        self.tracking = true;

        let clicks = self.blinks.update(obs.left_ear, obs.right_ear, now_s);
        for click in &clicks {
            info!("{} click at {:.3}s", click.eye.as_str(), click.timestamp_s);
        }
        self.pending_clicks.extend(clicks);

        if !obs.eye.is_finite() {
            self.last_eye = None;
            self.calibration.observe_lost();
            return;
        }
        self.last_eye = Some(obs.eye);
        self.calibration.observe(obs.eye, now_s);

        if let Some(p) = self.calibration.predict(obs.eye) {
            self.target = p;
        }
    }

    /// Display step: smooth toward the current target and build the outgoing frame.
    pub fn render(&mut self, now_s: f64) -> PresentationFrame {
        let cursor = self.smoother.smooth(self.target, now_s);

        let correction_ack = match self.ack_until_s {
            Some(until) if now_s < until => true,
            Some(_) => {
                self.ack_until_s = None;
                false
            }
            None => false,
        };

        PresentationFrame {
            cursor: self.config.screen.to_pixels(cursor),
            clicks: std::mem::take(&mut self.pending_clicks),
            calibration_state: self.calibration.state().tag(),
            calibration_progress: self.calibration.progress(),
            calibration_target: self.calibration.current_target(),
            correction_ack,
            tracking: self.tracking,
        }
    }

    /// Both steps at a single cadence.
    pub fn step(&mut self, observation: Option<FrameObservation>, now_s: f64) -> PresentationFrame {
        self.update(observation, now_s);
        self.render(now_s)
    }

    /// A pointer click. With the correction modifier held it becomes a calibration sample
    /// and the cursor jumps to the click position.
    pub fn pointer_click(&mut self, position: PixelPoint, modifier_held: bool, now_s: f64) -> bool {
        if !modifier_held {
            return false;
        }
        let eye = match (self.tracking, self.last_eye) {
            (true, Some(eye)) => eye,
            _ => {
                debug!("Correction ignored: no current eye observation");
                return false;
            }
        };

        let screen = self.config.screen.from_pixels(position);
        if !self.calibration.add_correction(eye, screen) {
            return false;
        }

        self.target = screen;
        self.smoother.snap(screen, now_s);
        self.ack_until_s = Some(now_s + self.config.correction_ack_ms as f64 / 1000.0);
        true
    }

    pub fn start_calibration(&mut self, now_s: f64) {
        self.calibration.start(now_s);
    }

    pub fn cancel_calibration(&mut self) {
        self.calibration.cancel();
    }

    pub fn confirm_target(&mut self, now_s: f64) -> bool {
        self.calibration.confirm_target(now_s)
    }

    pub fn clear_calibration(&mut self) {
        self.calibration.clear();
        self.target = ScreenPoint::CENTER;
    }

    pub fn import_samples(&mut self, samples: Vec<CalibrationSample>) {
        self.calibration.import_samples(samples);
    }
}
