//! Structured calibration, live correction and ownership of the calibration set.

use api::{CalibrationSample, EyePoint, ScreenPoint};
use log::{debug, info, warn};

use crate::calibration::{CalibrationState, CapturePhase, CaptureWindow};
use crate::config::{CalibrationConfig, CapturePolicy, MapperConfig};
use crate::mapping::{create_mapper, residual_rms, GazeMapper};
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalibrationAction {
    EndDwell { target: usize },
    EndSampling { target: usize },
}

pub struct CalibrationManager {
    config: CalibrationConfig,
    targets: Vec<ScreenPoint>,
    state: CalibrationState,
    samples: Vec<CalibrationSample>,
    scheduler: Scheduler<CalibrationAction>,
    window: CaptureWindow,
    latest_eye: Option<EyePoint>,
    mapper: Box<dyn GazeMapper>,
    revision: u64,
    residual: Option<f32>,
}

impl CalibrationManager {
    pub fn new(config: &CalibrationConfig, mapper: &MapperConfig) -> Self {
        Self::with_mapper(config, create_mapper(mapper))
    }

    pub fn with_mapper(config: &CalibrationConfig, mapper: Box<dyn GazeMapper>) -> Self {
        Self {
            targets: config.layout.targets(config.margin),
            config: config.clone(),
            state: CalibrationState::NotStarted,
            samples: Vec::new(),
            scheduler: Scheduler::new(),
            window: CaptureWindow::default(),
            latest_eye: None,
            mapper,
            revision: 0,
            residual: None,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    pub fn targets(&self) -> &[ScreenPoint] {
        &self.targets
    }

    /// Bumped on every change to the calibration set.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn residual_rms(&self) -> Option<f32> {
        self.residual
    }

    pub fn mapper_name(&self) -> &str {
        self.mapper.name()
    }

    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    pub fn current_target(&self) -> Option<ScreenPoint> {
        match self.state {
            CalibrationState::InProgress { target, .. } => self.targets.get(target).copied(),
            _ => None,
        }
    }

    pub fn progress(&self) -> f32 {
        match self.state {
            CalibrationState::NotStarted => 0.0,
            CalibrationState::InProgress { .. } => {
                if self.targets.is_empty() {
                    0.0
                } else {
                    self.samples.len() as f32 / self.targets.len() as f32
                }
            }
            CalibrationState::Finished => 1.0,
        }
    }

    /// Begins (or restarts) structured calibration. The previous set is discarded.
    pub fn start(&mut self, now_s: f64) {
        self.scheduler.cancel_all();
        self.window.clear();
        self.latest_eye = None;
        self.samples.clear();
        self.mapper.reset();
        self.residual = None;
        self.revision += 1;

        info!(
            "Calibration started: {} targets, {}ms dwell, {:?}",
            self.targets.len(),
            self.config.dwell_ms,
            self.config.capture
        );
        self.enter_target(0, now_s);
    }

    /// Abandons a structured calibration in progress.
    pub fn cancel(&mut self) {
        if !self.state.is_in_progress() {
            return;
        }
        self.scheduler.cancel_all();
        self.window.clear();
        self.latest_eye = None;
        self.samples.clear();
        self.revision += 1;
        self.state = CalibrationState::NotStarted;
        info!("Calibration cancelled");
    }

    /// Runs every deferred step that has come due. Follow-on steps are timed from the
    /// due time of the step that scheduled them, so a late tick does not stretch them.
    pub fn tick(&mut self, now_s: f64) {
        loop {
            let due = self.scheduler.take_due(now_s);
            if due.is_empty() {
                break;
            }
            for (due_s, action) in due {
                match action {
                    CalibrationAction::EndDwell { target } => self.end_dwell(target, due_s),
                    CalibrationAction::EndSampling { target } => self.end_sampling(target, due_s),
                }
            }
        }
    }

    /// Feeds the live eye position.
    pub fn observe(&mut self, eye: EyePoint, now_s: f64) {
        if !eye.is_finite() {
            self.latest_eye = None;
            return;
        }
        self.latest_eye = Some(eye);

        if let CalibrationState::InProgress {
            phase: CapturePhase::Sampling,
            ..
        } = self.state
        {
            if let CapturePolicy::Averaged { sample_hz, .. } = self.config.capture {
                self.window.push(eye, now_s, sample_hz);
            }
        }
    }

    /// The current frame had no usable eye reading.
    pub fn observe_lost(&mut self) {
        self.latest_eye = None;
    }

    /// Pairs the current target with the latest eye reading when awaiting confirmation.
    pub fn confirm_target(&mut self, now_s: f64) -> bool {
        let CalibrationState::InProgress {
            target,
            phase: CapturePhase::AwaitingConfirm,
        } = self.state
        else {
            return false;
        };

        let screen = self.targets[target];
        let eye = self.latest_eye.unwrap_or_else(|| {
            warn!("No eye reading for target {}; substituting target position", target);
            EyePoint::new(screen.x, screen.y)
        });
        self.record(target, eye);
        self.advance(target, now_s);
        true
    }

    /// Live correction: the user asserts the gaze was really at `screen`.
    pub fn add_correction(&mut self, eye: EyePoint, screen: ScreenPoint) -> bool {
        if self.state.is_in_progress() {
            debug!("Ignoring correction during structured calibration");
            return false;
        }
        let sample = CalibrationSample::new(eye, screen.clamped());
        if !sample.is_finite() {
            return false;
        }

        self.samples.push(sample);
        self.state = CalibrationState::Finished;
        self.rebuild();
        info!(
            "Correction added at ({:.3}, {:.3}); {} samples",
            screen.x,
            screen.y,
            self.samples.len()
        );
        true
    }

    /// Empties the calibration set and forgets cached mapper parameters.
    pub fn clear(&mut self) {
        self.scheduler.cancel_all();
        self.window.clear();
        self.latest_eye = None;
        self.samples.clear();
        self.mapper.reset();
        self.residual = None;
        self.revision += 1;
        self.state = CalibrationState::NotStarted;
        info!("Calibration cleared");
    }

    /// Replaces the set with previously persisted samples.
    pub fn import_samples(&mut self, samples: Vec<CalibrationSample>) {
        self.scheduler.cancel_all();
        self.window.clear();

        let total = samples.len();
        self.samples = samples.into_iter().filter(|s| s.is_finite()).collect();
        if self.samples.len() != total {
            warn!(
                "Dropped {} non-finite calibration samples",
                total - self.samples.len()
            );
        }

        if self.samples.is_empty() {
            self.mapper.reset();
            self.residual = None;
            self.revision += 1;
            self.state = CalibrationState::NotStarted;
        } else {
            self.state = CalibrationState::Finished;
            self.rebuild();
        }
        info!("Imported {} calibration samples", self.samples.len());
    }

    /// Maps `eye` through the active strategy once calibration is finished.
    pub fn predict(&self, eye: EyePoint) -> Option<ScreenPoint> {
        if !self.state.is_finished() {
            return None;
        }
        let p = self.mapper.predict(eye, &self.samples);
        #[cfg(feature = "xtralog")]
        log::trace!("{} mapped {:?} -> {:?}", self.mapper.name(), eye, p);
        p
    }

    fn enter_target(&mut self, target: usize, now_s: f64) {
        if target >= self.targets.len() {
            self.finish();
            return;
        }
        self.state = CalibrationState::InProgress {
            target,
            phase: CapturePhase::Dwell,
        };
        self.scheduler.schedule_at(
            now_s + ms_to_s(self.config.dwell_ms),
            CalibrationAction::EndDwell { target },
        );
        debug!("Calibration target {} at {:?}", target, self.targets[target]);
    }

    fn end_dwell(&mut self, target: usize, now_s: f64) {
        if self.state
            != (CalibrationState::InProgress {
                target,
                phase: CapturePhase::Dwell,
            })
        {
            return;
        }

        match self.config.capture {
            CapturePolicy::Averaged { window_ms, .. } => {
                self.window.clear();
                self.state = CalibrationState::InProgress {
                    target,
                    phase: CapturePhase::Sampling,
                };
                self.scheduler.schedule_at(
                    now_s + ms_to_s(window_ms),
                    CalibrationAction::EndSampling { target },
                );
            }
            CapturePolicy::Confirm => {
                self.state = CalibrationState::InProgress {
                    target,
                    phase: CapturePhase::AwaitingConfirm,
                };
            }
        }
    }

    fn end_sampling(&mut self, target: usize, now_s: f64) {
        if self.state
            != (CalibrationState::InProgress {
                target,
                phase: CapturePhase::Sampling,
            })
        {
            return;
        }

        let screen = self.targets[target];
        let eye = match self.window.average() {
            Some(eye) => {
                debug!(
                    "Target {}: averaged {} readings -> ({:.4}, {:.4})",
                    target,
                    self.window.len(),
                    eye.x,
                    eye.y
                );
                eye
            }
            None => {
                warn!("Target {}: no eye readings captured; substituting target position", target);
                EyePoint::new(screen.x, screen.y)
            }
        };
        self.window.clear();
        self.record(target, eye);
        self.advance(target, now_s);
    }

    fn record(&mut self, target: usize, eye: EyePoint) {
        self.samples
            .push(CalibrationSample::new(eye, self.targets[target]));
        self.revision += 1;
    }

    fn advance(&mut self, target: usize, now_s: f64) {
        self.enter_target(target + 1, now_s);
    }

    fn finish(&mut self) {
        self.scheduler.cancel_all();
        self.state = CalibrationState::Finished;
        self.rebuild();
        match self.residual {
            Some(rms) => info!(
                "Calibration complete: {} samples, {} mapper, RMS error {:.4}",
                self.samples.len(),
                self.mapper.name(),
                rms
            ),
            None => info!("Calibration complete: {} samples", self.samples.len()),
        }
    }

    fn rebuild(&mut self) {
        self.mapper.rebuild(&self.samples);
        self.residual = residual_rms(self.mapper.as_ref(), &self.samples);
        self.revision += 1;
    }
}

fn ms_to_s(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
