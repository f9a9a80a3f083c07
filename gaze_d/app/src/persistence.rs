use common::{CalibrationStore, ControlLoop};
use log::{error, info};
use std::time::{Duration, Instant};

/// Decides when the calibration set is written back to disk.
///
/// A structured calibration is saved the moment it finishes. Other changes (corrections,
/// imports, clears) are saved at most once per `autosave` interval, and whatever is still
/// unsaved goes out on shutdown.
pub struct CalibrationPersistence {
    store: CalibrationStore,
    autosave: Duration,
    was_calibrating: bool,
    saved_revision: u64,
    last_save: Option<Instant>,
}

impl CalibrationPersistence {
    pub fn new(store: CalibrationStore, autosave: Duration) -> Self {
        Self {
            store,
            autosave,
            was_calibrating: false,
            saved_revision: 0,
            last_save: None,
        }
    }

    /// Loads the stored set into the tracker. The loaded state counts as already saved.
    pub fn restore(&mut self, control_loop: &mut ControlLoop) {
        match self.store.load() {
            Ok(Some(samples)) => control_loop.import_samples(samples),
            Ok(None) => info!("No calibration found; starting uncalibrated."),
            Err(e) => error!("Failed to load calibration: {:#}", e),
        }
        self.saved_revision = control_loop.calibration().revision();
    }

    pub fn after_update(&mut self, control_loop: &ControlLoop, now: Instant) {
        let calibration = control_loop.calibration();
        let is_calibrating = calibration.state().is_in_progress();

        if self.was_calibrating && !is_calibrating && calibration.state().is_finished() {
            info!("Calibration finished! Saving to {:?}", self.store.path());
            self.save(control_loop, now);
        } else if !is_calibrating && self.is_dirty(control_loop) {
            let due = match self.last_save {
                Some(last) => now.duration_since(last) >= self.autosave,
                None => true,
            };
            if due {
                self.save(control_loop, now);
            }
        }
        self.was_calibrating = is_calibrating;
    }

    pub fn shutdown(&mut self, control_loop: &ControlLoop) {
        if self.is_dirty(control_loop) && !control_loop.calibration_state().is_in_progress() {
            self.save(control_loop, Instant::now());
        }
    }

    fn is_dirty(&self, control_loop: &ControlLoop) -> bool {
        control_loop.calibration().revision() != self.saved_revision
    }

    fn save(&mut self, control_loop: &ControlLoop, now: Instant) {
        self.last_save = Some(now);
        match self.store.save(control_loop.samples()) {
            Ok(()) => self.saved_revision = control_loop.calibration().revision(),
            Err(e) => error!("Failed to save calibration: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{EyePoint, FrameObservation, PixelPoint, TrackerConfig};
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gaze_d_persist_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("calibration.json")
    }

    fn looking_at_center(lp: &mut ControlLoop, now_s: f64) {
        lp.update(
            Some(FrameObservation {
                eye: EyePoint::new(0.5, 0.5),
                left_ear: 0.3,
                right_ear: 0.3,
            }),
            now_s,
        );
    }

    #[test]
    fn corrections_are_throttled_and_flushed_on_shutdown() {
        let path = temp_file("throttle");
        let mut lp = ControlLoop::new(TrackerConfig::default()).unwrap();
        let mut persistence =
            CalibrationPersistence::new(CalibrationStore::at(&path), Duration::from_secs(30));
        persistence.restore(&mut lp);

        let t0 = Instant::now();
        looking_at_center(&mut lp, 0.0);
        assert!(lp.pointer_click(PixelPoint { x: 100.0, y: 100.0 }, true, 0.0));
        persistence.after_update(&lp, t0);
        let stored = CalibrationStore::at(&path).load().unwrap().unwrap();
        assert_eq!(stored.len(), 1);

        assert!(lp.pointer_click(PixelPoint { x: 200.0, y: 100.0 }, true, 0.1));
        persistence.after_update(&lp, t0 + Duration::from_secs(1));
        assert_eq!(CalibrationStore::at(&path).load().unwrap().unwrap().len(), 1);

        persistence.shutdown(&lp);
        assert_eq!(CalibrationStore::at(&path).load().unwrap().unwrap().len(), 2);

        let mut reloaded = ControlLoop::new(TrackerConfig::default()).unwrap();
        let mut again =
            CalibrationPersistence::new(CalibrationStore::at(&path), Duration::from_secs(30));
        again.restore(&mut reloaded);
        assert_eq!(reloaded.samples(), lp.samples());
        assert!(!again.is_dirty(&reloaded));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn finished_calibration_saves_immediately() {
        let path = temp_file("finish");
        let mut lp = ControlLoop::new(TrackerConfig::default()).unwrap();
        let mut persistence =
            CalibrationPersistence::new(CalibrationStore::at(&path), Duration::from_secs(3600));
        persistence.restore(&mut lp);

        let t0 = Instant::now();
        lp.start_calibration(0.0);
        let mut frame = 0u32;
        while !lp.calibration_state().is_finished() {
            let now_s = frame as f64 / 30.0;
            looking_at_center(&mut lp, now_s);
            persistence.after_update(&lp, t0);
            frame += 1;
            assert!(frame < 30 * 60);
        }

        let stored = CalibrationStore::at(&path).load().unwrap().unwrap();
        assert_eq!(stored.len(), 9);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
