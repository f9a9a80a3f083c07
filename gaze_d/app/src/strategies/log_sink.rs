use anyhow::Result;
use api::{CalibrationPhaseTag, Eye, PresentationFrame, PresentationSink};
use log::{debug, info, trace};
use std::cell::Cell;

/// Headless sink: reports clicks and state transitions through the logger.
pub struct LogSink {
    click_hold_s: f64,
    last_click: Cell<[Option<f64>; 2]>,
    last_state: Cell<Option<CalibrationPhaseTag>>,
    last_tracking: Cell<Option<bool>>,
}

impl LogSink {
    pub fn new(click_hold_ms: u64) -> Self {
        Self {
            click_hold_s: click_hold_ms as f64 / 1000.0,
            last_click: Cell::new([None; 2]),
            last_state: Cell::new(None),
            last_tracking: Cell::new(None),
        }
    }

    /// Records a click and reports whether it starts a new indicator.
    fn shows_click(&self, eye: Eye, timestamp_s: f64) -> bool {
        let slot = match eye {
            Eye::Left => 0,
            Eye::Right => 1,
        };
        let mut last = self.last_click.get();
        let held = matches!(last[slot], Some(t) if timestamp_s - t < self.click_hold_s);
        if !held {
            last[slot] = Some(timestamp_s);
            self.last_click.set(last);
        }
        !held
    }
}

impl PresentationSink for LogSink {
    fn initialize(&mut self) -> Result<()> {
        info!("Log sink initialized; frames are reported through the logger");
        Ok(())
    }

    fn send(&self, frame: &PresentationFrame) -> Result<()> {
        trace!("Cursor at ({:.1}, {:.1})", frame.cursor.x, frame.cursor.y);

        for click in &frame.clicks {
            if self.shows_click(click.eye, click.timestamp_s) {
                info!(
                    "{} click at ({:.0}, {:.0})",
                    click.eye.as_str(),
                    frame.cursor.x,
                    frame.cursor.y
                );
            } else {
                debug!("{} click inside hold window", click.eye.as_str());
            }
        }

        if self.last_state.replace(Some(frame.calibration_state)) != Some(frame.calibration_state)
        {
            info!("Calibration state: {:?}", frame.calibration_state);
        }
        if self.last_tracking.replace(Some(frame.tracking)) != Some(frame.tracking) {
            info!("Tracking: {}", if frame.tracking { "acquired" } else { "lost" });
        }
        if frame.correction_ack {
            trace!("Correction acknowledged");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicks_inside_hold_are_folded_per_eye() {
        let sink = LogSink::new(150);
        assert!(sink.shows_click(Eye::Left, 1.0));
        assert!(!sink.shows_click(Eye::Left, 1.1));
        assert!(sink.shows_click(Eye::Right, 1.1));
        assert!(sink.shows_click(Eye::Left, 1.2));
    }

    #[test]
    fn send_accepts_any_frame() {
        let mut sink = LogSink::new(0);
        sink.initialize().unwrap();
        assert!(sink.send(&PresentationFrame::default()).is_ok());
    }
}
