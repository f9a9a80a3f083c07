//! Synthetic observations for demos and for running the daemon without a camera.
//!
//! The gaze traces a slow Lissajous curve around eye-space center. Every few seconds one
//! eye closes for a short blink, alternating left and right.

use anyhow::Result;
use api::{EyePoint, FrameObservation, Perceived, PerceptionAdapter};
use log::info;
use std::f32::consts::TAU;

const OPEN_EAR: f32 = 0.32;
const CLOSED_EAR: f32 = 0.08;
const BLINK_PERIOD_S: f32 = 4.0;
const BLINK_FRAMES: u64 = 4;

pub struct SimulatedPerception {
    fps: f32,
    frame: u64,
}

impl SimulatedPerception {
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 30.0 };
        Self { fps, frame: 0 }
    }

    fn blink_period_frames(&self) -> u64 {
        ((BLINK_PERIOD_S * self.fps) as u64).max(BLINK_FRAMES * 2)
    }

    fn observation_at(&self, frame: u64) -> FrameObservation {
        let t = frame as f32 / self.fps;
        let eye = EyePoint::new(
            0.5 + 0.08 * (TAU * 0.13 * t).sin(),
            0.5 + 0.05 * (TAU * 0.21 * t).sin(),
        );

        let period = self.blink_period_frames();
        let cycle = frame / period;
        let closing = frame % period >= period - BLINK_FRAMES;
        let (left_ear, right_ear) = match (closing, cycle % 2) {
            (true, 0) => (CLOSED_EAR, OPEN_EAR),
            (true, _) => (OPEN_EAR, CLOSED_EAR),
            (false, _) => (OPEN_EAR, OPEN_EAR),
        };

        FrameObservation {
            eye,
            left_ear,
            right_ear,
        }
    }
}

impl PerceptionAdapter for SimulatedPerception {
    fn initialize(&mut self) -> Result<()> {
        info!("Simulated perception running at {} FPS", self.fps);
        self.frame = 0;
        Ok(())
    }

    fn poll(&mut self) -> Result<Perceived> {
        let obs = self.observation_at(self.frame);
        self.frame += 1;
        Ok(Perceived::Face(obs))
    }

    fn unload(&mut self) {
        info!("Simulated perception stopped after {} frames", self.frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BlinkConfig, BlinkPair, Eye};

    fn next_face(sim: &mut SimulatedPerception) -> FrameObservation {
        match sim.poll().unwrap() {
            Perceived::Face(obs) => obs,
            other => panic!("expected a face, got {:?}", other),
        }
    }

    #[test]
    fn gaze_stays_near_center() {
        let mut sim = SimulatedPerception::new(30.0);
        sim.initialize().unwrap();
        for _ in 0..600 {
            let obs = next_face(&mut sim);
            assert!((obs.eye.x - 0.5).abs() <= 0.08 + 1e-6);
            assert!((obs.eye.y - 0.5).abs() <= 0.05 + 1e-6);
        }
    }

    #[test]
    fn replays_identically_after_reinitialize() {
        let mut sim = SimulatedPerception::new(30.0);
        sim.initialize().unwrap();
        let first: Vec<_> = (0..50).map(|_| sim.poll().unwrap()).collect();
        sim.initialize().unwrap();
        let second: Vec<_> = (0..50).map(|_| sim.poll().unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn blinks_alternate_eyes() {
        let mut sim = SimulatedPerception::new(30.0);
        sim.initialize().unwrap();
        let mut blinks = BlinkPair::new(&BlinkConfig::default());

        let mut clicks = Vec::new();
        for frame in 0..(30 * 9) {
            let obs = next_face(&mut sim);
            clicks.extend(blinks.update(obs.left_ear, obs.right_ear, frame as f64 / 30.0));
        }
        let eyes: Vec<Eye> = clicks.iter().map(|c| c.eye).collect();
        assert_eq!(eyes, vec![Eye::Left, Eye::Right]);
    }
}
