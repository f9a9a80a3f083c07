//! Per-eye blink state machine.
//!
//! `Open -> Closing -> Closed -> Cooldown -> Open`, driven by an eye-aspect-ratio
//! proxy compared against a fixed threshold once per frame.

use api::{ClickEvent, Eye};
use log::{debug, trace};

use crate::config::BlinkConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    Open,
    Closing,
    Closed,
    Cooldown,
}

#[derive(Debug, Clone)]
pub struct BlinkDetector {
    eye: Eye,
    config: BlinkConfig,
    state: BlinkState,
    frames: u32,
    /// Cleared after a squint timeout until the eye is seen open again.
    armed: bool,
}

impl BlinkDetector {
    pub fn new(eye: Eye, config: BlinkConfig) -> Self {
        Self {
            eye,
            config,
            state: BlinkState::Open,
            frames: 0,
            armed: true,
        }
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn eye(&self) -> Eye {
        self.eye
    }

    /// Advances one frame. Returns a click when a complete blink has just ended.
    pub fn update(&mut self, ear: f32, timestamp_s: f64) -> Option<ClickEvent> {
        // NaN compares false, so an unreadable eye counts as closed.
        let below = !(ear >= self.config.ear_threshold);
        trace!("{} EAR {:.3} state {:?}", self.eye.as_str(), ear, self.state);

        match self.state {
            BlinkState::Open => {
                if !self.armed {
                    if !below {
                        self.armed = true;
                    }
                    return None;
                }
                if below {
                    self.state = BlinkState::Closing;
                    self.frames = 1;
                }
                None
            }
            BlinkState::Closing => {
                if below {
                    self.frames += 1;
                    if self.frames >= self.config.min_closing_frames {
                        self.state = BlinkState::Closed;
                    }
                } else {
                    debug!("{} eye: closure of {} frame(s) rejected", self.eye.as_str(), self.frames);
                    self.to_open();
                }
                None
            }
            BlinkState::Closed => {
                if below {
                    self.frames += 1;
                    if self.frames > self.config.squint_timeout_frames {
                        debug!(
                            "{} eye: closed for {} frames, treating as squint",
                            self.eye.as_str(),
                            self.frames
                        );
                        self.to_open();
                        self.armed = false;
                    }
                    return None;
                }

                debug!("{} eye blink after {} frames", self.eye.as_str(), self.frames);
                if self.config.cooldown_frames == 0 {
                    self.to_open();
                } else {
                    self.state = BlinkState::Cooldown;
                    self.frames = 0;
                }
                Some(ClickEvent {
                    eye: self.eye,
                    timestamp_s,
                })
            }
            BlinkState::Cooldown => {
                self.frames += 1;
                if self.frames >= self.config.cooldown_frames {
                    self.to_open();
                }
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.to_open();
        self.armed = true;
    }

    fn to_open(&mut self) {
        self.state = BlinkState::Open;
        self.frames = 0;
    }
}

/// The two independent per-eye detectors.
#[derive(Debug, Clone)]
pub struct BlinkPair {
    pub left: BlinkDetector,
    pub right: BlinkDetector,
}

impl BlinkPair {
    pub fn new(config: &BlinkConfig) -> Self {
        Self {
            left: BlinkDetector::new(Eye::Left, config.clone()),
            right: BlinkDetector::new(Eye::Right, config.clone()),
        }
    }

    pub fn update(&mut self, left_ear: f32, right_ear: f32, timestamp_s: f64) -> Vec<ClickEvent> {
        self.left
            .update(left_ear, timestamp_s)
            .into_iter()
            .chain(self.right.update(right_ear, timestamp_s))
            .collect()
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
