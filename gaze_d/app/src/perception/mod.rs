pub mod simulated;
pub mod udp;

use anyhow::Result;
use api::{Perceived, PerceptionAdapter};
use common::ControlLoop;
use simulated::SimulatedPerception;
use std::time::Duration;
use udp::UdpPerception;

use crate::config::{PerceptionConfig, PerceptionMode};

pub enum PerceptionBackend {
    Udp(UdpPerception),
    Simulated(SimulatedPerception),
}

impl PerceptionAdapter for PerceptionBackend {
    fn initialize(&mut self) -> Result<()> {
        match self {
            Self::Udp(p) => p.initialize(),
            Self::Simulated(p) => p.initialize(),
        }
    }

    fn poll(&mut self) -> Result<Perceived> {
        match self {
            Self::Udp(p) => p.poll(),
            Self::Simulated(p) => p.poll(),
        }
    }

    fn unload(&mut self) {
        match self {
            Self::Udp(p) => p.unload(),
            Self::Simulated(p) => p.unload(),
        }
    }
}

pub fn create_perception(config: &PerceptionConfig) -> PerceptionBackend {
    match config.mode {
        PerceptionMode::Udp => PerceptionBackend::Udp(UdpPerception::new(
            format!("{}:{}", config.listen_address, config.listen_port),
            Duration::from_millis(config.stale_ms),
        )),
        PerceptionMode::Simulated => {
            PerceptionBackend::Simulated(SimulatedPerception::new(config.simulated_fps))
        }
    }
}

/// Hands one poll result to the tracker. A poll with no new frame only advances time.
pub fn feed(control_loop: &mut ControlLoop, perceived: Perceived, now_s: f64) {
    match perceived {
        Perceived::Face(observation) => control_loop.update(Some(observation), now_s),
        Perceived::NoFace => control_loop.update(None, now_s),
        Perceived::Pending => control_loop.tick(now_s),
    }
}
