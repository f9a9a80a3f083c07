pub mod generic_udp;
pub mod log_sink;

use anyhow::Result;
use api::{PresentationFrame, PresentationSink};
use generic_udp::GenericUdpSink;
use log_sink::LogSink;

use crate::config::{OutputConfig, OutputMode};

pub enum PresentationBackend {
    Generic(GenericUdpSink),
    Log(LogSink),
}

impl PresentationSink for PresentationBackend {
    fn initialize(&mut self) -> Result<()> {
        match self {
            Self::Generic(s) => s.initialize(),
            Self::Log(s) => s.initialize(),
        }
    }

    fn send(&self, frame: &PresentationFrame) -> Result<()> {
        match self {
            Self::Generic(s) => s.send(frame),
            Self::Log(s) => s.send(frame),
        }
    }
}

pub fn create_strategy(config: &OutputConfig) -> PresentationBackend {
    match config.mode {
        OutputMode::Generic => PresentationBackend::Generic(GenericUdpSink::new(format!(
            "{}:{}",
            config.send_address, config.send_port
        ))),
        OutputMode::Log => PresentationBackend::Log(LogSink::new(config.click_hold_ms)),
    }
}
