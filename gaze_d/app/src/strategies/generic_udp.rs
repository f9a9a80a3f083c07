use anyhow::{Context, Result};
use api::{PresentationFrame, PresentationSink};
use log::info;
use std::net::UdpSocket;

/// Sends every frame as one JSON datagram.
pub struct GenericUdpSink {
    socket: Option<UdpSocket>,
    target_address: String,
}

impl GenericUdpSink {
    pub fn new(target_address: String) -> Self {
        Self {
            socket: None,
            target_address,
        }
    }
}

impl PresentationSink for GenericUdpSink {
    fn initialize(&mut self) -> Result<()> {
        info!("Initializing Generic UDP sink...");
        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind UDP socket")?;
        socket
            .connect(&self.target_address)
            .with_context(|| format!("Failed to connect to {}", self.target_address))?;
        socket
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;

        self.socket = Some(socket);
        info!("Generic UDP sink initialized. Target: {}", self.target_address);
        Ok(())
    }

    fn send(&self, frame: &PresentationFrame) -> Result<()> {
        if let Some(socket) = &self.socket {
            let json_data = serde_json::to_vec(frame)?;
            socket.send(&json_data)?;
        }
        Ok(())
    }
}
