//! Observations from an external detector pipeline, one JSON datagram per camera frame.
//!
//! Each datagram is either a `FrameObservation` object or `null` when the detector found
//! no face in that frame. A datagram is reported exactly once; polls in between report
//! `Pending` until the source has been silent for `stale_after`.

use anyhow::{Context, Result};
use api::{FrameObservation, Perceived, PerceptionAdapter};
use log::{info, warn};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

pub struct UdpPerception {
    socket: Option<UdpSocket>,
    bind_address: String,
    stale_after: Duration,
    last_packet: Option<Instant>,
    reported_lost: bool,
    buf: Vec<u8>,
}

impl UdpPerception {
    pub fn new(bind_address: String, stale_after: Duration) -> Self {
        Self {
            socket: None,
            bind_address,
            stale_after,
            last_packet: None,
            reported_lost: false,
            buf: vec![0u8; 65535],
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn parse(&self, amt: usize, src: SocketAddr) -> Option<Option<FrameObservation>> {
        match serde_json::from_slice::<Option<FrameObservation>>(&self.buf[..amt]) {
            Ok(obs) => Some(obs),
            Err(e) => {
                warn!("Discarding malformed observation from {}: {}", src, e);
                None
            }
        }
    }
}

impl PerceptionAdapter for UdpPerception {
    fn initialize(&mut self) -> Result<()> {
        info!("Initializing UDP perception on {}...", self.bind_address);
        let socket = UdpSocket::bind(&self.bind_address)
            .with_context(|| format!("Failed to bind UDP socket on {}", self.bind_address))?;
        socket
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;
        self.socket = Some(socket);
        info!("UDP perception listening on {:?}", self.local_addr());
        Ok(())
    }

    /// Drains everything queued on the socket and reports only the freshest frame.
    fn poll(&mut self) -> Result<Perceived> {
        let mut freshest = None;
        loop {
            let Some(socket) = &self.socket else {
                return Ok(Perceived::Pending);
            };
            match socket.recv_from(&mut self.buf) {
                Ok((amt, src)) => {
                    if let Some(obs) = self.parse(amt, src) {
                        freshest = Some(obs);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e).context("Failed to receive observation"),
            }
        }

        if let Some(obs) = freshest {
            self.last_packet = Some(Instant::now());
            self.reported_lost = obs.is_none();
            return Ok(obs.map_or(Perceived::NoFace, Perceived::Face));
        }

        match self.last_packet {
            Some(at) if at.elapsed() <= self.stale_after => Ok(Perceived::Pending),
            _ if !self.reported_lost => {
                self.reported_lost = true;
                Ok(Perceived::NoFace)
            }
            _ => Ok(Perceived::Pending),
        }
    }

    fn unload(&mut self) {
        if self.socket.take().is_some() {
            info!("UDP perception closed");
        }
        self.last_packet = None;
        self.reported_lost = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::feed;
    use api::EyePoint;
    use common::{ControlLoop, TrackerConfig};

    fn observation(x: f32) -> FrameObservation {
        FrameObservation {
            eye: EyePoint::new(x, 0.5),
            left_ear: 0.3,
            right_ear: 0.3,
        }
    }

    fn started(stale_ms: u64) -> (UdpPerception, UdpSocket) {
        let mut perception =
            UdpPerception::new("127.0.0.1:0".to_string(), Duration::from_millis(stale_ms));
        perception.initialize().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.connect(perception.local_addr().unwrap()).unwrap();
        (perception, sender)
    }

    fn settle() {
        std::thread::sleep(Duration::from_millis(20));
    }

    #[test]
    fn silent_source_reports_lost_once() {
        let (mut perception, _sender) = started(500);
        assert_eq!(perception.poll().unwrap(), Perceived::NoFace);
        assert_eq!(perception.poll().unwrap(), Perceived::Pending);
    }

    #[test]
    fn keeps_only_the_freshest_frame() {
        let (mut perception, sender) = started(500);
        for x in [0.1, 0.2, 0.3] {
            sender.send(&serde_json::to_vec(&observation(x)).unwrap()).unwrap();
        }
        settle();
        assert_eq!(perception.poll().unwrap(), Perceived::Face(observation(0.3)));
        assert_eq!(perception.poll().unwrap(), Perceived::Pending);
    }

    #[test]
    fn null_datagram_reports_lost_face() {
        let (mut perception, sender) = started(500);
        sender.send(&serde_json::to_vec(&observation(0.4)).unwrap()).unwrap();
        sender.send(b"null").unwrap();
        settle();
        assert_eq!(perception.poll().unwrap(), Perceived::NoFace);
        assert_eq!(perception.poll().unwrap(), Perceived::Pending);
    }

    #[test]
    fn malformed_datagram_is_ignored() {
        let (mut perception, sender) = started(500);
        sender.send(&serde_json::to_vec(&observation(0.6)).unwrap()).unwrap();
        sender.send(b"{ garbage").unwrap();
        settle();
        assert_eq!(perception.poll().unwrap(), Perceived::Face(observation(0.6)));
    }

    #[test]
    fn silent_source_goes_stale() {
        let (mut perception, sender) = started(10);
        sender.send(&serde_json::to_vec(&observation(0.5)).unwrap()).unwrap();
        settle();
        assert_eq!(perception.poll().unwrap(), Perceived::Face(observation(0.5)));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(perception.poll().unwrap(), Perceived::NoFace);
        assert_eq!(perception.poll().unwrap(), Perceived::Pending);
    }

    #[test]
    fn one_closed_frame_polled_twice_is_not_a_blink() {
        let (mut perception, sender) = started(500);
        let mut lp = ControlLoop::new(TrackerConfig::default()).unwrap();

        // The camera runs at half the poll rate; one frame has the left eye shut.
        let ears = [0.35, 0.35, 0.05, 0.35, 0.35, 0.35];
        let mut clicks = Vec::new();
        let mut t = 0.0;
        for ear in ears {
            let frame = FrameObservation {
                eye: EyePoint::new(0.5, 0.5),
                left_ear: ear,
                right_ear: 0.35,
            };
            sender.send(&serde_json::to_vec(&frame).unwrap()).unwrap();
            settle();
            for _ in 0..2 {
                feed(&mut lp, perception.poll().unwrap(), t);
                clicks.extend(lp.render(t).clicks);
                t += 1.0 / 30.0;
            }
        }
        assert!(clicks.is_empty(), "got {:?}", clicks);
        assert!(lp.is_tracking());
    }
}
