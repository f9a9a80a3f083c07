use anyhow::{Context, Result};
use api::PresentationFrame;
use log::{error, info};
use std::net::UdpSocket;

/// Frames differ in a way worth printing: any click, or a move of at least a pixel,
/// or a change in calibration, tracking or acknowledgement.
fn is_news(last: Option<&PresentationFrame>, frame: &PresentationFrame) -> bool {
    let Some(last) = last else {
        return true;
    };
    !frame.clicks.is_empty()
        || (frame.cursor.x - last.cursor.x).abs() >= 1.0
        || (frame.cursor.y - last.cursor.y).abs() >= 1.0
        || frame.calibration_state != last.calibration_state
        || frame.calibration_target != last.calibration_target
        || frame.tracking != last.tracking
        || frame.correction_ack != last.correction_ack
}

fn main() -> Result<()> {
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .map(|p| p.parse::<u16>())
        .transpose()
        .context("Port must be a number")?
        .unwrap_or(9000);
    let addr = format!("0.0.0.0:{}", port);
    let socket = UdpSocket::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;

    println!("Listening for gaze frames on {}...", addr);

    let mut buf = [0u8; 65535];
    let mut last_frame: Option<PresentationFrame> = None;

    loop {
        match socket.recv_from(&mut buf) {
            Ok((amt, src)) => {
                let slice = &buf[..amt];
                match serde_json::from_slice::<PresentationFrame>(slice) {
                    Ok(frame) => {
                        for click in &frame.clicks {
                            println!(
                                "{} click at ({:.0}, {:.0})",
                                click.eye.as_str(),
                                frame.cursor.x,
                                frame.cursor.y
                            );
                        }
                        if is_news(last_frame.as_ref(), &frame) {
                            info!("Frame from {}: {:?}", src, frame);
                            println!(
                                "cursor ({:7.1}, {:7.1}) {:?} {:>3.0}% tracking={} ack={}",
                                frame.cursor.x,
                                frame.cursor.y,
                                frame.calibration_state,
                                frame.calibration_progress * 100.0,
                                frame.tracking,
                                frame.correction_ack
                            );
                            last_frame = Some(frame);
                        }
                    }
                    Err(e) => {
                        eprintln!("Failed to deserialize packet from {}: {}", src, e);
                        if let Ok(s) = std::str::from_utf8(slice) {
                            eprintln!("Raw data: {}", s);
                        }
                    }
                }
            }
            Err(e) => {
                error!("Error receiving data: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{ClickEvent, Eye, PixelPoint};

    #[test]
    fn small_jitter_is_not_news() {
        let a = PresentationFrame {
            cursor: PixelPoint { x: 100.0, y: 100.0 },
            ..Default::default()
        };
        let mut b = a.clone();
        b.cursor.x += 0.4;
        assert!(is_news(None, &a));
        assert!(!is_news(Some(&a), &b));

        b.clicks.push(ClickEvent {
            eye: Eye::Right,
            timestamp_s: 2.0,
        });
        assert!(is_news(Some(&a), &b));
    }
}
