mod config;
mod control;
mod perception;
mod persistence;
mod strategies;

use anyhow::Result;
use api::{Perceived, PerceptionAdapter, PresentationSink};
use common::{CalibrationStore, ControlLoop, TrackerConfig};
use config::DaemonConfig;
use control::{ControlCommand, ControlStatus};
use log::{debug, error, info, trace, warn};
use perception::{create_perception, feed};
use persistence::CalibrationPersistence;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use strategies::create_strategy;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::MissedTickBehavior;

fn load_config(path: &Path) -> Result<DaemonConfig> {
    if path.exists() {
        info!("Loading config from {:?}", path);
        let file = fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    } else {
        info!("Config not found. Creating default at {:?}", path);
        let config = DaemonConfig::default();
        let file = fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &config)?;
        Ok(config)
    }
}

/// Rate limiter for warnings that would otherwise repeat every frame.
fn throttled(cell: &'static std::thread::LocalKey<Cell<Option<Instant>>>, every: Duration) -> bool {
    let now = Instant::now();
    cell.with(|c| match c.get() {
        Some(last) if now.duration_since(last) < every => false,
        _ => {
            c.set(Some(now));
            true
        }
    })
}

thread_local! {
    static LAST_POLL_WARN: Cell<Option<Instant>> = const { Cell::new(None) };
    static LAST_SEND_WARN: Cell<Option<Instant>> = const { Cell::new(None) };
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    info!("Starting...");
    debug!("Debug logging is active");
    trace!("Trace logging is active");

    let config_path = Path::new("config.json");
    let config = load_config(config_path).unwrap_or_else(|e| {
        error!("Failed to load config: {}. Using defaults.", e);
        DaemonConfig::default()
    });
    info!("Loaded Config: {:?}", config);

    let mut control_loop = match ControlLoop::new(config.tracker.clone()) {
        Ok(control_loop) => control_loop,
        Err(e) => {
            error!("Invalid tracker config: {}. Using defaults.", e);
            ControlLoop::new(TrackerConfig::default())?
        }
    };
    info!(
        "Tracker ready: {} mapper, {} calibration targets",
        control_loop.calibration().mapper_name(),
        control_loop.calibration().targets().len()
    );

    let mut persistence = CalibrationPersistence::new(
        CalibrationStore::at(&config.calibration_file),
        Duration::from_secs(config.autosave_secs),
    );
    persistence.restore(&mut control_loop);

    let mut perception = create_perception(&config.perception);
    if let Err(e) = perception.initialize() {
        error!("Failed to initialize perception: {}", e);
        return Err(e);
    }
    info!("Perception initialized with {:?} source.", config.perception.mode);

    let mut sink = create_strategy(&config.output);
    if let Err(e) = sink.initialize() {
        error!("Failed to initialize presentation sink: {}", e);
        return Err(e);
    }
    info!("Presentation initialized with {:?} Strategy.", config.output.mode);

    let (command_tx, mut command_rx) = unbounded_channel::<ControlCommand>();
    let status = Arc::new(RwLock::new(ControlStatus::default()));
    let router = control::get_router(command_tx, status.clone());
    let control_port = config.control_port;
    tokio::spawn(async move {
        if let Err(e) = control::serve(control_port, router).await {
            error!("Control surface failed: {}", e);
        }
    });

    let mut update_tick = tokio::time::interval(Duration::from_secs_f64(config.update_period_s()));
    update_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut display_tick =
        tokio::time::interval(Duration::from_secs_f64(config.display_period_s()));
    display_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering Main Loop...");

    let clock = Instant::now();
    let mut frame_count: u64 = 0;
    let mut log_interval: u64 = 1000;
    let mut last_log = Instant::now();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received Ctrl-C, shutting down...");
                break;
            }
            _ = update_tick.tick() => {
                let perceived = match perception.poll() {
                    Ok(perceived) => perceived,
                    Err(e) => {
                        if throttled(&LAST_POLL_WARN, Duration::from_secs(5)) {
                            warn!("Perception poll failed: {:#}", e);
                        }
                        Perceived::NoFace
                    }
                };
                let new_frame = perceived != Perceived::Pending;
                feed(&mut control_loop, perceived, clock.elapsed().as_secs_f64());
                persistence.after_update(&control_loop, Instant::now());
                if !new_frame {
                    continue;
                }

                frame_count += 1;
                if frame_count.is_multiple_of(log_interval) {
                    let elapsed = last_log.elapsed().as_secs_f32();
                    let fps = log_interval as f32 / elapsed;
                    info!(
                        "Tracking Active: Processed {} frames (approx {:.1} FPS)",
                        frame_count, fps
                    );
                    last_log = Instant::now();

                    if frame_count >= 1_000_000 {
                        log_interval = 1_000_000;
                    } else if frame_count >= 100_000 {
                        log_interval = 100_000;
                    } else if frame_count >= 10_000 {
                        log_interval = 10_000;
                    }
                }
            }
            _ = display_tick.tick() => {
                let frame = control_loop.render(clock.elapsed().as_secs_f64());
                if let Err(e) = sink.send(&frame) {
                    if throttled(&LAST_SEND_WARN, Duration::from_secs(5)) {
                        warn!("Failed to send frame: {:#}", e);
                    }
                }
                if let Ok(mut st) = status.write() {
                    st.refresh(&control_loop, frame.cursor);
                }
            }
            Some(command) = command_rx.recv() => {
                debug!("Control command: {:?}", command);
                if !command.apply(&mut control_loop, clock.elapsed().as_secs_f64()) {
                    debug!("Control command had no effect");
                }
                persistence.after_update(&control_loop, Instant::now());
            }
        }
    }

    persistence.shutdown(&control_loop);
    perception.unload();
    info!("Shut down after {} frames", frame_count);
    Ok(())
}
