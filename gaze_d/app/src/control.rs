//! HTTP control surface. Handlers never touch the tracker directly: they queue a
//! `ControlCommand` for the frame loop and answer from the last published snapshot.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use api::{CalibrationPhaseTag, CalibrationSample, PixelPoint, ScreenPoint};
use common::ControlLoop;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    StartCalibration,
    CancelCalibration,
    ConfirmTarget,
    ClearCalibration,
    ImportSamples(Vec<CalibrationSample>),
    PointerClick { position: PixelPoint, modifier: bool },
}

impl ControlCommand {
    /// Runs the command against the tracker. Returns whether it had any effect.
    pub fn apply(self, control_loop: &mut ControlLoop, now_s: f64) -> bool {
        match self {
            Self::StartCalibration => {
                control_loop.start_calibration(now_s);
                true
            }
            Self::CancelCalibration => {
                let active = control_loop.calibration_state().is_in_progress();
                control_loop.cancel_calibration();
                active
            }
            Self::ConfirmTarget => control_loop.confirm_target(now_s),
            Self::ClearCalibration => {
                control_loop.clear_calibration();
                true
            }
            Self::ImportSamples(samples) => {
                info!("Importing {} calibration samples over HTTP", samples.len());
                control_loop.import_samples(samples);
                true
            }
            Self::PointerClick { position, modifier } => {
                control_loop.pointer_click(position, modifier, now_s)
            }
        }
    }
}

/// What `GET /status` reports; rewritten by the frame loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlStatus {
    pub calibration_state: CalibrationPhaseTag,
    pub calibration_progress: f32,
    pub calibration_target: Option<ScreenPoint>,
    pub tracking: bool,
    pub cursor: PixelPoint,
    pub mapper: String,
    pub sample_count: usize,
    pub residual_rms: Option<f32>,
    pub revision: u64,
    #[serde(skip)]
    pub samples: Vec<CalibrationSample>,
}

impl ControlStatus {
    /// Refreshes the snapshot. The sample list is only copied when the set changed.
    pub fn refresh(&mut self, control_loop: &ControlLoop, cursor: PixelPoint) {
        let calibration = control_loop.calibration();
        self.calibration_state = calibration.state().tag();
        self.calibration_progress = calibration.progress();
        self.calibration_target = calibration.current_target();
        self.tracking = control_loop.is_tracking();
        self.cursor = cursor;
        self.mapper = calibration.mapper_name().to_string();
        self.sample_count = calibration.samples().len();
        self.residual_rms = calibration.residual_rms();
        if self.revision != calibration.revision() || self.samples.len() != self.sample_count {
            self.samples = calibration.samples().to_vec();
            self.revision = calibration.revision();
        }
    }
}

#[derive(Clone)]
struct ControlState {
    commands: UnboundedSender<ControlCommand>,
    status: Arc<RwLock<ControlStatus>>,
}

impl ControlState {
    fn enqueue(&self, command: ControlCommand) -> Json<Value> {
        match self.commands.send(command) {
            Ok(()) => Json(json!({ "status": "queued" })),
            Err(_) => Json(json!({
                "status": "error",
                "message": "Tracker loop is not running"
            })),
        }
    }

    fn snapshot(&self) -> ControlStatus {
        self.status
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

pub fn get_router(
    commands: UnboundedSender<ControlCommand>,
    status: Arc<RwLock<ControlStatus>>,
) -> Router {
    let state = ControlState { commands, status };

    Router::new()
        .route("/status", get(status_handler))
        .route("/calibration/start", post(start_calibration_handler))
        .route("/calibration/cancel", post(cancel_calibration_handler))
        .route("/calibration/confirm", post(confirm_target_handler))
        .route("/calibration/clear", post(clear_calibration_handler))
        .route(
            "/calibration/samples",
            get(samples_handler).post(import_samples_handler),
        )
        .route("/pointer/click", post(pointer_click_handler))
        .with_state(state)
}

pub async fn serve(port: u16, router: Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Control surface listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn status_handler(State(state): State<ControlState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tracker": state.snapshot()
    }))
}

async fn start_calibration_handler(State(state): State<ControlState>) -> Json<Value> {
    state.enqueue(ControlCommand::StartCalibration)
}

async fn cancel_calibration_handler(State(state): State<ControlState>) -> Json<Value> {
    let status = state.snapshot();
    if status.calibration_state != CalibrationPhaseTag::InProgress {
        return Json(json!({
            "status": "not_calibrating",
            "message": "No calibration in progress"
        }));
    }
    state.enqueue(ControlCommand::CancelCalibration)
}

async fn confirm_target_handler(State(state): State<ControlState>) -> Json<Value> {
    state.enqueue(ControlCommand::ConfirmTarget)
}

async fn clear_calibration_handler(State(state): State<ControlState>) -> Json<Value> {
    state.enqueue(ControlCommand::ClearCalibration)
}

async fn samples_handler(State(state): State<ControlState>) -> Json<Value> {
    let status = state.snapshot();
    Json(json!({
        "status": "ok",
        "samples": status.samples
    }))
}

#[derive(Debug, Deserialize)]
struct ImportPayload {
    samples: Vec<CalibrationSample>,
}

async fn import_samples_handler(
    State(state): State<ControlState>,
    Json(payload): Json<ImportPayload>,
) -> Json<Value> {
    state.enqueue(ControlCommand::ImportSamples(payload.samples))
}

#[derive(Debug, Deserialize)]
struct PointerClickPayload {
    x: f32,
    y: f32,
    #[serde(default)]
    modifier: bool,
}

async fn pointer_click_handler(
    State(state): State<ControlState>,
    Json(payload): Json<PointerClickPayload>,
) -> Json<Value> {
    state.enqueue(ControlCommand::PointerClick {
        position: PixelPoint {
            x: payload.x,
            y: payload.y,
        },
        modifier: payload.modifier,
    })
}
