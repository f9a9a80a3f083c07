pub use api::{
    CalibrationPhaseTag, CalibrationSample, ClickEvent, Eye, EyePoint, FrameObservation,
    Perceived, PerceptionAdapter, PixelPoint, PresentationFrame, PresentationSink, ScreenGeometry,
    ScreenPoint,
};

pub mod blink;
mod calibration;
pub mod calibration_manager;
pub mod calibration_store;
mod config;
mod control_loop;
mod euro_filter;
pub mod mapping;
pub mod scheduler;
pub mod smoothing;

pub use blink::{BlinkDetector, BlinkPair, BlinkState};
pub use calibration::{CalibrationState, CapturePhase, CaptureWindow};
pub use calibration_manager::CalibrationManager;
pub use calibration_store::{CalibrationData, CalibrationStore};
pub use config::{
    BlinkConfig, CalibrationConfig, CapturePolicy, ConfigError, LostTrackingPolicy, MapperConfig,
    MapperStrategy, SmoothingConfig, TargetLayout, TrackerConfig,
};
pub use control_loop::ControlLoop;
pub use euro_filter::EuroFilter;
pub use mapping::{create_mapper, GazeMapper};
pub use smoothing::{AxisFilter, CursorSmoother, LerpFilter};
