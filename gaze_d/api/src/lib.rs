use anyhow::Result;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Normalized pupil position inside the source video frame, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyePoint {
    pub x: f32,
    pub y: f32,
}

impl EyePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Normalized screen position, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const CENTER: ScreenPoint = ScreenPoint { x: 0.5, y: 0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for ScreenPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

impl From<EyePoint> for Vec2 {
    fn from(p: EyePoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for EyePoint {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<ScreenPoint> for Vec2 {
    fn from(p: ScreenPoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for ScreenPoint {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Cursor position in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

/// Output display dimensions, used only at the pixel boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl ScreenGeometry {
    pub fn to_pixels(&self, p: ScreenPoint) -> PixelPoint {
        PixelPoint {
            x: p.x * self.width as f32,
            y: p.y * self.height as f32,
        }
    }

    pub fn from_pixels(&self, p: PixelPoint) -> ScreenPoint {
        if self.width == 0 || self.height == 0 {
            return ScreenPoint::CENTER;
        }
        ScreenPoint {
            x: p.x / self.width as f32,
            y: p.y / self.height as f32,
        }
        .clamped()
    }
}

/// One ground-truth pairing of an eye observation with a known screen position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub eye: EyePoint,
    pub screen: ScreenPoint,
}

impl CalibrationSample {
    pub const fn new(eye: EyePoint, screen: ScreenPoint) -> Self {
        Self { eye, screen }
    }

    pub fn is_finite(&self) -> bool {
        self.eye.is_finite() && self.screen.is_finite()
    }
}

/// What the perception adapter reports for a frame in which a face was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub eye: EyePoint,
    /// Eye-aspect-ratio proxy, lower when the eye is more closed.
    pub left_ear: f32,
    pub right_ear: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub eye: Eye,
    pub timestamp_s: f64,
}

/// Coarse calibration lifecycle as seen by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPhaseTag {
    #[default]
    NotStarted,
    InProgress,
    Finished,
}

/// Everything the presentation layer needs for one rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationFrame {
    pub cursor: PixelPoint,
    pub clicks: Vec<ClickEvent>,
    pub calibration_state: CalibrationPhaseTag,
    pub calibration_progress: f32,
    pub calibration_target: Option<ScreenPoint>,
    pub correction_ack: bool,
    pub tracking: bool,
}

/// Outcome of polling a perception adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perceived {
    /// A new frame in which a face was found.
    Face(FrameObservation),
    /// A new frame without a detection, or a source that has gone silent.
    NoFace,
    /// No new frame since the last poll.
    Pending,
}

/// Source of per-frame observations (camera + detector pipeline, replay, simulation).
///
/// Every camera frame is reported at most once, so per-frame state downstream counts
/// camera frames rather than polls.
pub trait PerceptionAdapter {
    fn initialize(&mut self) -> Result<()>;
    fn poll(&mut self) -> Result<Perceived>;
    fn unload(&mut self);
}

/// Receiver of cursor and click output.
pub trait PresentationSink {
    fn initialize(&mut self) -> Result<()>;
    fn send(&self, frame: &PresentationFrame) -> Result<()>;
}
